// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./context_test.rs"]
mod context_test;

use crate::LogDelegate;
use arc_swap::ArcSwapOption;
use std::cell::RefCell;
use std::sync::{Arc, LazyLock};

// arc-swap needs a thin pointer, so the trait object is boxed behind one more Arc.
struct InstalledDelegate(Arc<dyn LogDelegate>);

// The delegate installed by the host's uploader configuration. Kept static so that any code in the
// uploader can log without threading a handle through, at the cost of not tying the delegate's
// lifetime to a specific uploader instance.
static DELEGATE: LazyLock<ArcSwapOption<InstalledDelegate>> = LazyLock::new(ArcSwapOption::empty);

thread_local! {
  static PER_THREAD_DELEGATE: RefCell<Option<Arc<dyn LogDelegate>>> = const { RefCell::new(None) };
}

//
// RestoreOverride
//

// Puts back the previous per-thread override when a `with_delegate` scope ends, including when the
// scope unwinds.
struct RestoreOverride(Option<Arc<dyn LogDelegate>>);

impl Drop for RestoreOverride {
  fn drop(&mut self) {
    let previous = self.0.take();
    // The cell is already gone if this runs during thread teardown.
    let _ignored = PER_THREAD_DELEGATE.try_with(|current| *current.borrow_mut() = previous);
  }
}

//
// UploaderContext
//

/// Process-wide access to the host's logging delegate. The slot may be empty at any time, in which
/// case forwarded log lines are dropped.
pub struct UploaderContext;

impl UploaderContext {
  /// Installs the delegate for the whole process, returning the one it replaced.
  pub fn install(delegate: Arc<dyn LogDelegate>) -> Option<Arc<dyn LogDelegate>> {
    DELEGATE
      .swap(Some(Arc::new(InstalledDelegate(delegate))))
      .map(|previous| previous.0.clone())
  }

  /// Removes the installed delegate, returning it if there was one.
  pub fn clear() -> Option<Arc<dyn LogDelegate>> {
    DELEGATE.swap(None).map(|previous| previous.0.clone())
  }

  #[must_use]
  pub fn is_installed() -> bool {
    DELEGATE.load().is_some()
  }

  /// Runs `f` with `delegate` taking precedence over the installed delegate on the current thread.
  /// This allows tests running in parallel to capture their own log lines.
  pub fn with_delegate<T>(delegate: Arc<dyn LogDelegate>, f: impl FnOnce() -> T) -> T {
    let _restore = RestoreOverride(
      PER_THREAD_DELEGATE.with(|current| current.borrow_mut().replace(delegate)),
    );
    f()
  }

  // Calls `f` with the delegate that should receive log lines on this thread, if any.
  pub(crate) fn with_current(f: impl FnOnce(&dyn LogDelegate)) {
    // Clone out of the cell so a delegate that logs from within its callback doesn't hit a
    // borrow conflict.
    if let Some(delegate) = PER_THREAD_DELEGATE.with(|current| current.borrow().clone()) {
      f(delegate.as_ref());
      return;
    }

    let installed = DELEGATE.load();
    if let Some(installed) = &*installed {
      f(installed.0.as_ref());
    }
  }
}
