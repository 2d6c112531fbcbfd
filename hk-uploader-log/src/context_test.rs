// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#![allow(clippy::panic, clippy::unwrap_used)]

use super::UploaderContext;
use crate::test::RecordingDelegate;
use crate::{CallSite, LogDelegate, Severity, log_debug_msg, log_error_msg, log_info_msg};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

// Tests in this file share the process wide delegate.
static GLOBAL: Mutex<()> = Mutex::new(());

const SITE: CallSite<'static> = CallSite::new("context_test.rs", "sync()", 10);

fn as_dyn(delegate: &Arc<RecordingDelegate>) -> Arc<dyn LogDelegate> {
  delegate.clone()
}

fn same_delegate(a: &Arc<dyn LogDelegate>, b: &Arc<dyn LogDelegate>) -> bool {
  std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[test]
fn no_delegate_is_silent_and_lazy() {
  let _guard = GLOBAL.lock();
  UploaderContext::clear();

  let evaluations = Cell::new(0);
  let produce = || {
    evaluations.set(evaluations.get() + 1);
    "never built"
  };
  log_info_msg(produce, SITE);
  log_debug_msg(produce, SITE);
  log_error_msg(produce, SITE);
  crate::hk_verbose!("{}", {
    evaluations.set(evaluations.get() + 1);
    "never built"
  });

  assert_eq!(0, evaluations.get());
  assert!(!UploaderContext::is_installed());
}

#[test]
fn installed_delegate_receives_lines() {
  let _guard = GLOBAL.lock();

  let delegate = RecordingDelegate::new();
  UploaderContext::install(delegate.clone());
  assert!(UploaderContext::is_installed());

  log_error_msg(|| "disk full", CallSite::new("store.rs", "save()", 42));

  // Other threads see the installed delegate too.
  std::thread::spawn(|| log_info_msg(|| "from worker", SITE))
    .join()
    .unwrap();

  UploaderContext::clear();

  assert_eq!(
    vec![
      (
        Severity::Error,
        "HKUploader[save():42] disk full".to_string()
      ),
      (Severity::Info, "HKUploader[sync():10] from worker".to_string()),
    ],
    delegate.records()
  );
}

#[test]
fn cleared_mid_process() {
  let _guard = GLOBAL.lock();

  let delegate = RecordingDelegate::new();
  UploaderContext::install(delegate.clone());
  log_debug_msg(|| "before", SITE);

  UploaderContext::clear();
  let evaluated = Cell::new(false);
  log_debug_msg(
    || {
      evaluated.set(true);
      "after"
    },
    SITE,
  );

  assert!(!evaluated.get());
  assert_eq!(
    vec![(Severity::Debug, "HKUploader[sync():10] before".to_string())],
    delegate.records()
  );
}

#[test]
fn install_and_clear_return_previous() {
  let _guard = GLOBAL.lock();
  UploaderContext::clear();

  let first = as_dyn(&RecordingDelegate::new());
  let second = as_dyn(&RecordingDelegate::new());

  assert!(UploaderContext::install(first.clone()).is_none());
  let replaced = UploaderContext::install(second.clone()).unwrap();
  assert!(same_delegate(&first, &replaced));

  let cleared = UploaderContext::clear().unwrap();
  assert!(same_delegate(&second, &cleared));
  assert!(UploaderContext::clear().is_none());
}

#[test]
fn per_thread_override_wins_and_restores() {
  let _guard = GLOBAL.lock();

  let global = RecordingDelegate::new();
  let outer = RecordingDelegate::new();
  let inner = RecordingDelegate::new();
  UploaderContext::install(global.clone());

  UploaderContext::with_delegate(outer.clone(), || {
    log_info_msg(|| "outer", SITE);
    UploaderContext::with_delegate(inner.clone(), || log_info_msg(|| "inner", SITE));
    log_info_msg(|| "outer again", SITE);
  });
  log_info_msg(|| "global", SITE);

  UploaderContext::clear();

  assert_eq!(
    vec![
      (Severity::Info, "HKUploader[sync():10] outer".to_string()),
      (Severity::Info, "HKUploader[sync():10] outer again".to_string()),
    ],
    outer.records()
  );
  assert_eq!(
    vec![(Severity::Info, "HKUploader[sync():10] inner".to_string())],
    inner.records()
  );
  assert_eq!(
    vec![(Severity::Info, "HKUploader[sync():10] global".to_string())],
    global.records()
  );
}

#[test]
fn override_restored_when_scope_panics() {
  let _guard = GLOBAL.lock();

  let global = RecordingDelegate::new();
  let scoped = RecordingDelegate::new();
  UploaderContext::install(global.clone());

  let result = catch_unwind(AssertUnwindSafe(|| {
    UploaderContext::with_delegate::<()>(scoped.clone(), || panic!("failed while scoped"));
  }));
  assert!(result.is_err());

  log_info_msg(|| "after the scope ended", SITE);
  UploaderContext::clear();

  assert!(scoped.records().is_empty());
  assert_eq!(
    vec![(
      Severity::Info,
      "HKUploader[sync():10] after the scope ended".to_string()
    )],
    global.records()
  );
}

//
// ReentrantDelegate
//

// Logs again from inside its own callback.
struct ReentrantDelegate {
  inner: Arc<RecordingDelegate>,
}

impl LogDelegate for ReentrantDelegate {
  fn log_info(&self, message: &str) {
    self.inner.log_info(message);
    log_debug_msg(|| "nested", SITE);
  }

  fn log_debug(&self, message: &str) {
    self.inner.log_debug(message);
  }

  fn log_error(&self, message: &str) {
    self.inner.log_error(message);
  }

  fn log_verbose(&self, message: &str) {
    self.inner.log_verbose(message);
  }
}

#[test]
fn delegate_may_log_from_callback() {
  let _guard = GLOBAL.lock();

  let inner = RecordingDelegate::new();
  UploaderContext::install(Arc::new(ReentrantDelegate {
    inner: inner.clone(),
  }));
  log_info_msg(|| "outer", SITE);
  UploaderContext::clear();

  let ((), per_thread) = RecordingDelegate::record(|| {
    UploaderContext::with_delegate(
      Arc::new(ReentrantDelegate {
        inner: inner.clone(),
      }),
      || log_info_msg(|| "per thread", SITE),
    );
  });

  assert!(per_thread.is_empty());
  assert_eq!(
    vec![
      (Severity::Info, "HKUploader[sync():10] outer".to_string()),
      (Severity::Debug, "HKUploader[sync():10] nested".to_string()),
      (Severity::Info, "HKUploader[sync():10] per thread".to_string()),
      (Severity::Debug, "HKUploader[sync():10] nested".to_string()),
    ],
    inner.records()
  );
}
