// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./facade_test.rs"]
mod facade_test;

use crate::LogDelegate;
use std::sync::Arc;

const DEFAULT_TARGET: &str = "hk_uploader";

//
// LogFacadeDelegate
//

/// A delegate that writes forwarded lines to the `log` facade, for hosts that don't supply their
/// own logging callbacks. Verbose lines are emitted at trace level.
pub struct LogFacadeDelegate {
  target: &'static str,
}

impl LogFacadeDelegate {
  #[must_use]
  pub fn new() -> Arc<Self> {
    Self::with_target(DEFAULT_TARGET)
  }

  #[must_use]
  pub fn with_target(target: &'static str) -> Arc<Self> {
    Arc::new(Self { target })
  }

  #[must_use]
  pub const fn target(&self) -> &'static str {
    self.target
  }
}

impl LogDelegate for LogFacadeDelegate {
  fn log_info(&self, message: &str) {
    log::info!(target: self.target, "{message}");
  }

  fn log_debug(&self, message: &str) {
    log::debug!(target: self.target, "{message}");
  }

  fn log_error(&self, message: &str) {
    log::error!(target: self.target, "{message}");
  }

  fn log_verbose(&self, message: &str) {
    log::trace!(target: self.target, "{message}");
  }
}

//
// NoopDelegate
//

/// A delegate that drops everything. Useful when the uploader should run with an installed but
/// silent sink.
pub struct NoopDelegate;

impl NoopDelegate {
  #[must_use]
  pub fn new() -> Arc<Self> {
    Arc::new(Self {})
  }
}

impl LogDelegate for NoopDelegate {
  fn log_info(&self, _message: &str) {}
  fn log_debug(&self, _message: &str) {}
  fn log_error(&self, _message: &str) {}
  fn log_verbose(&self, _message: &str) {}
}
