// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#![deny(
  clippy::expect_used,
  clippy::panic,
  clippy::todo,
  clippy::unimplemented,
  clippy::unreachable,
  clippy::unwrap_used
)]

//! Forwards uploader log lines to the logging callbacks supplied by the host application.
//!
//! Every forwarded line is tagged with the calling function and line number:
//! `HKUploader[<function>:<line>] <message>`. When no delegate is installed the call is a no-op
//! and the message is never built.


#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  let _ignored = hk_log::SwapLogger::initialize();
}

pub mod context;
pub mod facade;

pub use context::UploaderContext;
pub use facade::{LogFacadeDelegate, NoopDelegate};
use std::fmt::Display;

/// Tag placed in front of every forwarded line.
pub const MESSAGE_PREFIX: &str = "HKUploader";

//
// LogDelegate
//

/// The logging callbacks exposed by the host's uploader configuration. Each method receives a
/// fully formatted line.
#[cfg_attr(test, mockall::automock)]
pub trait LogDelegate: Send + Sync {
  fn log_info(&self, message: &str);
  fn log_debug(&self, message: &str);
  fn log_error(&self, message: &str);
  fn log_verbose(&self, message: &str);
}

//
// Severity
//

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
  Info,
  Debug,
  Error,
  Verbose,
}

impl Severity {
  /// Hands the message to the delegate method matching this severity.
  pub fn dispatch(self, delegate: &dyn LogDelegate, message: &str) {
    match self {
      Self::Info => delegate.log_info(message),
      Self::Debug => delegate.log_debug(message),
      Self::Error => delegate.log_error(message),
      Self::Verbose => delegate.log_verbose(message),
    }
  }
}

//
// CallSite
//

/// Where a log line originated. The file is carried for completeness but is not part of the
/// forwarded line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallSite<'a> {
  pub file: &'a str,
  pub function: &'a str,
  pub line: u32,
}

impl<'a> CallSite<'a> {
  #[must_use]
  pub const fn new(file: &'a str, function: &'a str, line: u32) -> Self {
    Self {
      file,
      function,
      line,
    }
  }
}

/// Builds the forwarded line for a message logged at `call_site`.
#[must_use]
pub fn format_message(call_site: &CallSite<'_>, message: impl Display) -> String {
  format!(
    "{MESSAGE_PREFIX}[{}:{}] {message}",
    call_site.function, call_site.line
  )
}

/// Forwards a message at the given severity. `message` is only evaluated if a delegate is
/// available.
pub fn log_msg<M: Display>(
  severity: Severity,
  message: impl FnOnce() -> M,
  call_site: CallSite<'_>,
) {
  UploaderContext::with_current(|delegate| {
    severity.dispatch(delegate, &format_message(&call_site, message()));
  });
}

pub fn log_info_msg<M: Display>(message: impl FnOnce() -> M, call_site: CallSite<'_>) {
  log_msg(Severity::Info, message, call_site);
}

pub fn log_debug_msg<M: Display>(message: impl FnOnce() -> M, call_site: CallSite<'_>) {
  log_msg(Severity::Debug, message, call_site);
}

pub fn log_error_msg<M: Display>(message: impl FnOnce() -> M, call_site: CallSite<'_>) {
  log_msg(Severity::Error, message, call_site);
}

pub fn log_verbose_msg<M: Display>(message: impl FnOnce() -> M, call_site: CallSite<'_>) {
  log_msg(Severity::Verbose, message, call_site);
}

/// Reduces the type name of an item nested in a function down to the function's own name,
/// skipping any closure segments.
#[doc(hidden)]
#[must_use]
pub fn short_function_name(type_name: &'static str) -> &'static str {
  let path = type_name
    .strip_suffix("::__hk_call_site")
    .unwrap_or(type_name);
  path
    .rsplit("::")
    .find(|segment| *segment != "{{closure}}")
    .unwrap_or(path)
}

/// The label used for a function in forwarded lines, e.g. `save()`.
#[doc(hidden)]
#[must_use]
pub fn function_label(type_name: &'static str) -> String {
  format!("{}()", short_function_name(type_name))
}

#[doc(hidden)]
#[macro_export]
macro_rules! function_name {
  () => {{
    use ::std::sync::OnceLock;

    fn __hk_call_site() {}
    fn type_name_of<T>(_: T) -> &'static str {
      ::std::any::type_name::<T>()
    }

    static LABEL: OnceLock<::std::string::String> = OnceLock::new();

    LABEL
      .get_or_init(|| $crate::function_label(type_name_of(__hk_call_site)))
      .as_str()
  }};
}

/// Captures the current file, enclosing function and line as a [`CallSite`].
#[macro_export]
macro_rules! call_site {
  () => {
    $crate::CallSite::new(::std::file!(), $crate::function_name!(), ::std::line!())
  };
}

#[macro_export]
macro_rules! hk_info {
  ($($arg:tt)+) => {
    $crate::log_info_msg(|| ::std::format!($($arg)+), $crate::call_site!())
  };
}

#[macro_export]
macro_rules! hk_debug {
  ($($arg:tt)+) => {
    $crate::log_debug_msg(|| ::std::format!($($arg)+), $crate::call_site!())
  };
}

#[macro_export]
macro_rules! hk_error {
  ($($arg:tt)+) => {
    $crate::log_error_msg(|| ::std::format!($($arg)+), $crate::call_site!())
  };
}

#[macro_export]
macro_rules! hk_verbose {
  ($($arg:tt)+) => {
    $crate::log_verbose_msg(|| ::std::format!($($arg)+), $crate::call_site!())
  };
}
