// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt


use anyhow::bail;
use parking_lot::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload::Handle as ReloadHandle;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

const DEFAULT_FILTER_RULES: &str = "info";

//
// SwapLogger
//

// Process logging for the uploader: a stderr subscriber whose filter can be replaced at runtime.
// Records emitted through the `log` facade are bridged into the same subscriber.
#[derive(Default)]
pub struct SwapLogger {
  handle: Mutex<Option<ReloadHandle<EnvFilter, Registry>>>,
}

impl SwapLogger {
  const fn new() -> Self {
    Self {
      handle: Mutex::new(None),
    }
  }

  // Get the static instance of the logger.
  fn get() -> &'static Self {
    static LOGGER: SwapLogger = SwapLogger::new();

    &LOGGER
  }

  // Initialize the logger using RUST_LOG, falling back to the default rules. Should be called as
  // early as possible in the program. Subsequent calls are no-ops.
  pub fn initialize() -> anyhow::Result<()> {
    let mut handle = Self::get().handle.lock();
    if handle.is_some() {
      return Ok(());
    }

    // Gate ANSI on whether HK_LOG_ANSI is set so that captured output stays plain unless someone
    // asks for color during local development.
    let stderr = tracing_subscriber::fmt::layer()
      .with_writer(std::io::stderr)
      .with_ansi(std::env::var("HK_LOG_ANSI").is_ok())
      .with_line_number(true)
      .with_thread_ids(true)
      .compact();

    let filter = EnvFilter::new(
      std::env::var("RUST_LOG")
        .as_deref()
        .unwrap_or(DEFAULT_FILTER_RULES),
    );

    let (filter, reload_handle) = tracing_subscriber::reload::Layer::new(filter);
    Registry::default().with(filter).with(stderr).try_init()?;
    *handle = Some(reload_handle);

    Ok(())
  }

  #[must_use]
  pub fn is_initialized() -> bool {
    Self::get().handle.lock().is_some()
  }

  // Swap in a new filter with the provided RUST_LOG string.
  pub fn swap(new_rust_log: &str) -> anyhow::Result<()> {
    Self::get().reload(new_rust_log)
  }

  fn reload(&self, new_rust_log: &str) -> anyhow::Result<()> {
    {
      let handle = self.handle.lock();
      let Some(handle) = handle.as_ref() else {
        bail!("logger has not been initialized");
      };
      handle.reload(new_rust_log)?;
    }

    // During init the log level is set based on the initial RUST_LOG value. We need to manually
    // update it each time we reload the config as tracing_subscriber does not do this for us.
    log::set_max_level(tracing_log::AsLog::as_log(
      &tracing_subscriber::filter::LevelFilter::current(),
    ));

    tracing::debug!("swapped log filter to {new_rust_log:?}");

    Ok(())
  }
}
