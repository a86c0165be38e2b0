// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "HAULAGE_LOG";

/// Where formatted events go. The TUI owns the terminal, so it logs to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// `HAULAGE_LOG` wins over the configured level.
pub fn filter(configured_level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    EnvFilter::try_new(configured_level)
        .with_context(|| format!("invalid log level {configured_level:?}"))
}

pub fn init(configured_level: &str, target: LogTarget) -> Result<()> {
    let filter = filter(configured_level)?;
    let installed = match target {
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .try_init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
        }
    };
    installed.context("install tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::{LOG_ENV, filter};
    use crate::test_support::env_lock;
    use anyhow::Result;

    #[test]
    fn configured_level_is_used_without_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(LOG_ENV);
        }
        let filter = filter("haulage_feed=debug,warn")?;
        assert!(filter.to_string().contains("haulage_feed=debug"));
        Ok(())
    }

    #[test]
    fn invalid_configured_level_is_an_error() {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(LOG_ENV);
        }
        assert!(filter("haulage=verbose").is_err());
    }

    #[test]
    fn env_override_wins_over_configured_level() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(LOG_ENV, "haulage_tui=trace");
        }
        let resolved = filter("info");
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(LOG_ENV);
        }
        assert!(resolved?.to_string().contains("haulage_tui=trace"));
        Ok(())
    }
}
