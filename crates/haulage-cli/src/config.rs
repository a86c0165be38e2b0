// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use haulage_app::Credentials;
use haulage_app::Pager;
use haulage_app::pager::DEFAULT_PAGE_SIZE;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "haulage";
const CONFIG_VERSION: i64 = 1;
const CONFIG_PATH_ENV: &str = "HAULAGE_CONFIG_PATH";
const EXPORT_DIR_ENV: &str = "HAULAGE_EXPORT_DIR";
const DEFAULT_FEED_TIMEOUT: &str = "3000ms";
const DEFAULT_QUICK_ACTION_DELAY: &str = "600ms";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub browser: Browser,
    #[serde(default)]
    pub export: Export,
    #[serde(default)]
    pub feed: Feed,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            browser: Browser::default(),
            export: Export::default(),
            feed: Feed::default(),
            auth: Auth::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Browser {
    pub page_size: Option<i64>,
}

impl Default for Browser {
    fn default() -> Self {
        Self {
            page_size: Some(DEFAULT_PAGE_SIZE as i64),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Export {
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feed {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub timeout: Option<String>,
    pub quick_action_delay: Option<String>,
}

impl Default for Feed {
    fn default() -> Self {
        Self {
            enabled: Some(true),
            base_url: Some(haulage_feed::DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_FEED_TIMEOUT.to_owned()),
            quick_action_delay: Some(DEFAULT_QUICK_ACTION_DELAY.to_owned()),
        }
    }
}

/// Demo login. There is no real authentication behind it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Auth {
    pub demo_email: Option<String>,
    pub demo_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and place values under [browser], [export], [feed], [auth], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Regenerate it with --print-example-config",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.version != CONFIG_VERSION {
            bail!(
                "config {} has version {}; expected 1",
                path.display(),
                self.version
            );
        }

        if let Some(page_size) = self.browser.page_size
            && page_size <= 0
        {
            bail!(
                "browser.page_size in {} must be positive, got {}",
                path.display(),
                page_size
            );
        }

        if let Some(dir) = &self.export.dir
            && dir.trim().is_empty()
        {
            bail!(
                "export.dir in {} must not be empty -- remove the key to export into the current directory",
                path.display()
            );
        }

        if let Some(timeout) = &self.feed.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed.is_zero() {
                bail!(
                    "feed.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(delay) = &self.feed.quick_action_delay {
            parse_duration(delay)
                .with_context(|| format!("feed.quick_action_delay in {}", path.display()))?;
        }

        if let Some(email) = &self.auth.demo_email
            && email.trim().is_empty()
        {
            bail!("auth.demo_email in {} must not be empty", path.display());
        }

        if let Some(password) = &self.auth.demo_password
            && password.is_empty()
        {
            bail!("auth.demo_password in {} must not be empty", path.display());
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).with_context(|| {
                format!(
                    "log.level in {} is not a valid filter, got {level:?}; use for example \"info\" or \"haulage_feed=debug\"",
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    pub fn page_size(&self) -> usize {
        self.browser
            .page_size
            .and_then(|size| usize::try_from(size).ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn pager(&self) -> Result<Pager> {
        Pager::new(self.page_size())
    }

    /// The file setting wins, then `HAULAGE_EXPORT_DIR`, then the working
    /// directory.
    pub fn export_dir(&self) -> PathBuf {
        if let Some(dir) = &self.export.dir {
            return PathBuf::from(dir);
        }
        match env::var_os(EXPORT_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => PathBuf::from("."),
        }
    }

    pub fn feed_enabled(&self) -> bool {
        self.feed.enabled.unwrap_or(true)
    }

    pub fn feed_base_url(&self) -> &str {
        self.feed
            .base_url
            .as_deref()
            .unwrap_or(haulage_feed::DEFAULT_BASE_URL)
    }

    pub fn feed_timeout(&self) -> Result<Duration> {
        parse_duration(self.feed.timeout.as_deref().unwrap_or(DEFAULT_FEED_TIMEOUT))
    }

    pub fn quick_action_delay(&self) -> Result<Duration> {
        parse_duration(
            self.feed
                .quick_action_delay
                .as_deref()
                .unwrap_or(DEFAULT_QUICK_ACTION_DELAY),
        )
    }

    pub fn credentials(&self) -> Credentials {
        let defaults = Credentials::default();
        Credentials {
            email: self.auth.demo_email.clone().unwrap_or(defaults.email),
            password: self.auth.demo_password.clone().unwrap_or(defaults.password),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let data_root = dirs::data_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].file in the config file")
        })?;
        Ok(data_root.join(APP_NAME).join("haulage.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# haulage config\n# Place this file at: {}\n\nversion = 1\n\n[browser]\npage_size = {}\n\n[export]\n# Optional. Default is HAULAGE_EXPORT_DIR, then the current directory\n# dir = \"/absolute/path/to/exports\"\n\n[feed]\nenabled = true\nbase_url = \"{}\"\ntimeout = \"{}\"\nquick_action_delay = \"{}\"\n\n[auth]\n# Demo login only; nothing is checked against a real account\ndemo_email = \"{}\"\ndemo_password = \"{}\"\n\n[log]\nlevel = \"{}\"\n# Optional. Default is the platform data dir (for example ~/.local/share/haulage/haulage.log)\n# file = \"/absolute/path/to/haulage.log\"\n",
            path.display(),
            DEFAULT_PAGE_SIZE,
            haulage_feed::DEFAULT_BASE_URL,
            DEFAULT_FEED_TIMEOUT,
            DEFAULT_QUICK_ACTION_DELAY,
            Credentials::default().email,
            Credentials::default().password,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 600ms or 3s)")
}
