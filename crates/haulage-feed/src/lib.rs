// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use haulage_app::{Notification, QuickAction, QuickActionOutcome, sample};
use reqwest::blocking::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);
pub const DEFAULT_SIMULATED_DELAY: Duration = Duration::from_millis(600);

/// Best-effort reader for the dashboard's notification and quick-action
/// endpoints. Nothing here returns an error after construction: every
/// failure degrades to the built-in sample data.
#[derive(Debug, Clone)]
pub struct FeedClient {
    base_url: Url,
    timeout: Duration,
    simulated_delay: Duration,
    http: HttpClient,
}

impl FeedClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            bail!("feed.base_url must not be empty -- set it in the config file and retry");
        }
        if timeout.is_zero() {
            bail!("feed.timeout must be positive");
        }
        let base_url =
            Url::parse(trimmed).with_context(|| format!("parse feed.base_url {trimmed:?}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "feed.base_url must use http or https, got {:?}",
                base_url.scheme()
            );
        }
        if base_url.cannot_be_a_base() {
            bail!("feed.base_url {trimmed:?} cannot carry a path");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            simulated_delay: DEFAULT_SIMULATED_DELAY,
            http,
        })
    }

    pub fn with_simulated_delay(mut self, delay: Duration) -> Self {
        self.simulated_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn simulated_delay(&self) -> Duration {
        self.simulated_delay
    }

    /// `<base>/<segments...>`, with each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("feed base url {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GETs `<base>/<path>` and decodes it as JSON, or returns `fallback`.
    ///
    /// Transport errors, timeouts, non-2xx statuses, and undecodable bodies
    /// all fall back. The cause is logged at warn level only.
    pub fn fetch_with_fallback<T: DeserializeOwned>(&self, path: &str, fallback: T) -> T {
        match self.fetch(path) {
            Ok(value) => {
                debug!(path, "feed fetched");
                value
            }
            Err(error) => {
                warn!(path, error = %format!("{error:#}"), "feed unavailable, using fallback");
                fallback
            }
        }
    }

    fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let segments: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
        let url = self.endpoint(&segments)?;
        let response = self
            .http
            .get(url.clone())
            .send()
            .with_context(|| format!("GET {url}"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("GET {url} returned {}", status.as_u16());
        }
        response
            .json()
            .with_context(|| format!("decode JSON from {url}"))
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.fetch_with_fallback("notifications", sample::fallback_notifications())
    }

    pub fn quick_actions(&self) -> Vec<QuickAction> {
        self.fetch_with_fallback("quick-actions", sample::fallback_quick_actions())
    }

    /// POSTs `<base>/quick-actions/<id>`. Any failure sleeps for the simulated
    /// delay instead, so the caller sees the same latency either way.
    pub fn perform_quick_action(&self, action_id: &str) -> QuickActionOutcome {
        match self.post_quick_action(action_id) {
            Ok(()) => {
                info!(action = action_id, "quick action completed");
                QuickActionOutcome::Completed
            }
            Err(error) => {
                warn!(
                    action = action_id,
                    error = %format!("{error:#}"),
                    "quick action failed, simulating"
                );
                thread::sleep(self.simulated_delay);
                QuickActionOutcome::Simulated
            }
        }
    }

    fn post_quick_action(&self, action_id: &str) -> Result<()> {
        let url = self.endpoint(&["quick-actions", action_id])?;
        let response = self
            .http
            .post(url.clone())
            .send()
            .with_context(|| format!("POST {url}"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("POST {url} returned {}", status.as_u16());
        }
        let _: serde_json::Value = response
            .json()
            .with_context(|| format!("decode JSON from {url}"))?;
        Ok(())
    }
}
