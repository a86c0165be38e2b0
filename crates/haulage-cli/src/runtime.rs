// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use haulage_app::{
    Credentials, DashboardData, Export, Invoice, Notification, Pager, QuickAction,
    QuickActionOutcome, Trip, sample,
};
use haulage_feed::{DEFAULT_SIMULATED_DELAY, FeedClient};
use haulage_tui::{AppRuntime, InternalEvent};
use std::fs;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, info};

/// Terminals commonly drop OSC 52 payloads past this size.
pub const MAX_CLIPBOARD_BYTES: usize = 100_000;

/// Backs the terminal UI with the bundled sample records, the optional
/// dashboard feed, and the export directory.
pub struct PanelRuntime<W: Write = Stdout> {
    credentials: Credentials,
    pager: Pager,
    export_dir: PathBuf,
    feed: Option<FeedClient>,
    offline_delay: Duration,
    clipboard: W,
}

impl PanelRuntime<Stdout> {
    pub fn new(credentials: Credentials, pager: Pager, export_dir: PathBuf) -> Self {
        Self {
            credentials,
            pager,
            export_dir,
            feed: None,
            offline_delay: DEFAULT_SIMULATED_DELAY,
            clipboard: io::stdout(),
        }
    }
}

impl<W: Write> PanelRuntime<W> {
    pub fn with_feed(mut self, feed: Option<FeedClient>) -> Self {
        self.feed = feed;
        self
    }

    /// Latency stood in for quick actions when the feed is disabled.
    pub fn with_offline_delay(mut self, delay: Duration) -> Self {
        self.offline_delay = delay;
        self
    }

    #[cfg(test)]
    pub fn with_clipboard_sink<V: Write>(self, clipboard: V) -> PanelRuntime<V> {
        PanelRuntime {
            credentials: self.credentials,
            pager: self.pager,
            export_dir: self.export_dir,
            feed: self.feed,
            offline_delay: self.offline_delay,
            clipboard,
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    #[cfg(test)]
    pub fn clipboard_sink(&self) -> &W {
        &self.clipboard
    }
}

impl<W: Write> AppRuntime for PanelRuntime<W> {
    fn credentials(&self) -> Credentials {
        self.credentials.clone()
    }

    fn pager(&self) -> Pager {
        self.pager
    }

    fn load_invoices(&mut self) -> Result<Vec<Invoice>> {
        Ok(sample::invoices())
    }

    fn load_dashboard(&mut self) -> Result<DashboardData> {
        Ok(DashboardData::sample())
    }

    fn load_trips(&mut self) -> Result<Vec<Trip>> {
        Ok(sample::trips())
    }

    fn load_notifications(&mut self) -> Vec<Notification> {
        match &self.feed {
            Some(feed) => feed.notifications(),
            None => sample::fallback_notifications(),
        }
    }

    fn load_quick_actions(&mut self) -> Vec<QuickAction> {
        match &self.feed {
            Some(feed) => feed.quick_actions(),
            None => sample::fallback_quick_actions(),
        }
    }

    fn perform_quick_action(&mut self, action_id: &str) -> QuickActionOutcome {
        match &self.feed {
            Some(feed) => feed.perform_quick_action(action_id),
            None => {
                thread::sleep(self.offline_delay);
                QuickActionOutcome::Simulated
            }
        }
    }

    fn write_export(&mut self, export: &Export) -> Result<PathBuf> {
        export.write_to(&self.export_dir)
    }

    fn write_print_document(&mut self, html: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.export_dir).with_context(|| {
            format!("create export directory {}", self.export_dir.display())
        })?;
        let millis = self.now().unix_timestamp_nanos() / 1_000_000;
        let path = self.export_dir.join(format!("invoices_print_{millis}.html"));
        fs::write(&path, html)
            .with_context(|| format!("write print view {}", path.display()))?;
        info!(path = %path.display(), bytes = html.len(), "print view written");
        Ok(path)
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<()> {
        let sequence = osc52_sequence(text)?;
        self.clipboard
            .write_all(sequence.as_bytes())
            .and_then(|()| self.clipboard.flush())
            .context("write clipboard escape sequence")?;
        info!(bytes = text.len(), "copied to clipboard");
        Ok(())
    }

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn spawn_feed_refresh(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let Some(feed) = self.feed.clone() else {
            let event = InternalEvent::FeedLoaded {
                notifications: sample::fallback_notifications(),
                quick_actions: sample::fallback_quick_actions(),
            };
            return tx
                .send(event)
                .map_err(|_| anyhow!("feed event channel closed"));
        };

        thread::Builder::new()
            .name("feed-refresh".to_owned())
            .spawn(move || {
                let event = InternalEvent::FeedLoaded {
                    notifications: feed.notifications(),
                    quick_actions: feed.quick_actions(),
                };
                if tx.send(event).is_err() {
                    debug!("feed refresh finished after the UI closed");
                }
            })
            .context("spawn feed refresh thread")?;
        Ok(())
    }

    fn spawn_quick_action(&mut self, action: QuickAction, tx: Sender<InternalEvent>) -> Result<()> {
        let feed = self.feed.clone();
        let offline_delay = self.offline_delay;
        thread::Builder::new()
            .name("quick-action".to_owned())
            .spawn(move || {
                let outcome = match feed {
                    Some(feed) => feed.perform_quick_action(&action.id),
                    None => {
                        thread::sleep(offline_delay);
                        QuickActionOutcome::Simulated
                    }
                };
                let event = InternalEvent::QuickActionFinished {
                    label: action.label,
                    outcome,
                };
                if tx.send(event).is_err() {
                    debug!("quick action finished after the UI closed");
                }
            })
            .context("spawn quick action thread")?;
        Ok(())
    }
}

/// OSC 52 "set clipboard" with a base64 payload, BEL-terminated.
pub fn osc52_sequence(text: &str) -> Result<String> {
    let encoded = BASE64.encode(text);
    if encoded.len() > MAX_CLIPBOARD_BYTES {
        bail!(
            "clipboard payload is {} bytes encoded; terminals accept about {MAX_CLIPBOARD_BYTES} -- narrow the search and retry",
            encoded.len()
        );
    }
    Ok(format!("\x1b]52;c;{encoded}\x07"))
}

#[cfg(test)]
mod tests {
    use super::{MAX_CLIPBOARD_BYTES, PanelRuntime, osc52_sequence};
    use anyhow::{Result, anyhow};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use haulage_app::{
        Credentials, Export, ExportFormat, Pager, QuickAction, QuickActionOutcome, sample,
    };
    use haulage_feed::FeedClient;
    use haulage_tui::{AppRuntime, InternalEvent};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use time::macros::datetime;
    use tiny_http::{Header, Response, Server};

    fn offline_runtime(dir: &std::path::Path) -> Result<PanelRuntime<Vec<u8>>> {
        Ok(
            PanelRuntime::new(Credentials::default(), Pager::new(10)?, dir.to_path_buf())
                .with_offline_delay(Duration::from_millis(5))
                .with_clipboard_sink(Vec::new()),
        )
    }

    #[test]
    fn offline_runtime_serves_samples() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut runtime = offline_runtime(temp.path())?;
        assert_eq!(runtime.load_invoices()?.len(), sample::INVOICE_COUNT);
        assert_eq!(runtime.load_trips()?, sample::trips());
        assert_eq!(runtime.load_notifications(), sample::fallback_notifications());
        assert_eq!(runtime.load_quick_actions(), sample::fallback_quick_actions());
        assert_eq!(
            runtime.perform_quick_action("view_trips"),
            QuickActionOutcome::Simulated
        );
        assert_eq!(runtime.pager().page_size(), 10);
        assert_eq!(runtime.credentials(), Credentials::default());
        Ok(())
    }

    #[test]
    fn export_lands_in_the_export_dir() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let dir = temp.path().join("nested/exports");
        let mut runtime = offline_runtime(&dir)?;
        let invoices = sample::invoices();
        let records: Vec<_> = invoices.iter().take(3).collect();
        let export = Export::build(
            ExportFormat::Csv,
            &records,
            datetime!(2025-11-18 10:00 UTC),
        );

        let path = runtime.write_export(&export)?;
        assert!(path.starts_with(&dir));
        assert_eq!(std::fs::read_to_string(&path)?, export.body);
        Ok(())
    }

    #[test]
    fn print_view_is_written_as_html() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut runtime = offline_runtime(temp.path())?;
        let path = runtime.write_print_document("<html><title>Print - Invoices</title></html>")?;
        assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("html"));
        assert!(std::fs::read_to_string(&path)?.contains("Print - Invoices"));
        Ok(())
    }

    #[test]
    fn clipboard_copy_emits_osc52() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut runtime = offline_runtime(temp.path())?;
        runtime.copy_to_clipboard("[{\"number\":\"INV20251100041\"}]")?;

        let written = String::from_utf8(runtime.clipboard_sink().clone())?;
        let payload = written
            .strip_prefix("\x1b]52;c;")
            .and_then(|rest| rest.strip_suffix('\x07'))
            .ok_or_else(|| anyhow!("not an OSC 52 sequence: {written:?}"))?;
        assert_eq!(BASE64.decode(payload)?, b"[{\"number\":\"INV20251100041\"}]");
        Ok(())
    }

    #[test]
    fn oversized_clipboard_payload_is_refused() {
        let text = "x".repeat(MAX_CLIPBOARD_BYTES);
        let error = osc52_sequence(&text).expect_err("payload should be too large");
        assert!(error.to_string().contains("narrow the search"));
    }

    #[test]
    fn offline_quick_action_reports_through_the_channel() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut runtime = offline_runtime(temp.path())?;
        let (tx, rx) = mpsc::channel();
        runtime.spawn_quick_action(
            QuickAction {
                id: "create_trip".to_owned(),
                label: "Create trip".to_owned(),
            },
            tx,
        )?;

        let event = rx.recv_timeout(Duration::from_secs(2))?;
        assert_eq!(
            event,
            InternalEvent::QuickActionFinished {
                label: "Create trip".to_owned(),
                outcome: QuickActionOutcome::Simulated,
            }
        );
        Ok(())
    }

    #[test]
    fn feed_refresh_reads_the_server_off_thread() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base = format!("http://{}/api", server.server_addr());
        let handle = thread::spawn(move || {
            for _ in 0..2 {
                let request = server.recv().expect("request expected");
                let body = if request.url().ends_with("/notifications") {
                    r#"[{"id":3,"text":"Invoice INV20251100041 paid","time":"1m ago"}]"#
                } else {
                    "[]"
                };
                let header = Header::from_bytes("Content-Type", "application/json")
                    .expect("valid content type header");
                request
                    .respond(Response::from_string(body).with_header(header))
                    .expect("response should succeed");
            }
        });

        let temp = tempfile::tempdir()?;
        let feed = FeedClient::new(&base, Duration::from_secs(1))?;
        let mut runtime = offline_runtime(temp.path())?.with_feed(Some(feed));
        let (tx, rx) = mpsc::channel();
        runtime.spawn_feed_refresh(tx)?;

        match rx.recv_timeout(Duration::from_secs(3))? {
            InternalEvent::FeedLoaded {
                notifications,
                quick_actions,
            } => {
                assert_eq!(notifications.len(), 1);
                assert_eq!(notifications[0].text, "Invoice INV20251100041 paid");
                assert!(quick_actions.is_empty());
            }
            other => panic!("unexpected event {other:?}"),
        }

        handle.join().expect("server thread should join");
        Ok(())
    }
}
