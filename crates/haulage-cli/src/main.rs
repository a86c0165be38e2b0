// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result, anyhow};
use config::Config;
use haulage_app::{AppState, ExportFormat, InvoiceBrowser, RecordStore};
use haulage_feed::FeedClient;
use haulage_tui::AppRuntime;
use logging::LogTarget;
use runtime::PanelRuntime;
use std::env;
use std::path::PathBuf;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `haulage --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let headless = options.check_only || options.export.is_some();
    let log_target = if headless {
        LogTarget::Stderr
    } else {
        LogTarget::File(config.log_file()?)
    };
    logging::init(config.log_level(), log_target)?;
    info!(config = %options.config_path.display(), "starting haulage");

    let feed = if config.feed_enabled() {
        let feed = FeedClient::new(config.feed_base_url(), config.feed_timeout()?)
            .with_context(|| {
                format!(
                    "invalid [feed] config in {}; fix base_url/timeout values",
                    options.config_path.display()
                )
            })?
            .with_simulated_delay(config.quick_action_delay()?);
        info!(
            base_url = feed.base_url(),
            timeout_ms = feed.timeout().as_millis(),
            simulated_delay_ms = feed.simulated_delay().as_millis(),
            "feed enabled"
        );
        Some(feed)
    } else {
        info!("feed disabled, using sample notifications");
        None
    };

    let mut runtime = PanelRuntime::new(config.credentials(), config.pager()?, config.export_dir())
        .with_feed(feed)
        .with_offline_delay(config.quick_action_delay()?);

    if options.check_only {
        info!(export_dir = %runtime.export_dir().display(), "startup check passed");
        return Ok(());
    }

    if let Some(format) = options.export {
        let path = export_headless(&mut runtime, format, options.query.as_deref())?;
        println!("{}", path.display());
        return Ok(());
    }

    let mut state = AppState::default();
    haulage_tui::run_app(&mut state, &mut runtime)
}

/// Writes the filtered invoice view without starting the terminal UI.
fn export_headless<R: AppRuntime>(
    runtime: &mut R,
    format: ExportFormat,
    query: Option<&str>,
) -> Result<PathBuf> {
    let store = RecordStore::new(runtime.load_invoices()?)?;
    let mut browser = InvoiceBrowser::new(store, runtime.pager());
    if let Some(query) = query {
        browser.set_query(query);
    }
    let export = browser.export(format, runtime.now());
    runtime.write_export(&export)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    export: Option<ExportFormat>,
    query: Option<String>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        export: None,
        query: None,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--export" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--export requires a format: csv, xls, or pdf"))?;
                let format = ExportFormat::parse(value.as_ref()).ok_or_else(|| {
                    let known: Vec<&str> =
                        ExportFormat::ALL.iter().map(|format| format.extension()).collect();
                    anyhow!(
                        "unknown export format {:?}; use one of: {}",
                        value.as_ref(),
                        known.join(", ")
                    )
                })?;
                options.export = Some(format);
            }
            "--query" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--query requires search text"))?;
                options.query = Some(value.as_ref().to_owned());
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.query.is_some() && options.export.is_none() && !options.show_help {
        return Err(anyhow!(
            "--query only filters a headless export; add --export <csv|xls|pdf>"
        ));
    }

    Ok(options)
}

fn print_help() {
    println!("haulage");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config + feed settings and exit");
    println!("  --export <csv|xls|pdf>   Export invoices to the export dir and print the path");
    println!("  --query <text>           Filter invoices before --export");
    println!("  --help                   Show this help");
}
