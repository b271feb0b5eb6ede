//! MediAid: symptom-based diagnosis inference
//!
//! Main entry point for the command-line application.
//!
//! ```text
//! mediaid diagnose [request.json]   # request read from stdin when omitted
//! mediaid history <owner> [limit]
//! mediaid stats [recent]
//! ```

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mediaid::adapters::sanitize::SanitizingMakeWriter;
use mediaid::adapters::SqliteReportStore;
use mediaid::application::{AnalyticsService, DiagnoseRequest, DiagnosisService};
use mediaid::config::{LogMode, Settings};

const USAGE: &str = "usage: mediaid <diagnose [request.json] | history <owner> [limit] | stats [recent]>";

fn init_logging(settings: &Settings) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let (writer, guard) = match settings.log_path() {
        Some(log_file) => {
            if let Some(parent) = log_file.parent() {
                // Best-effort: a missing directory surfaces when opening the file.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .with_context(|| format!("opening log file {}", log_file.display()))?;
            tracing_appender::non_blocking(file)
        }
        None if settings.log_mode == LogMode::Stdout => {
            tracing_appender::non_blocking(std::io::stdout())
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}

fn open_store(settings: &Settings) -> Result<Arc<SqliteReportStore>> {
    let store = SqliteReportStore::new(&settings.db_path)
        .with_context(|| format!("opening report database {}", settings.db_path.display()))?;
    Ok(Arc::new(store))
}

fn read_request(path: Option<&str>) -> Result<DiagnoseRequest> {
    let raw = match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading request {path}"))?
        }
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("reading request from stdin")?;
            raw
        }
    };
    serde_json::from_str(&raw).context("parsing diagnosis request")
}

fn parse_limit(arg: Option<&String>, default: usize) -> Result<usize> {
    match arg {
        Some(v) => v
            .parse()
            .with_context(|| format!("expected a number, got {v:?}")),
        None => Ok(default),
    }
}

fn diagnose(settings: &Settings, path: Option<&str>) -> Result<ExitCode> {
    let request = read_request(path)?;
    let storage = open_store(settings)?;
    let advisory = Arc::new(settings.advisory_table()?);
    let source = settings.artifact_source()?;

    let service = DiagnosisService::from_source(&source, advisory, settings.top_k, storage);
    if !service.is_available() {
        eprintln!("prediction unavailable");
        return Ok(ExitCode::from(2));
    }

    match service.handle(&request) {
        Ok(diagnosis) => {
            println!("{}", serde_json::to_string_pretty(&diagnosis)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_unavailable() => {
            eprintln!("prediction unavailable: {e}");
            Ok(ExitCode::from(2))
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn history(settings: &Settings, owner: &str, limit: usize) -> Result<ExitCode> {
    let service = DiagnosisService::new(None, open_store(settings)?);
    let page = service.history(owner, 0, limit)?;
    println!("{}", serde_json::to_string_pretty(&page.items)?);
    if page.has_more {
        eprintln!("showing {} of {} reports", page.items.len(), page.total_count);
    }
    Ok(ExitCode::SUCCESS)
}

fn stats(settings: &Settings, recent: usize) -> Result<ExitCode> {
    let service = AnalyticsService::new(open_store(settings)?);
    let stats = service.statistics(recent)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let settings = Settings::from_env()?;
    let _guard = init_logging(&settings)?;

    let args: Vec<String> = std::env::args().skip(1).collect();

    tracing::info!("Starting MediAid...");

    let code = match args.first().map(String::as_str) {
        Some("diagnose") => diagnose(&settings, args.get(1).map(String::as_str))?,
        Some("history") => {
            let Some(owner) = args.get(1) else {
                bail!("{USAGE}");
            };
            history(&settings, owner, parse_limit(args.get(2), 20)?)?
        }
        Some("stats") => stats(&settings, parse_limit(args.get(1), 10)?)?,
        _ => {
            eprintln!("{USAGE}");
            ExitCode::from(64)
        }
    };

    tracing::info!("MediAid shutdown complete.");
    Ok(code)
}
