use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Context;
use boothbook_ledger::Document;
use boothbook_server::server::services_for;
use boothbook_server::{BoothServer, ServerConfig};
use boothbook_service::{BoothServices, PurgeReport, Registration, Relocation};
use boothbook_store::GitHubStore;
use boothbook_types::{parse_schedule_date, Booth, ScheduleRecord, Vendor};
use colored::Colorize;
use serde_json::json;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match &cli.config {
        Some(path) => tracing::debug!(path = %path.display(), "loading config file"),
        None => tracing::debug!("no config file, using defaults and environment"),
    }
    let config = ServerConfig::load(cli.config.as_deref())?;
    tracing::debug!(
        repository = %config.repo.repository,
        branch = %config.repo.branch,
        command = cli.command.name(),
        "config loaded"
    );
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        command => {
            config.validate().context("incomplete repository settings")?;
            let store = GitHubStore::new(config.repo.clone())?;
            let services = services_for(&config, Arc::new(store));
            let output = execute(command, &services, &cli.format).await?;
            print!("{output}");
            Ok(())
        }
    }
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    BoothServer::connect(config)?.serve().await?;
    Ok(())
}

/// Run one operation and render its outcome.
pub async fn execute(command: Command, services: &BoothServices, format: &OutputFormat) -> anyhow::Result<String> {
    let name = command.name();
    tracing::info!(command = name, branch = services.documents().branch(), "running operation");
    let output = run_operation(command, services, format).await;
    if let Err(e) = &output {
        tracing::debug!(command = name, error = %e, "operation failed");
    }
    output
}

async fn run_operation(command: Command, services: &BoothServices, format: &OutputFormat) -> anyhow::Result<String> {
    match command {
        Command::Serve(_) => anyhow::bail!("serve is not a one-shot command"),
        Command::Register(args) => {
            let reg = services.register(&args.vendor_id, &args.booth_location, &args.date).await?;
            render(format, &reg, render_registration)
        }
        Command::Relocate(args) => {
            let moved = services.relocate(&args.vendor_id, &args.date, &args.new_booth_location).await?;
            render(format, &moved, render_relocation)
        }
        Command::Purge(args) => {
            let report = match args.today {
                Some(today) => services.purge(parse_schedule_date(&today)?).await?,
                None => services.purge_now().await?,
            };
            render(format, &report, render_purge)
        }
        Command::Show(args) => {
            let docs = services.documents();
            match args.document {
                DocumentArg::Vendors => show(format, &docs.vendors().await?, |v: &Vendor| {
                    format!("{}  {}", v.vendor_id.bold(), v.vendor_name)
                }),
                DocumentArg::Booths => show(format, &docs.booths().await?, |b: &Booth| {
                    format!("{}  {}", b.booth_location.bold(), b.booth_name)
                }),
                DocumentArg::Schedule => show(format, &docs.schedule().await?, |r: &ScheduleRecord| {
                    format!("{}  {}  {}", r.date.to_string().cyan(), r.booth_location.bold(), r.vendor_name)
                }),
            }
        }
    }
}

fn render<T: serde::Serialize>(format: &OutputFormat, value: &T, text: fn(&T) -> String) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)? + "\n"),
        OutputFormat::Text => Ok(text(value)),
    }
}

fn render_registration(reg: &Registration) -> String {
    let r = &reg.record;
    let mut out = format!(
        "{} Registered {} at {} on {}\n",
        "✓".green().bold(),
        r.vendor_name.bold(),
        r.booth_location.yellow(),
        r.date
    );
    if let Some(booth) = &reg.new_booth {
        let _ = writeln!(out, "  New booth: {}", booth.booth_location.yellow());
    }
    let _ = writeln!(out, "  Commit: {}", reg.commit.short().dimmed());
    out
}

fn render_relocation(moved: &Relocation) -> String {
    let r = &moved.record;
    let mut out = format!(
        "{} Moved {} on {}: {} -> {}\n",
        "✓".green().bold(),
        r.vendor_name.bold(),
        r.date,
        moved.previous_location.yellow(),
        r.booth_location.yellow()
    );
    if let Some(booth) = &moved.new_booth {
        let _ = writeln!(out, "  New booth: {}", booth.booth_location.yellow());
    }
    let _ = writeln!(out, "  Commit: {}", moved.commit.short().dimmed());
    out
}

fn render_purge(report: &PurgeReport) -> String {
    match &report.commit {
        Some(commit) => format!(
            "{} Removed {} records dated before {}, {} remaining\n  Commit: {}\n",
            "✓".green().bold(),
            report.dropped.to_string().bold(),
            report.cutoff,
            report.kept,
            commit.short().dimmed()
        ),
        None => format!(
            "Nothing to purge: all {} records are on or after {}\n",
            report.kept, report.cutoff
        ),
    }
}

fn show<T: serde::Serialize>(format: &OutputFormat, doc: &Document<T>, line: impl Fn(&T) -> String) -> anyhow::Result<String> {
    if let OutputFormat::Json = format {
        let value = json!({ "path": doc.path, "hash": doc.hash, "items": doc.items });
        return Ok(serde_json::to_string_pretty(&value)? + "\n");
    }
    let mut out = format!("{} @ {} ({} entries)\n", doc.path.bold(), doc.hash.short().dimmed(), doc.items.len());
    for item in &doc.items {
        let _ = writeln!(out, "  {}", line(item));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use boothbook_ledger::DocumentPaths;
    use boothbook_service::{ServiceError, SimulatedClock};
    use boothbook_store::InMemoryStore;
    use chrono::{TimeZone, Utc};

    fn services() -> (Arc<InMemoryStore>, BoothServices) {
        colored::control::set_override(false);
        let store = Arc::new(InMemoryStore::new());
        store
            .seed(
                "main",
                &[
                    ("data/vendors.json", r#"[{"vendor_id":"V1","vendor_name":"Noodle Stand"}]"#),
                    ("data/booths.json", "[]"),
                    ("data/schedule.json", "[]"),
                ],
            )
            .unwrap();
        let clock = SimulatedClock::stepping(Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap(), Duration::from_secs(1));
        let services = BoothServices::new(store.clone(), "main", DocumentPaths::default()).with_clock(Arc::new(clock));
        (store, services)
    }

    fn register(date: &str) -> Command {
        Command::Register(RegisterArgs {
            vendor_id: "V1".into(),
            booth_location: "A1".into(),
            date: date.into(),
        })
    }

    #[tokio::test]
    async fn register_then_show_schedule() {
        let (_, services) = services();
        let out = execute(register("2024-03-20"), &services, &OutputFormat::Text).await.unwrap();
        assert!(out.contains("Registered Noodle Stand at A1 on 2024-03-20"));
        assert!(out.contains("New booth: A1"));

        let show_args = ShowArgs { document: DocumentArg::Schedule };
        let out = execute(Command::Show(show_args), &services, &OutputFormat::Text).await.unwrap();
        assert!(out.starts_with("data/schedule.json @ "));
        assert!(out.contains("2024-03-20  A1  Noodle Stand"));
    }

    #[tokio::test]
    async fn relocate_json_output() {
        let (_, services) = services();
        execute(register("2024-03-20"), &services, &OutputFormat::Text).await.unwrap();
        let cmd = Command::Relocate(RelocateArgs {
            vendor_id: "V1".into(),
            date: "2024-03-20".into(),
            new_booth_location: "B2".into(),
        });
        let out = execute(cmd, &services, &OutputFormat::Json).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["previous_location"], "A1");
        assert_eq!(value["record"]["booth_location"], "B2");
    }

    #[tokio::test]
    async fn purge_with_explicit_today() {
        let (store, services) = services();
        execute(register("2024-01-10"), &services, &OutputFormat::Text).await.unwrap();

        let cmd = |today: &str| Command::Purge(PurgeArgs { today: Some(today.into()) });
        let out = execute(cmd("2024-02-10"), &services, &OutputFormat::Text).await.unwrap();
        assert!(out.starts_with("Nothing to purge"));

        let out = execute(cmd("2024-02-11"), &services, &OutputFormat::Text).await.unwrap();
        assert!(out.contains("Removed 1 records dated before 2024-01-11"));
        assert_eq!(store.advance_count().unwrap(), 2);

        assert!(execute(cmd("11/02/2024"), &services, &OutputFormat::Text).await.is_err());
    }

    #[tokio::test]
    async fn domain_errors_surface_as_service_errors() {
        let (_, services) = services();
        execute(register("2024-03-20"), &services, &OutputFormat::Text).await.unwrap();
        let err = execute(register("2024-03-20"), &services, &OutputFormat::Text).await.unwrap_err();
        let err = err.downcast::<ServiceError>().unwrap();
        assert!(matches!(err, ServiceError::VendorAlreadyBooked { .. }));
    }

    #[tokio::test]
    async fn show_vendors_as_json_includes_hash() {
        let (_, services) = services();
        let cmd = Command::Show(ShowArgs { document: DocumentArg::Vendors });
        let out = execute(cmd, &services, &OutputFormat::Json).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["path"], "data/vendors.json");
        assert_eq!(value["items"][0]["vendor_id"], "V1");
        assert_eq!(value["hash"].as_str().unwrap().len(), 64);
    }
}
