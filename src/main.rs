use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde_json::json;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod asset;
mod cli;
mod engine;
mod index;
mod pack;
mod report;
mod resolve;
mod similarity;
mod transaction;

use asset::AssetDescriptor;
use cli::{CheckPackArgs, Command, ResolveArgs, RootArgs};
use engine::RelinkSink;
use index::build_index;
use pack::{load_mapping_pack, PackError};
use report::{Report, ReportItem, Severity};
use transaction::Transaction;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = RootArgs::parse();
    match args.command {
        Command::CheckPack(args) => cmd_check_pack(args),
        Command::Resolve(args) => cmd_resolve(args),
    }
}

fn cmd_check_pack(args: CheckPackArgs) -> Result<()> {
    match load_mapping_pack(&args.pack) {
        Ok(pack) => {
            println!(
                "{}: {} rules, {} root folders",
                args.pack.display(),
                pack.rules.len(),
                pack.root_folders.len()
            );
            for warning in &pack.load_warnings {
                println!("warning: {warning}");
            }
            Ok(())
        }
        Err(PackError::Invalid { errors }) => {
            eprintln!("{}: invalid mapping pack", args.pack.display());
            for error in &errors {
                eprintln!("  {error}");
            }
            Err(anyhow!("{} schema violation(s)", errors.len()))
        }
        Err(err) => Err(err).with_context(|| format!("check {}", args.pack.display())),
    }
}

fn cmd_resolve(args: ResolveArgs) -> Result<()> {
    let mut report = Report::new("relinker", "Relink Resolver");

    let pack = match load_mapping_pack(&args.pack) {
        Ok(pack) => pack,
        Err(err) => {
            report.add(fatal_config_item(&err));
            export_report(&report, &args)?;
            return Err(err).with_context(|| format!("load {}", args.pack.display()));
        }
    };
    let assets = match load_assets(&args.assets) {
        Ok(assets) => assets,
        Err(err) => {
            report.add(ReportItem::error("config", err.to_string()));
            export_report(&report, &args)?;
            return Err(err);
        }
    };

    let index = build_index(&pack.root_folders);
    tracing::debug!(
        assets = assets.len(),
        indexed = index.len(),
        rules = pack.rules.len(),
        "starting resolution run"
    );

    let mut tx = Transaction::begin("relink run", !args.apply);
    let mut sink = AckSink;
    engine::resolve_assets(&pack, &assets, &index, &mut tx, &mut report, &mut sink);

    export_report(&report, &args)?;
    if let Some(path) = &args.out_actions {
        let log = serde_json::to_string_pretty(&tx).context("serialize action log")?;
        std::fs::write(path, log).with_context(|| format!("write {}", path.display()))?;
    }

    println!(
        "scanned {} assets: {} resolved, {} unresolved, {} warnings, {} errors",
        summary_count(&report, "items_scanned"),
        summary_count(&report, "resolved"),
        summary_count(&report, "unresolved"),
        report.count(Severity::Warning),
        report.count(Severity::Error),
    );
    Ok(())
}

/// The bundled sink only acknowledges: host-application mutation lives
/// outside this binary, behind the `RelinkSink` trait.
struct AckSink;

impl RelinkSink for AckSink {
    fn relink(&mut self, clip: &str, target: &str) -> Result<()> {
        tracing::info!(clip, target, "relink recorded");
        Ok(())
    }
}

fn fatal_config_item(err: &PackError) -> ReportItem {
    let item = ReportItem::error("config", err.to_string());
    match err {
        PackError::Invalid { errors } => item.with_data(
            "errors",
            json!(errors.iter().map(ToString::to_string).collect::<Vec<_>>()),
        ),
        _ => item,
    }
}

fn load_assets(path: &Path) -> Result<Vec<AssetDescriptor>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read asset list {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse asset list {}", path.display()))
}

fn export_report(report: &Report, args: &ResolveArgs) -> Result<()> {
    if let Some(path) = &args.out_json {
        report.write_json(path)?;
    }
    if let Some(path) = &args.out_csv {
        report.write_csv(path)?;
    }
    if let Some(path) = &args.out_html {
        report.write_html(path)?;
    }
    Ok(())
}

fn summary_count(report: &Report, key: &str) -> u64 {
    report
        .summary
        .get(key)
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0)
}
