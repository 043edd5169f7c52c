//! Run orchestration: drive resolution over an asset list, record every
//! decision, and fill the report summary.

use crate::asset::AssetDescriptor;
use crate::index::NameIndex;
use crate::pack::{MappingPack, Rule};
use crate::report::{Report, ReportItem, Severity};
use crate::resolve::{resolve, ResolvedVia};
use crate::transaction::{Action, Transaction};
use serde_json::json;

/// The seam to the external collaborator that performs the actual mutation
/// (relinking a clip in the host project). A dry run never calls the sink.
pub trait RelinkSink {
    fn relink(&mut self, clip: &str, target: &str) -> anyhow::Result<()>;
}

/// Resolve every asset against the pack and index, recording decisions into
/// the transaction and surfacing outcomes as report items.
///
/// Per-asset outcomes are never errors: an unresolved asset is a warning, a
/// sink failure is an error item. Only the caller's pack-loading step can
/// abort a run.
pub fn resolve_assets(
    pack: &MappingPack,
    assets: &[AssetDescriptor],
    index: &NameIndex,
    tx: &mut Transaction,
    report: &mut Report,
    sink: &mut dyn RelinkSink,
) {
    for warning in &pack.load_warnings {
        report.add(ReportItem::warning("rules", warning.clone()));
    }
    for collision in index.collisions() {
        report.add(
            ReportItem::warning(
                "index",
                format!(
                    "Duplicate normalized name {:?}; keeping later file",
                    collision.key
                ),
            )
            .with_data("kept", json!(collision.kept.display().to_string()))
            .with_data("replaced", json!(collision.replaced.display().to_string())),
        );
    }

    let mut resolved = 0usize;
    let mut unresolved = 0usize;
    for asset in assets {
        let name = asset.name.as_str();
        let Some((target, via)) = resolve(name, pack, index) else {
            tracing::debug!(clip = name, "no replacement target");
            report.add(
                ReportItem::warning("resolve", format!("No replacement target found for {name}"))
                    .with_clip(name),
            );
            unresolved += 1;
            continue;
        };
        resolved += 1;

        if asset.has_transform() {
            report.add(
                ReportItem::warning(
                    "appearance",
                    format!("Clip may have transforms; verify framing after relink: {name}"),
                )
                .with_clip(name)
                .with_data("transform_flags", json!(asset.transform_flags)),
            );
        }
        if let ResolvedVia::Rule(rule) = &via {
            check_metadata(asset, rule, pack, report);
        }
        if let ResolvedVia::Fuzzy { score } = via {
            report.add(
                ReportItem::warning(
                    "resolve",
                    format!("Fuzzy fallback used for {name} (score {score:.3})"),
                )
                .with_clip(name)
                .with_data("score", json!(score)),
            );
        }

        // Recorded before the sink runs: the log captures attempts, not
        // just successes.
        tx.record(Action::relink(name, &target, tx.dry_run));
        if tx.dry_run {
            report.add(
                ReportItem::info("swap", format!("Dry run: relink {name} -> {target}"))
                    .with_clip(name),
            );
        } else {
            match sink.relink(name, &target) {
                Ok(()) => report.add(
                    ReportItem::info("swap", format!("Relinked {name} -> {target}"))
                        .with_clip(name),
                ),
                Err(err) => report.add(
                    ReportItem::error(
                        "swap",
                        format!("Failed to relink {name} -> {target}: {err}"),
                    )
                    .with_clip(name),
                ),
            }
        }
    }

    let warnings = report.count(Severity::Warning);
    let errors = report.count(Severity::Error);
    report
        .summary
        .insert("items_scanned".to_string(), json!(assets.len()));
    report.summary.insert("resolved".to_string(), json!(resolved));
    report
        .summary
        .insert("unresolved".to_string(), json!(unresolved));
    report.summary.insert("warnings".to_string(), json!(warnings));
    report.summary.insert("errors".to_string(), json!(errors));
}

fn check_metadata(asset: &AssetDescriptor, rule: &Rule, pack: &MappingPack, report: &mut Report) {
    let name = asset.name.as_str();
    if let (Some(expected), Some(actual)) =
        (rule.expected_resolution.as_deref(), asset.resolution.as_deref())
    {
        if expected != actual {
            report.add(
                ReportItem::warning(
                    "resolution",
                    format!("Clip resolution {actual} differs from expected {expected}"),
                )
                .with_clip(name)
                .with_data("expected", json!(expected))
                .with_data("actual", json!(actual)),
            );
        }
    }
    if let (Some(expected), Some(aspect)) = (rule.expected_aspect, asset.aspect_ratio()) {
        if (aspect - expected).abs() > pack.aspect_tolerance {
            report.add(
                ReportItem::warning(
                    "aspect",
                    format!("Clip aspect {aspect:.2} differs from expected {expected:.2}"),
                )
                .with_clip(name),
            );
        }
    }
}
