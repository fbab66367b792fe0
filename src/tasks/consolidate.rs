//! Consolidation of metric batch files.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use super::{IgnoreBrokenPipe, PendingJson};
use crate::consolidate::{read_batch, ConsolidatedView, MetricsConsolidator};
use crate::error_handling::{InfoType, ProcessingStats};
use crate::features::FeatureRegistry;

/// Merges the batch files at `paths` and writes the result to `output`, or
/// to stdout when no output is given.
///
/// Every batch is read before anything is written. With a `registry`, the
/// value of each feature insight is logged.
pub fn consolidate_batches(
    paths: &[PathBuf],
    flatten: bool,
    output: Option<&Path>,
    registry: Option<&FeatureRegistry>,
    stats: &ProcessingStats,
) -> Result<ConsolidatedView> {
    let batches = paths
        .iter()
        .map(|path| read_batch(path))
        .collect::<Result<Vec<_>>>()?;
    info!("Read {} batch file(s)", batches.len());

    let metrics = MetricsConsolidator::new(batches)
        .consolidate()
        .context("Failed to consolidate batches")?;
    stats.add_info(InfoType::ConsolidatedKey, metrics.len());

    if let Some(registry) = registry {
        for (insight, value) in registry.evaluate_insights(&metrics, stats) {
            info!("{} ({}): {}", insight.name, insight.identifier, value);
        }
    }

    let view = if flatten {
        ConsolidatedView::Flat(
            metrics
                .flatten()
                .context("Failed to flatten consolidated metrics")?,
        )
    } else {
        ConsolidatedView::Nested(metrics)
    };

    match output {
        Some(path) => {
            PendingJson::write(path, &view)?.commit()?;
            info!("Wrote consolidated metrics to {}", path.display());
        }
        None => {
            let mut out = BufWriter::new(IgnoreBrokenPipe::new(io::stdout().lock()));
            serde_json::to_writer(&mut out, &view).context("Failed to write consolidated metrics")?;
            writeln!(out)?;
            out.flush()?;
        }
    }
    Ok(view)
}
