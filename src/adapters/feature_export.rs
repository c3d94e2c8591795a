//! Feature table export to CSV.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::SecondsFormat;
use tracing::info;

use crate::domain::error::TicksimError;
use crate::domain::tick::{FeatureSet, Tick};

/// Write `timestamp`, every feature key seen in any set (sorted), then `label`.
/// Keys missing from a particular set are written as 0.
pub fn export_features<P, L>(path: P, sets: &[FeatureSet], label: L) -> Result<(), TicksimError>
where
    P: AsRef<Path>,
    L: Fn(usize, &FeatureSet) -> i64,
{
    if sets.is_empty() {
        return Err(TicksimError::Data {
            reason: "no features to export".into(),
        });
    }
    let columns = collect_columns(sets);

    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    let mut header = Vec::with_capacity(columns.len() + 2);
    header.push("timestamp");
    header.extend(columns.iter().map(String::as_str));
    header.push("label");
    wtr.write_record(&header)?;

    for (i, fs) in sets.iter().enumerate() {
        let mut row = Vec::with_capacity(columns.len() + 2);
        row.push(fs.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true));
        row.extend(columns.iter().map(|c| format!("{:.6}", fs.get(c))));
        row.push(label(i, fs).to_string());
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    info!(path = %path.as_ref().display(), rows = sets.len(), columns = columns.len(), "features exported");
    Ok(())
}

fn collect_columns(sets: &[FeatureSet]) -> Vec<String> {
    let keys: BTreeSet<&String> = sets.iter().flat_map(|fs| fs.values.keys()).collect();
    keys.into_iter().cloned().collect()
}

/// Direction of the next close: 1 up, -1 down, 0 unchanged or last tick.
pub fn next_close_labels(ticks: &[Tick]) -> Vec<i64> {
    let mut labels: Vec<i64> = ticks
        .windows(2)
        .map(|w| {
            if w[1].close > w[0].close {
                1
            } else if w[1].close < w[0].close {
                -1
            } else {
                0
            }
        })
        .collect();
    if !ticks.is_empty() {
        labels.push(0);
    }
    labels
}
