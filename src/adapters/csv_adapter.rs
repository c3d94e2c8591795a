//! CSV tick file adapter.
//!
//! Columns are located by header name (case-insensitive, any order). The
//! `volume_profile` column holds `price:vol|price:vol`; malformed pairs are
//! skipped. `session` and `symbol` are optional.

use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;

use chrono::DateTime;
use tracing::warn;

use crate::adapters::tick_stream::spawn_stream;
use crate::domain::error::TicksimError;
use crate::domain::tick::{PriceLevel, Tick};
use crate::ports::data_port::{TickSource, TickStream};

#[derive(Debug, Clone)]
pub struct CsvTickReader {
    path: PathBuf,
}

impl CsvTickReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ticks(&self) -> Result<impl Iterator<Item = Result<Tick, TicksimError>> + use<>, TicksimError> {
        let file = File::open(&self.path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);
        let columns = Columns::from_header(rdr.headers()?);

        Ok(rdr
            .into_records()
            .enumerate()
            .map(move |(i, record)| {
                // header is line 1
                let line = i + 2;
                let record = record?;
                columns.parse(&record).map_err(|reason| TicksimError::Data {
                    reason: format!("line {line}: {reason}"),
                })
            }))
    }
}

impl TickSource for CsvTickReader {
    fn load_all(&self) -> Result<Vec<Tick>, TicksimError> {
        self.ticks()?.collect()
    }

    fn stream(&self) -> TickStream {
        let reader = self.clone();
        spawn_stream("csv", move || reader.ticks())
    }
}

struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn from_header(header: &csv::StringRecord) -> Self {
        let index = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();
        Columns { index }
    }

    fn get<'r>(&self, record: &'r csv::StringRecord, key: &str) -> &'r str {
        self.index
            .get(key)
            .and_then(|&i| record.get(i))
            .map(str::trim)
            .unwrap_or("")
    }

    fn parse(&self, record: &csv::StringRecord) -> Result<Tick, String> {
        let ts = self.get(record, "timestamp");
        if ts.is_empty() {
            return Err("missing timestamp".into());
        }
        let timestamp =
            DateTime::parse_from_rfc3339(ts).map_err(|e| format!("bad timestamp {ts:?}: {e}"))?;

        Ok(Tick {
            timestamp,
            open: parse_field(self.get(record, "open"), "open")?,
            high: parse_field(self.get(record, "high"), "high")?,
            low: parse_field(self.get(record, "low"), "low")?,
            close: parse_field(self.get(record, "close"), "close")?,
            volume: parse_field(self.get(record, "volume"), "volume")?,
            bid_ask_delta: parse_field(self.get(record, "bid_ask_delta"), "bid_ask_delta")?,
            volume_profile: parse_volume_profile(self.get(record, "volume_profile")),
            session: self.get(record, "session").to_string(),
            symbol: self.get(record, "symbol").to_string(),
        })
    }
}

fn parse_field<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, String> {
    if raw.is_empty() {
        return Err(format!("missing {name}"));
    }
    raw.parse().map_err(|_| format!("bad {name} {raw:?}"))
}

/// Parse `price:vol|price:vol`, dropping pairs that do not parse.
pub fn parse_volume_profile(raw: &str) -> Vec<PriceLevel> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split('|')
        .filter_map(|pair| {
            let mut parts = pair.split(':');
            let (Some(price), Some(volume), None) = (parts.next(), parts.next(), parts.next())
            else {
                warn!(pair, "skipping malformed volume profile pair");
                return None;
            };
            match (price.trim().parse(), volume.trim().parse()) {
                (Ok(price), Ok(volume)) => Some(PriceLevel { price, volume }),
                _ => {
                    warn!(pair, "skipping malformed volume profile pair");
                    None
                }
            }
        })
        .collect()
}
