//! JSON-lines tick store.
//!
//! One serialized [`Tick`] per line. Appends never rewrite existing lines.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::adapters::tick_stream::spawn_stream;
use crate::domain::error::TicksimError;
use crate::domain::tick::Tick;
use crate::ports::data_port::{TickSource, TickStream};

#[derive(Debug, Clone)]
pub struct TickStore {
    path: PathBuf,
}

impl TickStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_append(&self) -> Result<BufWriter<File>, TicksimError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(BufWriter::new(file))
    }

    pub fn append(&self, tick: &Tick) -> Result<(), TicksimError> {
        let mut out = self.open_append()?;
        write_line(&mut out, tick)?;
        out.flush()?;
        Ok(())
    }

    /// Drain `stream` into the store. Ticks received before a stream error are
    /// kept; the error is returned. Returns the number of ticks written.
    pub fn ingest(&self, stream: TickStream) -> Result<usize, TicksimError> {
        let mut out = self.open_append()?;
        let mut written = 0usize;
        let mut result = Ok(());
        for item in stream {
            match item {
                Ok(tick) => {
                    write_line(&mut out, &tick)?;
                    written += 1;
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        out.flush()?;
        info!(path = %self.path.display(), written, "ingest finished");
        result.map(|_| written)
    }

    fn ticks(&self) -> Result<impl Iterator<Item = Result<Tick, TicksimError>> + use<>, TicksimError> {
        let file = File::open(&self.path)?;
        debug!(path = %self.path.display(), "opened tick store");
        Ok(serde_json::Deserializer::from_reader(BufReader::new(file))
            .into_iter::<Tick>()
            .map(|r| r.map_err(TicksimError::from)))
    }
}

fn write_line(out: &mut impl Write, tick: &Tick) -> Result<(), TicksimError> {
    serde_json::to_writer(&mut *out, tick)?;
    out.write_all(b"\n")?;
    Ok(())
}

impl TickSource for TickStore {
    fn load_all(&self) -> Result<Vec<Tick>, TicksimError> {
        self.ticks()?.collect()
    }

    fn stream(&self) -> TickStream {
        let store = self.clone();
        spawn_stream("tick_store", move || store.ticks())
    }
}
