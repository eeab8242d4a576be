//! JSON-lines export of tick records.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use rotorsim_core::TickRecord;
use serde::Serialize;

use crate::EngineError;

#[derive(Serialize)]
struct RecordLine<'a> {
    ts: DateTime<Utc>,
    #[serde(flatten)]
    record: &'a TickRecord,
}

/// Appends one JSON object per tick, stamped with the wall-clock time.
pub struct RecordWriter {
    out: BufWriter<Box<dyn Write + Send>>,
}

impl RecordWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let file = File::create(path)?;
        Ok(Self::from_writer(file))
    }

    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            out: BufWriter::new(Box::new(writer)),
        }
    }

    pub fn write(&mut self, record: &TickRecord) -> Result<(), EngineError> {
        let line = RecordLine {
            ts: Utc::now(),
            record,
        };
        serde_json::to_writer(&mut self.out, &line)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), EngineError> {
        self.out.flush()?;
        Ok(())
    }
}
