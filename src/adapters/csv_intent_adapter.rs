//! Order sink that appends every intent to a CSV journal.
//!
//! Columns: `timestamp,instrument,action,fraction,entry_price,stop_loss,take_profit,reason`.
//! Price columns are left empty on liquidations, `reason` is empty on entries.

use crate::domain::error::RaphaelError;
use crate::domain::order::OrderIntent;
use crate::ports::order_port::OrderPort;
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 8] = [
    "timestamp",
    "instrument",
    "action",
    "fraction",
    "entry_price",
    "stop_loss",
    "take_profit",
    "reason",
];

pub struct CsvIntentAdapter<W: Write> {
    writer: csv::Writer<W>,
    written: usize,
}

impl CsvIntentAdapter<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, RaphaelError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| RaphaelError::OrderSink {
            reason: format!("failed to create {}: {}", path.display(), e),
        })?;
        Self::new(file)
    }
}

impl<W: Write> CsvIntentAdapter<W> {
    pub fn new(inner: W) -> Result<Self, RaphaelError> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(HEADER).map_err(sink_error)?;
        Ok(Self { writer, written: 0 })
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> Result<W, RaphaelError> {
        self.writer.into_inner().map_err(|e| RaphaelError::OrderSink {
            reason: e.to_string(),
        })
    }
}

fn sink_error(e: csv::Error) -> RaphaelError {
    RaphaelError::OrderSink {
        reason: e.to_string(),
    }
}

fn intent_record(timestamp: NaiveDateTime, intent: &OrderIntent) -> [String; 8] {
    let ts = timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
    match intent {
        OrderIntent::EnterLong {
            instrument,
            fraction,
            entry_price,
            stop_loss,
            take_profit,
        } => [
            ts,
            instrument.to_string(),
            intent.action().to_string(),
            format!("{:.4}", fraction),
            format!("{:.4}", entry_price),
            format!("{:.4}", stop_loss),
            format!("{:.4}", take_profit),
            String::new(),
        ],
        OrderIntent::ExitLiquidate { instrument, reason } => [
            ts,
            instrument.to_string(),
            intent.action().to_string(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            reason.to_string(),
        ],
    }
}

impl<W: Write> OrderPort for CsvIntentAdapter<W> {
    fn submit(&mut self, timestamp: NaiveDateTime, intent: &OrderIntent) -> Result<(), RaphaelError> {
        self.writer
            .write_record(intent_record(timestamp, intent))
            .map_err(sink_error)?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), RaphaelError> {
        self.writer.flush().map_err(|e| RaphaelError::OrderSink {
            reason: e.to_string(),
        })
    }
}
