//! CSV file data adapter.
//!
//! One file per instrument, `<base>/<INSTRUMENT>.csv`, with the header
//! `timestamp,open,high,low,close,volume`. The file name is matched against
//! the symbol without regard to case.

use crate::domain::error::RaphaelError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `<SYMBOL>.csv` if present, otherwise any `.csv` whose stem names the
    /// same instrument.
    fn csv_path(&self, instrument: &Instrument) -> Option<PathBuf> {
        let exact = self.base_path.join(format!("{}.csv", instrument));
        if exact.is_file() {
            return Some(exact);
        }
        fs::read_dir(&self.base_path)
            .ok()?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .find(|path| csv_instrument(path).as_ref() == Some(instrument))
    }
}

fn csv_instrument(path: &Path) -> Option<Instrument> {
    if path.extension().and_then(|e| e.to_str()) != Some("csv") {
        return None;
    }
    let instrument = Instrument::new(path.file_stem()?.to_str()?);
    (!instrument.symbol().is_empty()).then_some(instrument)
}

/// Accepts hourly timestamps in either separator style, or a bare date which
/// is read as midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn column<'a>(record: &'a csv::StringRecord, index: usize, name: &str) -> Result<&'a str, RaphaelError> {
    record.get(index).map(str::trim).ok_or_else(|| RaphaelError::Data {
        reason: format!("missing {} column", name),
    })
}

fn price(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, RaphaelError> {
    column(record, index, name)?
        .parse()
        .map_err(|e| RaphaelError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        instrument: &Instrument,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RaphaelError> {
        let path = self.csv_path(instrument).ok_or_else(|| RaphaelError::NoData {
            instrument: instrument.to_string(),
        })?;
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RaphaelError::NoData {
                instrument: instrument.to_string(),
            },
            _ => RaphaelError::Data {
                reason: format!("failed to read {}: {}", path.display(), e),
            },
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| RaphaelError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let raw = column(&record, 0, "timestamp")?;
            let timestamp = parse_timestamp(raw).ok_or_else(|| RaphaelError::Data {
                reason: format!("invalid timestamp '{}' in {}", raw, path.display()),
            })?;

            let date = timestamp.date();
            if date < start_date || date > end_date {
                continue;
            }

            let volume_raw = column(&record, 5, "volume")?;
            // some feeds write volume as a float
            let volume = volume_raw
                .parse::<i64>()
                .or_else(|_| volume_raw.parse::<f64>().map(|v| v as i64))
                .map_err(|e| RaphaelError::Data {
                    reason: format!("invalid volume value: {}", e),
                })?;

            let bar = OhlcvBar {
                timestamp,
                open: price(&record, 1, "open")?,
                high: price(&record, 2, "high")?,
                low: price(&record, 3, "low")?,
                close: price(&record, 4, "close")?,
                volume,
            };
            bar.check_prices().map_err(|reason| RaphaelError::Data {
                reason: format!(
                    "bad bar at line {} of {}: {}",
                    record.position().map_or(0, |p| p.line()),
                    path.display(),
                    reason
                ),
            })?;
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn list_instruments(&self) -> Result<Vec<Instrument>, RaphaelError> {
        let mut instruments = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;

            if let Some(instrument) = csv_instrument(&entry.path()) {
                instruments.push(instrument);
            }
        }

        instruments.sort();
        instruments.dedup();
        Ok(instruments)
    }
}
