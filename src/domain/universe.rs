//! Instrument universe: parsing the configured list and checking that every
//! instrument has enough history to warm its indicators up.
//!
//! The controller holds evaluation until all instruments are warm, so an
//! instrument that can never warm up would stall the whole run. Such
//! instruments are dropped here, before the replay starts.

use crate::domain::error::RaphaelError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::{OhlcvBar, resample_daily};
use crate::domain::strategy::IndicatorPeriods;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Universe {
    pub instruments: Vec<Instrument>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in instrument list")]
    EmptyToken,

    #[error("duplicate instrument: {0}")]
    DuplicateInstrument(String),
}

pub fn parse_instruments(input: &str) -> Result<Vec<Instrument>, UniverseError> {
    let mut instruments = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let instrument = Instrument::new(trimmed);
        if !seen.insert(instrument.clone()) {
            return Err(UniverseError::DuplicateInstrument(instrument.to_string()));
        }
        instruments.push(instrument);
    }

    Ok(instruments)
}

/// Instruments that passed validation, with their bars already loaded.
pub struct UniverseValidationResult {
    pub universe: Universe,
    pub bars: Vec<Vec<OhlcvBar>>,
    pub skipped: Vec<SkippedInstrument>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedInstrument {
    pub instrument: Instrument,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
    InsufficientDays { days: usize },
}

pub fn validate_universe(
    data_port: &dyn DataPort,
    instruments: Vec<Instrument>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    periods: &IndicatorPeriods,
) -> Result<UniverseValidationResult, RaphaelError> {
    let min_bars = periods.warmup_bars();
    let min_days = periods.warmup_days();
    let mut valid = Vec::new();
    let mut bars = Vec::new();
    let mut skipped = Vec::new();

    for instrument in instruments {
        let ohlcv = match data_port.fetch_ohlcv(&instrument, start_date, end_date) {
            Ok(data) => data,
            Err(e) => {
                warn!(%instrument, error = %e, "skipping instrument");
                skipped.push(SkippedInstrument {
                    instrument,
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if ohlcv.is_empty() {
            warn!(%instrument, "skipping instrument: no data in range");
            skipped.push(SkippedInstrument {
                instrument,
                reason: SkipReason::NoData,
            });
            continue;
        }

        if ohlcv.len() < min_bars {
            warn!(
                %instrument,
                bars = ohlcv.len(),
                minimum = min_bars,
                "skipping instrument: not enough bars to warm up"
            );
            skipped.push(SkippedInstrument {
                instrument,
                reason: SkipReason::InsufficientBars { bars: ohlcv.len() },
            });
            continue;
        }

        let days = resample_daily(&ohlcv).len();
        if days < min_days {
            warn!(
                %instrument,
                days,
                minimum = min_days,
                "skipping instrument: not enough trading days to warm up daily RSI"
            );
            skipped.push(SkippedInstrument {
                instrument,
                reason: SkipReason::InsufficientDays { days },
            });
            continue;
        }

        eprintln!("  {}: {} bars [OK]", instrument, ohlcv.len());
        valid.push(instrument);
        bars.push(ohlcv);
    }

    if valid.is_empty() {
        return Err(RaphaelError::InsufficientData {
            instrument: "all".to_string(),
            bars: 0,
            minimum: min_bars,
        });
    }

    if !skipped.is_empty() {
        eprintln!(
            "Replaying {} of {} instruments",
            valid.len(),
            valid.len() + skipped.len()
        );
    }

    Ok(UniverseValidationResult {
        universe: Universe {
            instruments: valid,
        },
        bars,
        skipped,
    })
}
