//! Domain error types.

use crate::domain::instrument::Instrument;
use crate::domain::universe::UniverseError;

/// Rejections raised by the position ledger.
///
/// These are local to one instrument for one tick; the controller records them
/// and carries on with the rest of the universe.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid transition for {instrument}: {action} while {state}")]
    InvalidTransition {
        instrument: Instrument,
        action: &'static str,
        state: &'static str,
    },

    #[error(
        "invalid levels for {instrument}: stop {stop_loss} / entry {entry_price} / target {take_profit}"
    )]
    InvalidLevels {
        instrument: Instrument,
        entry_price: f64,
        stop_loss: f64,
        take_profit: f64,
    },

    #[error("instrument {0} is not part of the universe")]
    UnknownInstrument(Instrument),
}

/// Top-level error type for raphael.
#[derive(Debug, thiserror::Error)]
pub enum RaphaelError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error("no data for {instrument}")]
    NoData { instrument: String },

    #[error("insufficient data for {instrument}: have {bars} bars, need {minimum}")]
    InsufficientData {
        instrument: String,
        bars: usize,
        minimum: usize,
    },

    #[error("order sink error: {reason}")]
    OrderSink { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RaphaelError> for std::process::ExitCode {
    fn from(err: &RaphaelError) -> Self {
        let code: u8 = match err {
            RaphaelError::Io(_) => 1,
            RaphaelError::ConfigParse { .. }
            | RaphaelError::ConfigMissing { .. }
            | RaphaelError::ConfigInvalid { .. } => 2,
            RaphaelError::OrderSink { .. } => 3,
            RaphaelError::Universe(_) => 4,
            RaphaelError::Data { .. }
            | RaphaelError::NoData { .. }
            | RaphaelError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
