//! Technical indicator series that feed the snapshot provider.
//!
//! - `IndicatorPoint`: a single point in an indicator time series
//! - `IndicatorValue`: output shape (single value or MACD triple)
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: a time series aligned 1:1 with the input bars
//!
//! Points inside an indicator's warm-up carry `valid == false`; the accessors
//! on [`IndicatorSeries`] turn those into `None` so that "not ready" is never
//! confused with a computed zero.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::snapshot::MacdReading;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Rsi(usize),
    DailyRsi(usize),
    Atr(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        }
    }

    /// Single value at `index`, or `None` during warm-up / past the end.
    pub fn simple_at(&self, index: usize) -> Option<f64> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Simple(v),
                ..
            }) => Some(*v),
            _ => None,
        }
    }

    /// MACD line and signal at `index`, or `None` during warm-up / past the end.
    pub fn macd_at(&self, index: usize) -> Option<MacdReading> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Macd { line, signal, .. },
                ..
            }) => Some(MacdReading {
                value: *line,
                signal: *signal,
            }),
            _ => None,
        }
    }

    /// Index of the first valid point.
    pub fn first_valid(&self) -> Option<usize> {
        self.values.iter().position(|p| p.valid)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::DailyRsi(period) => write!(f, "RSI({},daily)", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}
