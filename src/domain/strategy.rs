//! Strategy and indicator parameters, fixed for the lifetime of a run.

use std::fmt;
use std::str::FromStr;

use super::indicator::IndicatorType;
use super::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};

/// Decision parameters shared by every instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParameters {
    /// Entry requires RSI strictly above this level.
    pub rsi_threshold: f64,
    /// Stop-loss distance in ATRs below the entry close.
    pub stop_loss_atr: f64,
    /// Take-profit distance in ATRs above the entry close.
    pub take_profit_atr: f64,
    /// Fraction of capital committed to each new position.
    pub allocation: f64,
}

impl Default for StrategyParameters {
    fn default() -> Self {
        StrategyParameters {
            rsi_threshold: 50.0,
            stop_loss_atr: 2.0,
            take_profit_atr: 4.0,
            allocation: 0.1,
        }
    }
}

/// Bars the RSI is computed on. MACD, EMA and ATR always use the feed's bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RsiResolution {
    /// Same bars as the other indicators.
    Bar,
    /// Daily closes; each bar reads the RSI of the last completed day.
    #[default]
    Daily,
}

impl FromStr for RsiResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(RsiResolution::Bar),
            "daily" => Ok(RsiResolution::Daily),
            other => Err(format!(
                "unknown RSI resolution '{}', expected 'bar' or 'daily'",
                other
            )),
        }
    }
}

impl fmt::Display for RsiResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RsiResolution::Bar => f.write_str("bar"),
            RsiResolution::Daily => f.write_str("daily"),
        }
    }
}

/// Look-back periods of the indicators feeding the snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPeriods {
    pub rsi: usize,
    pub rsi_resolution: RsiResolution,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub ema: usize,
    pub atr: usize,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        IndicatorPeriods {
            rsi: 13,
            rsi_resolution: RsiResolution::Daily,
            macd_fast: DEFAULT_FAST,
            macd_slow: DEFAULT_SLOW,
            macd_signal: DEFAULT_SIGNAL,
            ema: 34,
            atr: 13,
        }
    }
}

impl IndicatorPeriods {
    pub fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![
            match self.rsi_resolution {
                RsiResolution::Bar => IndicatorType::Rsi(self.rsi),
                RsiResolution::Daily => IndicatorType::DailyRsi(self.rsi),
            },
            IndicatorType::Macd {
                fast: self.macd_fast,
                slow: self.macd_slow,
                signal: self.macd_signal,
            },
            IndicatorType::Ema(self.ema),
            IndicatorType::Atr(self.atr),
        ]
    }

    /// Number of bars after which every bar-resolution indicator has a
    /// defined value.
    pub fn warmup_bars(&self) -> usize {
        let rsi = match self.rsi_resolution {
            RsiResolution::Bar => self.rsi + 1,
            RsiResolution::Daily => 0,
        };
        let macd = self.macd_fast.max(self.macd_slow) + self.macd_signal - 1;
        rsi.max(macd).max(self.ema).max(self.atr)
    }

    /// Distinct trading days needed before a daily RSI is readable: `rsi + 1`
    /// completed closes, plus the session that reads the last of them.
    pub fn warmup_days(&self) -> usize {
        match self.rsi_resolution {
            RsiResolution::Bar => 0,
            RsiResolution::Daily => self.rsi + 2,
        }
    }
}
