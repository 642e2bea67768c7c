//! Entry evaluation for a flat instrument.
//!
//! Entry requires, on the same bar:
//! 1. RSI strictly above the threshold
//! 2. open and close both above the EMA
//! 3. a fresh MACD cross: previous line below previous signal, current line
//!    above current signal
//!
//! Levels are sized from ATR: stop = close - atr * stop multiple,
//! target = close + atr * take-profit multiple.

use super::snapshot::IndicatorSnapshot;
use super::strategy::StrategyParameters;

/// Levels and sizing of a long entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntrySignal {
    pub fraction: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryDecision {
    /// A required value is still undefined.
    NotReady,
    NoSignal,
    EnterLong(EntrySignal),
}

pub fn evaluate_entry(snapshot: &IndicatorSnapshot, params: &StrategyParameters) -> EntryDecision {
    let (Some(rsi), Some(macd), Some(prev), Some(ema), Some(atr)) = (
        snapshot.rsi,
        snapshot.macd,
        snapshot.prev_macd,
        snapshot.ema,
        snapshot.atr,
    ) else {
        return EntryDecision::NotReady;
    };

    let bar = &snapshot.bar;
    let rsi_bullish = rsi > params.rsi_threshold;
    let uptrend = bar.open > ema && bar.close > ema;
    let macd_cross = prev.is_below_signal() && macd.is_above_signal();

    if !(rsi_bullish && uptrend && macd_cross) {
        return EntryDecision::NoSignal;
    }

    EntryDecision::EnterLong(EntrySignal {
        fraction: params.allocation,
        entry_price: bar.close,
        stop_loss: bar.close - atr * params.stop_loss_atr,
        take_profit: bar.close + atr * params.take_profit_atr,
    })
}
