//! Exit evaluation for an open long position.
//!
//! The stop is checked first and against the close; the target is checked
//! against the high. When one bar touches both levels the stop wins.

use super::order::ExitReason;
use super::position::Levels;
use super::snapshot::BarPrices;

pub fn evaluate_exit(bar: &BarPrices, levels: &Levels) -> Option<ExitReason> {
    if bar.close <= levels.stop_loss {
        Some(ExitReason::StopLoss)
    } else if bar.high >= levels.take_profit {
        Some(ExitReason::TakeProfit)
    } else {
        None
    }
}
