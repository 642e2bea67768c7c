//! Order intents handed to the execution collaborator.

use std::fmt;

use super::instrument::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop-loss"),
            ExitReason::TakeProfit => write!(f, "take-profit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderIntent {
    /// Buy `fraction` of available capital at market.
    EnterLong {
        instrument: Instrument,
        fraction: f64,
        entry_price: f64,
        stop_loss: f64,
        take_profit: f64,
    },
    /// Sell the whole position.
    ExitLiquidate {
        instrument: Instrument,
        reason: ExitReason,
    },
}

impl OrderIntent {
    pub fn instrument(&self) -> &Instrument {
        match self {
            OrderIntent::EnterLong { instrument, .. }
            | OrderIntent::ExitLiquidate { instrument, .. } => instrument,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            OrderIntent::EnterLong { .. } => "enter-long",
            OrderIntent::ExitLiquidate { .. } => "liquidate",
        }
    }
}
