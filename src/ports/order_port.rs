//! Order execution port.

use chrono::NaiveDateTime;

use crate::domain::error::RaphaelError;
use crate::domain::order::OrderIntent;

/// Receives order intents in emission order. Sizing, routing and fills are
/// the implementor's business.
pub trait OrderPort {
    fn submit(&mut self, timestamp: NaiveDateTime, intent: &OrderIntent) -> Result<(), RaphaelError>;

    fn flush(&mut self) -> Result<(), RaphaelError> {
        Ok(())
    }
}
