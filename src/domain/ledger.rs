//! Position ledger: one [`PositionState`] per instrument in the universe.
//!
//! The ledger only performs state transitions. It never places orders; the
//! controller emits an order intent after a transition has been accepted.

use std::collections::HashMap;

use super::error::LedgerError;
use super::instrument::Instrument;
use super::position::{Levels, PositionState};

#[derive(Debug, Clone, PartialEq)]
pub struct PositionLedger {
    slots: Vec<(Instrument, PositionState)>,
    index: HashMap<Instrument, usize>,
}

impl PositionLedger {
    /// Every instrument starts flat. Duplicates collapse onto the first slot.
    pub fn new(universe: &[Instrument]) -> Self {
        let mut slots = Vec::with_capacity(universe.len());
        let mut index = HashMap::with_capacity(universe.len());
        for instrument in universe {
            if !index.contains_key(instrument) {
                index.insert(instrument.clone(), slots.len());
                slots.push((instrument.clone(), PositionState::Flat));
            }
        }
        PositionLedger { slots, index }
    }

    fn slot_mut(&mut self, instrument: &Instrument) -> Result<&mut PositionState, LedgerError> {
        match self.index.get(instrument) {
            Some(&i) => Ok(&mut self.slots[i].1),
            None => Err(LedgerError::UnknownInstrument(instrument.clone())),
        }
    }

    pub fn state(&self, instrument: &Instrument) -> Option<&PositionState> {
        self.index.get(instrument).map(|&i| &self.slots[i].1)
    }

    pub fn open(
        &mut self,
        instrument: &Instrument,
        entry_price: f64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<(), LedgerError> {
        let slot = self.slot_mut(instrument)?;
        if slot.is_open() {
            return Err(LedgerError::InvalidTransition {
                instrument: instrument.clone(),
                action: "open",
                state: slot.label(),
            });
        }

        let levels = Levels {
            entry_price,
            stop_loss,
            take_profit,
        };
        if !levels.is_well_ordered() {
            return Err(LedgerError::InvalidLevels {
                instrument: instrument.clone(),
                entry_price,
                stop_loss,
                take_profit,
            });
        }

        *slot = PositionState::Open(levels);
        Ok(())
    }

    /// Flattens the position and hands back the levels it held.
    pub fn close(&mut self, instrument: &Instrument) -> Result<Levels, LedgerError> {
        let slot = self.slot_mut(instrument)?;
        let levels = match *slot {
            PositionState::Open(levels) => levels,
            PositionState::Flat => {
                return Err(LedgerError::InvalidTransition {
                    instrument: instrument.clone(),
                    action: "close",
                    state: slot.label(),
                });
            }
        };
        *slot = PositionState::Flat;
        Ok(levels)
    }

    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|(_, s)| s.is_open()).count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots in universe order.
    pub fn iter(&self) -> impl Iterator<Item = (&Instrument, &PositionState)> {
        self.slots.iter().map(|(i, s)| (i, s))
    }
}
