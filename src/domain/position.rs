//! Per-instrument position state.

/// Protective levels of an open long position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl Levels {
    /// `stop_loss < entry_price < take_profit`. NaN anywhere fails.
    pub fn is_well_ordered(&self) -> bool {
        self.entry_price > 0.0
            && self.stop_loss < self.entry_price
            && self.entry_price < self.take_profit
    }
}

/// An instrument is either flat or holds exactly one long position with all
/// three levels set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Open(Levels),
}

impl PositionState {
    pub fn is_open(&self) -> bool {
        matches!(self, PositionState::Open(_))
    }

    pub fn levels(&self) -> Option<&Levels> {
        match self {
            PositionState::Flat => None,
            PositionState::Open(levels) => Some(levels),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PositionState::Flat => "flat",
            PositionState::Open(_) => "open",
        }
    }
}
