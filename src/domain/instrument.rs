//! Instrument identifier.

use std::fmt;

/// Opaque ticker symbol. Symbols are normalised to upper case on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Instrument(String);

impl Instrument {
    pub fn new(symbol: &str) -> Self {
        Instrument(symbol.trim().to_uppercase())
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Instrument {
    fn from(symbol: &str) -> Self {
        Instrument::new(symbol)
    }
}
