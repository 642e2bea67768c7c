//! Per-instrument, per-bar indicator snapshot.

/// MACD line together with its signal line for one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdReading {
    pub value: f64,
    pub signal: f64,
}

impl MacdReading {
    pub fn is_above_signal(&self) -> bool {
        self.value > self.signal
    }

    pub fn is_below_signal(&self) -> bool {
        self.value < self.signal
    }
}

/// Prices of the current bar. Always defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarPrices {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Everything the evaluators need to decide on one instrument for one bar.
///
/// Indicator fields are `None` until the indicator has enough history. A
/// computed zero (e.g. ATR on a flat market) is `Some(0.0)`.
///
/// `prev_macd` is the reading of the bar the controller processed before this
/// one; providers leave it `None` and the controller fills it in.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub bar: BarPrices,
    pub rsi: Option<f64>,
    pub macd: Option<MacdReading>,
    pub prev_macd: Option<MacdReading>,
    pub ema: Option<f64>,
    pub atr: Option<f64>,
}

impl IndicatorSnapshot {
    pub fn new(bar: BarPrices) -> Self {
        IndicatorSnapshot {
            bar,
            rsi: None,
            macd: None,
            prev_macd: None,
            ema: None,
            atr: None,
        }
    }

    /// True once every tracked indicator has produced a value.
    pub fn indicators_ready(&self) -> bool {
        self.rsi.is_some() && self.macd.is_some() && self.ema.is_some() && self.atr.is_some()
    }
}
