//! Average True Range with Wilder's smoothing.
//!
//! The first bar's true range is high - low. The seed is the mean of the first
//! n true ranges; afterwards ATR = (prev * (n-1) + TR) / n.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Atr(period));
    }

    let tr_values: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut values = Vec::with_capacity(bars.len());
    let mut atr = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let valid = if i + 1 < period {
            false
        } else if i + 1 == period {
            atr = tr_values[..=i].iter().sum::<f64>() / period as f64;
            true
        } else {
            atr = (atr * (period - 1) as f64 + tr_values[i]) / period as f64;
            true
        };
        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value: IndicatorValue::Simple(if valid { atr } else { 0.0 }),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}
