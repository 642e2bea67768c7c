//! Exponential Moving Average of closes.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Ema(period));
    }

    let mut values = Vec::with_capacity(bars.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let valid = if i < period - 1 {
            sum += bar.close;
            false
        } else if i == period - 1 {
            sum += bar.close;
            ema = sum / period as f64;
            true
        } else {
            ema = bar.close * k + ema * (1.0 - k);
            true
        };
        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value: IndicatorValue::Simple(if valid { ema } else { 0.0 }),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::from_closes;

    #[test]
    fn ema_warmup() {
        let bars = from_closes(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn ema_period_1_tracks_close() {
        let bars = from_closes(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 1);

        assert_eq!(series.simple_at(0), Some(10.0));
        assert_eq!(series.simple_at(1), Some(20.0));
        assert_eq!(series.simple_at(2), Some(30.0));
    }

    #[test]
    fn ema_seed_is_sma() {
        let bars = from_closes(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 3);

        assert_eq!(series.simple_at(1), None);
        let v = series.simple_at(2).unwrap();
        assert!((v - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let bars = from_closes(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3);

        let k = 2.0 / 4.0;
        let sma = 20.0;
        let ema_3 = 40.0 * k + sma * (1.0 - k);
        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);

        assert!((series.simple_at(3).unwrap() - ema_3).abs() < f64::EPSILON);
        assert!((series.simple_at(4).unwrap() - ema_4).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_equal_prices() {
        let bars = from_closes(&[100.0; 5]);
        let series = calculate_ema(&bars, 3);

        for i in 2..5 {
            assert!((series.simple_at(i).unwrap() - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_degenerate_inputs() {
        assert!(calculate_ema(&[], 3).values.is_empty());
        let series = calculate_ema(&from_closes(&[10.0, 20.0]), 0);
        assert!(series.values.is_empty());
        assert_eq!(series.indicator_type, IndicatorType::Ema(0));
    }
}
