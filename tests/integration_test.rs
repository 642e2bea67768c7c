//! End-to-end replays over synthetic bar series.
//!
//! Tests cover:
//! - Entry on a MACD bull cross, exit at the take-profit and at the stop-loss
//! - The warm-up gate holding back every instrument until all are ready
//! - Universe validation skipping instruments that cannot warm up
//! - Order port failures aborting the replay

mod common;

use approx::assert_relative_eq;
use common::*;
use raphael::cli::{ReplaySettings, run_replay_pipeline};
use raphael::domain::controller::StrategyController;
use raphael::domain::error::RaphaelError;
use raphael::domain::instrument::Instrument;
use raphael::domain::instrument_data::InstrumentData;
use raphael::domain::order::{ExitReason, OrderIntent};
use raphael::domain::position::PositionState;
use raphael::domain::replay::{ReplayResult, run_replay};
use raphael::domain::strategy::{IndicatorPeriods, StrategyParameters};
use std::path::PathBuf;

fn replay(series: Vec<(&str, Vec<OhlcvBar>)>) -> (ReplayResult, RecordingOrderPort, StrategyController) {
    let periods = hourly_periods();
    let data: Vec<InstrumentData> = series
        .into_iter()
        .map(|(symbol, bars)| InstrumentData::new(Instrument::new(symbol), bars, &periods))
        .collect();
    let universe: Vec<Instrument> = data.iter().map(|d| d.instrument.clone()).collect();
    let mut controller = StrategyController::new(&universe, StrategyParameters::default());
    let mut orders = RecordingOrderPort::default();
    let result = run_replay(&data, &mut controller, &mut orders).unwrap();
    (result, orders, controller)
}

fn settings() -> ReplaySettings {
    ReplaySettings {
        data_dir: PathBuf::from("unused"),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        output: PathBuf::from("unused.csv"),
    }
}

fn kinds(orders: &RecordingOrderPort) -> Vec<(i64, String, String)> {
    orders
        .submitted
        .iter()
        .map(|(ts, intent)| {
            let hours = (*ts - hour(0)).num_hours();
            let kind = match intent {
                OrderIntent::EnterLong { .. } => "enter".to_string(),
                OrderIntent::ExitLiquidate { reason, .. } => reason.to_string(),
            };
            (hours, intent.instrument().to_string(), kind)
        })
        .collect()
}

mod single_instrument {
    use super::*;

    #[test]
    fn enters_on_cross_and_exits_at_target() {
        let (result, orders, controller) = replay(vec![("MSFT", wave_bars(0, 120, 100.0, 0.1, 2.0, 20.0))]);

        assert_eq!(result.ticks, 120);
        // default periods warm up after 34 bars
        assert_eq!(result.warmed_up_at, Some(hour(33)));
        assert_eq!(
            kinds(&orders),
            vec![
                (41, "MSFT".into(), "enter".into()),
                (82, "MSFT".into(), "take-profit".into()),
                (101, "MSFT".into(), "enter".into()),
            ]
        );
        assert_eq!(orders.flushes, 1);
        assert_eq!(result.intents.len(), 3);
        assert!(result.faults.is_empty());
        assert!(controller.ledger().state(&Instrument::new("MSFT")).unwrap().is_open());
    }

    #[test]
    fn entry_levels_follow_atr_multiples() {
        let bars = wave_bars(0, 60, 100.0, 0.1, 2.0, 20.0);
        let entry_close = bars[41].close;
        let (_, orders, _) = replay(vec![("MSFT", bars)]);

        let (_, intent) = &orders.submitted[0];
        let OrderIntent::EnterLong {
            fraction,
            entry_price,
            stop_loss,
            take_profit,
            ..
        } = intent
        else {
            panic!("expected an entry, got {:?}", intent);
        };
        assert_relative_eq!(*fraction, 0.1);
        assert_relative_eq!(*entry_price, entry_close);
        assert!(*stop_loss < *entry_price && *entry_price < *take_profit);
        // target sits 4 ATR above, stop 2 ATR below
        assert_relative_eq!(
            take_profit - entry_price,
            2.0 * (entry_price - stop_loss),
            epsilon = 1e-9
        );
    }

    #[test]
    fn crash_after_entry_hits_the_stop() {
        let bars = crash_from(wave_bars(0, 80, 100.0, 0.1, 2.0, 20.0), 45, 1.0);
        let (result, orders, controller) = replay(vec![("NVDA", bars)]);

        assert_eq!(
            kinds(&orders),
            vec![
                (41, "NVDA".into(), "enter".into()),
                (49, "NVDA".into(), "stop-loss".into()),
            ]
        );
        assert_eq!(
            controller.ledger().state(&Instrument::new("NVDA")),
            Some(&PositionState::Flat)
        );

        let summary = &result.summaries[0];
        assert_eq!(summary.entries, 1);
        assert_eq!(summary.stop_losses, 1);
        assert_eq!(summary.take_profits, 0);
        assert!(!summary.open_at_end);
        assert_eq!(summary.win_rate(), 0.0);
    }

    #[test]
    fn flat_series_never_trades() {
        let bars: Vec<OhlcvBar> = (0..100).map(|i| bar_at(i, 100.0)).collect();
        let (result, orders, _) = replay(vec![("PFE", bars)]);
        assert!(orders.submitted.is_empty());
        assert!(result.warmed_up_at.is_some());
    }
}

mod warm_up_gate {
    use super::*;

    #[test]
    fn late_instrument_holds_back_the_whole_universe() {
        let (result, orders, _) = replay(vec![
            ("MSFT", wave_bars(0, 120, 100.0, 0.1, 2.0, 20.0)),
            ("AMD", wave_bars(40, 120, 50.0, 0.05, 2.0, 30.0)),
        ]);

        // AMD's indicators are complete 34 bars after its first bar
        assert_eq!(result.warmed_up_at, Some(hour(73)));
        // MSFT's cross at hour 41 falls inside the warm-up window
        assert_eq!(
            kinds(&orders),
            vec![
                (81, "MSFT".into(), "enter".into()),
                (98, "AMD".into(), "enter".into()),
                (136, "AMD".into(), "take-profit".into()),
                (159, "AMD".into(), "enter".into()),
            ]
        );
        assert!(orders.submitted.iter().all(|(ts, _)| *ts >= hour(73)));
    }

    #[test]
    fn instrument_without_data_keeps_gate_closed() {
        let periods = hourly_periods();
        let data = vec![InstrumentData::new(
            Instrument::new("MSFT"),
            wave_bars(0, 120, 100.0, 0.1, 2.0, 20.0),
            &periods,
        )];
        let universe = vec![Instrument::new("MSFT"), Instrument::new("GHOST")];
        let mut controller = StrategyController::new(&universe, StrategyParameters::default());
        let mut orders = RecordingOrderPort::default();

        let result = run_replay(&data, &mut controller, &mut orders).unwrap();
        assert_eq!(result.warmed_up_at, None);
        assert!(orders.submitted.is_empty());
        // bookkeeping still ran during warm-up
        assert!(controller.previous_macd(&Instrument::new("MSFT")).is_some());
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn skips_short_and_failing_instruments() {
        let port = MockDataPort::new()
            .with_bars("MSFT", wave_bars(0, 120, 100.0, 0.1, 2.0, 20.0))
            .with_bars("TINY", wave_bars(0, 20, 100.0, 0.1, 2.0, 20.0))
            .with_error("BROKEN", "disk on fire");
        let mut orders = RecordingOrderPort::default();

        let result = run_replay_pipeline(
            &port,
            &settings(),
            &hourly_periods(),
            StrategyParameters::default(),
            vec![
                Instrument::new("MSFT"),
                Instrument::new("TINY"),
                Instrument::new("BROKEN"),
                Instrument::new("EMPTY"),
            ],
            &mut orders,
        )
        .unwrap();

        assert_eq!(result.summaries.len(), 1);
        assert_eq!(result.summaries[0].instrument, Instrument::new("MSFT"));
        assert_eq!(result.summaries[0].entries, 2);
        assert_eq!(result.summaries[0].take_profits, 1);
        assert!(result.summaries[0].open_at_end);
        assert_eq!(orders.submitted.len(), 3);
    }

    #[test]
    fn no_usable_instruments_is_insufficient_data() {
        let port = MockDataPort::new().with_bars("TINY", wave_bars(0, 10, 100.0, 0.1, 2.0, 20.0));
        let mut orders = RecordingOrderPort::default();

        let err = run_replay_pipeline(
            &port,
            &settings(),
            &hourly_periods(),
            StrategyParameters::default(),
            vec![Instrument::new("TINY")],
            &mut orders,
        )
        .unwrap_err();
        assert!(matches!(err, RaphaelError::InsufficientData { minimum: 34, .. }));
    }

    #[test]
    fn daily_rsi_needs_enough_trading_days() {
        // 120 hourly bars span five days, short of the fifteen a 13-day RSI needs
        let port = MockDataPort::new().with_bars("MSFT", wave_bars(0, 120, 100.0, 0.1, 2.0, 20.0));
        let mut orders = RecordingOrderPort::default();

        let err = run_replay_pipeline(
            &port,
            &settings(),
            &IndicatorPeriods::default(),
            StrategyParameters::default(),
            vec![Instrument::new("MSFT")],
            &mut orders,
        )
        .unwrap_err();
        assert!(matches!(err, RaphaelError::InsufficientData { .. }));
        assert!(orders.submitted.is_empty());
    }

    #[test]
    fn daily_rsi_replay_waits_for_completed_days() {
        // 16 days of hourly bars
        let port = MockDataPort::new().with_bars("MSFT", wave_bars(0, 16 * 24, 100.0, 0.1, 2.0, 20.0));
        let mut orders = RecordingOrderPort::default();

        let result = run_replay_pipeline(
            &port,
            &settings(),
            &IndicatorPeriods::default(),
            StrategyParameters::default(),
            vec![Instrument::new("MSFT")],
            &mut orders,
        )
        .unwrap();
        // the 13-day RSI is defined by the fourteenth close and read from the
        // first bar of the fifteenth day
        assert_eq!(result.warmed_up_at, Some(hour(14 * 24)));
        assert!(orders.submitted.iter().all(|(ts, _)| *ts >= hour(14 * 24)));
    }

    #[test]
    fn order_sink_failure_aborts_replay() {
        let port = MockDataPort::new().with_bars("MSFT", wave_bars(0, 120, 100.0, 0.1, 2.0, 20.0));
        let mut orders = RecordingOrderPort {
            fail_on_submit: true,
            ..Default::default()
        };

        let err = run_replay_pipeline(
            &port,
            &settings(),
            &hourly_periods(),
            StrategyParameters::default(),
            vec![Instrument::new("MSFT")],
            &mut orders,
        )
        .unwrap_err();
        assert!(matches!(err, RaphaelError::OrderSink { .. }));
    }

    #[test]
    fn date_range_limits_the_replay() {
        let port = MockDataPort::new().with_bars("MSFT", wave_bars(0, 120, 100.0, 0.1, 2.0, 20.0));
        let mut orders = RecordingOrderPort::default();
        let mut narrow = settings();
        // hours 0..=47 fall on Jan 1st and 2nd
        narrow.end_date = date(2024, 1, 2);

        let result = run_replay_pipeline(
            &port,
            &narrow,
            &hourly_periods(),
            StrategyParameters::default(),
            vec![Instrument::new("MSFT")],
            &mut orders,
        )
        .unwrap();
        assert_eq!(result.ticks, 48);
        assert_eq!(kinds(&orders), vec![(41, "MSFT".into(), "enter".into())]);
    }
}

mod exit_precedence {
    use super::*;
    use raphael::domain::snapshot::{BarPrices, IndicatorSnapshot, MacdReading};
    use std::collections::HashMap;

    fn snapshot(open: f64, high: f64, close: f64, macd: (f64, f64)) -> IndicatorSnapshot {
        IndicatorSnapshot {
            bar: BarPrices {
                open,
                high,
                low: close.min(open) - 1.0,
                close,
            },
            rsi: Some(60.0),
            macd: Some(MacdReading {
                value: macd.0,
                signal: macd.1,
            }),
            prev_macd: None,
            ema: Some(100.0),
            atr: Some(2.0),
        }
    }

    #[test]
    fn stop_beats_target_on_the_same_bar() {
        let msft = Instrument::new("MSFT");
        let mut controller = StrategyController::new(&[msft.clone()], StrategyParameters::default());

        let tick = |s: IndicatorSnapshot| HashMap::from([(msft.clone(), s)]);
        assert!(controller.on_bar(&tick(snapshot(105.0, 106.0, 105.0, (1.0, 1.2)))).intents.is_empty());

        let entered = controller.on_bar(&tick(snapshot(105.0, 107.0, 106.0, (1.3, 1.1))));
        assert_eq!(entered.intents.len(), 1);

        // stop 102, target 114: wide bar reaching both
        let out = controller.on_bar(&tick(snapshot(106.0, 120.0, 101.0, (1.3, 1.1))));
        assert_eq!(
            out.intents,
            vec![OrderIntent::ExitLiquidate {
                instrument: msft.clone(),
                reason: ExitReason::StopLoss,
            }]
        );
    }
}
