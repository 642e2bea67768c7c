//! Strategy controller: drives the per-instrument Flat/Open state machine once
//! per bar tick.
//!
//! For each instrument, in universe order:
//! - flat: evaluate entry; on a signal open the ledger, then emit `EnterLong`
//! - open: evaluate exit; on a hit close the ledger, then emit `ExitLiquidate`
//! - afterwards remember this bar's MACD reading for the next cross check
//!
//! Nothing is evaluated until every instrument has reported every indicator at
//! least once. Ledger rejections are collected as faults and never stop the
//! remaining instruments from being processed.

use tracing::{debug, error, info, warn};

use super::error::LedgerError;
use super::exit::evaluate_exit;
use super::instrument::Instrument;
use super::ledger::PositionLedger;
use super::order::OrderIntent;
use super::position::PositionState;
use super::signal::{EntryDecision, evaluate_entry};
use super::snapshot::{IndicatorSnapshot, MacdReading};
use super::strategy::StrategyParameters;
use crate::ports::snapshot_port::SnapshotPort;

#[derive(Debug, Clone)]
struct InstrumentTrack {
    instrument: Instrument,
    prev_macd: Option<MacdReading>,
    ready: bool,
}

/// A ledger rejection raised while processing one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentFault {
    pub instrument: Instrument,
    pub error: LedgerError,
}

/// Everything one tick produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub intents: Vec<OrderIntent>,
    pub faults: Vec<InstrumentFault>,
}

#[derive(Debug, Clone)]
pub struct StrategyController {
    params: StrategyParameters,
    ledger: PositionLedger,
    tracks: Vec<InstrumentTrack>,
    warmed_up: bool,
}

impl StrategyController {
    pub fn new(universe: &[Instrument], params: StrategyParameters) -> Self {
        let ledger = PositionLedger::new(universe);
        let tracks = ledger
            .iter()
            .map(|(instrument, _)| InstrumentTrack {
                instrument: instrument.clone(),
                prev_macd: None,
                ready: false,
            })
            .collect();
        StrategyController {
            params,
            ledger,
            tracks,
            warmed_up: false,
        }
    }

    pub fn params(&self) -> &StrategyParameters {
        &self.params
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn universe(&self) -> impl Iterator<Item = &Instrument> {
        self.tracks.iter().map(|t| &t.instrument)
    }

    pub fn is_warmed_up(&self) -> bool {
        self.warmed_up
    }

    /// MACD reading remembered from the last bar processed for `instrument`.
    pub fn previous_macd(&self, instrument: &Instrument) -> Option<MacdReading> {
        self.tracks
            .iter()
            .find(|t| &t.instrument == instrument)
            .and_then(|t| t.prev_macd)
    }

    /// Processes one bar for the whole universe.
    ///
    /// The previous MACD reading is recorded on every bar, warm-up included,
    /// so the first bar after the gate opens can already detect a cross. A
    /// controller that only started tracking once warm could not.
    pub fn on_bar(&mut self, snapshots: &dyn SnapshotPort) -> TickOutcome {
        let current: Vec<Option<IndicatorSnapshot>> = self
            .tracks
            .iter()
            .map(|t| snapshots.snapshot(&t.instrument))
            .collect();

        if !self.warmed_up {
            self.update_readiness(&current);
        }

        let mut outcome = TickOutcome::default();
        for (track, snapshot) in self.tracks.iter_mut().zip(current) {
            let Some(mut snapshot) = snapshot else {
                continue;
            };
            if self.warmed_up {
                snapshot.prev_macd = track.prev_macd;
                Self::process_instrument(
                    &mut self.ledger,
                    &self.params,
                    &track.instrument,
                    &snapshot,
                    &mut outcome,
                );
            }
            track.prev_macd = snapshot.macd;
        }
        outcome
    }

    fn update_readiness(&mut self, current: &[Option<IndicatorSnapshot>]) {
        for (track, snapshot) in self.tracks.iter_mut().zip(current) {
            if snapshot.as_ref().is_some_and(|s| s.indicators_ready()) {
                track.ready = true;
            }
        }
        if self.tracks.iter().all(|t| t.ready) {
            self.warmed_up = true;
            info!(instruments = self.tracks.len(), "warm-up complete, evaluation enabled");
        }
    }

    fn process_instrument(
        ledger: &mut PositionLedger,
        params: &StrategyParameters,
        instrument: &Instrument,
        snapshot: &IndicatorSnapshot,
        outcome: &mut TickOutcome,
    ) {
        let state = match ledger.state(instrument) {
            Some(state) => *state,
            None => {
                record_fault(outcome, LedgerError::UnknownInstrument(instrument.clone()));
                return;
            }
        };

        match state {
            PositionState::Flat => match evaluate_entry(snapshot, params) {
                EntryDecision::EnterLong(signal) => {
                    match ledger.open(
                        instrument,
                        signal.entry_price,
                        signal.stop_loss,
                        signal.take_profit,
                    ) {
                        Ok(()) => {
                            info!(
                                %instrument,
                                entry = signal.entry_price,
                                stop_loss = signal.stop_loss,
                                take_profit = signal.take_profit,
                                fraction = signal.fraction,
                                "entered long"
                            );
                            outcome.intents.push(OrderIntent::EnterLong {
                                instrument: instrument.clone(),
                                fraction: signal.fraction,
                                entry_price: signal.entry_price,
                                stop_loss: signal.stop_loss,
                                take_profit: signal.take_profit,
                            });
                        }
                        Err(e) => record_fault(outcome, e),
                    }
                }
                EntryDecision::NotReady => {
                    debug!(%instrument, "indicators not ready, no entry check");
                }
                EntryDecision::NoSignal => {}
            },
            PositionState::Open(levels) => {
                let Some(reason) = evaluate_exit(&snapshot.bar, &levels) else {
                    return;
                };
                match ledger.close(instrument) {
                    Ok(cleared) => {
                        info!(
                            %instrument,
                            %reason,
                            close = snapshot.bar.close,
                            high = snapshot.bar.high,
                            entry = cleared.entry_price,
                            stop_loss = cleared.stop_loss,
                            take_profit = cleared.take_profit,
                            "position liquidated"
                        );
                        outcome.intents.push(OrderIntent::ExitLiquidate {
                            instrument: instrument.clone(),
                            reason,
                        });
                    }
                    Err(e) => record_fault(outcome, e),
                }
            }
        }
    }
}

fn record_fault(outcome: &mut TickOutcome, err: LedgerError) {
    let instrument = match &err {
        LedgerError::InvalidTransition { instrument, .. }
        | LedgerError::InvalidLevels { instrument, .. }
        | LedgerError::UnknownInstrument(instrument) => instrument.clone(),
    };
    match err {
        LedgerError::InvalidLevels { .. } => warn!(%instrument, error = %err, "entry rejected"),
        _ => error!(%instrument, error = %err, "ledger transition rejected"),
    }
    outcome.faults.push(InstrumentFault {
        instrument,
        error: err,
    });
}
