//! Set of installed indicators and state fan-out

use std::collections::{BTreeMap, BTreeSet};

use tokio::sync::broadcast;
use tracing::{debug, error, info};

use super::{Indicator, IndicatorFactory, IndicatorKind};
use crate::events::DaemonEvent;

/// Owns every installed indicator, at most one per kind
pub struct IndicatorRegistry {
    factory: Box<dyn IndicatorFactory>,
    indicators: BTreeMap<IndicatorKind, Box<dyn Indicator>>,
    event_tx: broadcast::Sender<DaemonEvent>,
}

impl IndicatorRegistry {
    pub fn new(factory: Box<dyn IndicatorFactory>, event_tx: broadcast::Sender<DaemonEvent>) -> Self {
        Self {
            factory,
            indicators: BTreeMap::new(),
            event_tx,
        }
    }

    /// Kinds currently installed
    pub fn kinds(&self) -> BTreeSet<IndicatorKind> {
        self.indicators.keys().copied().collect()
    }

    /// Converge on `enabled`: remove kinds no longer enabled, create the
    /// missing ones, and leave indicators that stay enabled untouched.
    pub fn rebuild(&mut self, enabled: &BTreeSet<IndicatorKind>) {
        let stale: Vec<IndicatorKind> = self
            .indicators
            .keys()
            .filter(|kind| !enabled.contains(kind))
            .copied()
            .collect();

        for kind in stale {
            if let Some(indicator) = self.indicators.remove(&kind) {
                self.teardown_one(kind, indicator);
            }
        }

        for &kind in enabled {
            if self.indicators.contains_key(&kind) {
                continue;
            }
            match self.factory.create(kind) {
                Ok(indicator) => {
                    info!(%kind, "indicator installed");
                    self.indicators.insert(kind, indicator);
                    let _ = self.event_tx.send(DaemonEvent::IndicatorAdded { kind });
                }
                Err(e) => {
                    error!(%kind, %e, "failed to create indicator, skipping");
                }
            }
        }
    }

    /// Push the state to every indicator. A failing indicator is logged
    /// and does not stop the others.
    pub fn dispatch(&mut self, unmuted: bool) {
        debug!(unmuted, count = self.indicators.len(), "dispatching to indicators");

        for (kind, indicator) in self.indicators.iter_mut() {
            let result = if unmuted {
                indicator.mark_unmuted()
            } else {
                indicator.mark_muted()
            };
            if let Err(e) = result {
                error!(%kind, %e, "indicator update failed");
            }
        }
    }

    /// Remove and tear down every indicator
    pub fn teardown_all(&mut self) {
        for (kind, indicator) in std::mem::take(&mut self.indicators) {
            self.teardown_one(kind, indicator);
        }
    }

    fn teardown_one(&self, kind: IndicatorKind, mut indicator: Box<dyn Indicator>) {
        if let Err(e) = indicator.teardown() {
            error!(%kind, %e, "indicator teardown failed");
        }
        info!(%kind, "indicator removed");
        let _ = self.event_tx.send(DaemonEvent::IndicatorRemoved { kind });
    }
}

impl Drop for IndicatorRegistry {
    fn drop(&mut self) {
        self.teardown_all();
    }
}
