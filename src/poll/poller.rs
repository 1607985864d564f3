//! Single-flow probe scheduler
//!
//! Ticks, reloads and shutdown are all handled from one task, so a cycle
//! is never interleaved with another cycle or with a reload. A reload
//! notification arriving while a cycle is in flight stays pending on the
//! watch channel and is applied once that cycle has dispatched. Shutdown
//! is still honored mid-cycle: the in-flight probe is abandoned.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::events::DaemonEvent;
use crate::indicator::IndicatorRegistry;
use crate::preferences::{ConfigGateway, Preferences};
use crate::probe::{ProbeError, ProbeResult, ScriptTemplate, StateNormalizer, StatusProbe};
use crate::state::{Debouncer, MuteState};

/// How a cycle ended
enum Cycle {
    /// The probe answered; carries the dispatched state, if any
    Completed(Option<MuteState>),
    /// Shutdown was requested while the probe was still running
    Abandoned,
}

/// Owns the engine state: debounced mute state, rendered script and
/// installed indicators
pub struct PollLoop {
    gateway: Arc<dyn ConfigGateway>,
    changes: watch::Receiver<u64>,
    probe: Arc<dyn StatusProbe>,
    template: ScriptTemplate,
    normalizer: StateNormalizer,
    debouncer: Debouncer,
    registry: IndicatorRegistry,
    /// Label the cached script was rendered with
    label_text: String,
    script: Arc<str>,
    interval: Duration,
    event_tx: broadcast::Sender<DaemonEvent>,
}

impl PollLoop {
    /// Build the loop and apply the gateway's current configuration
    pub fn new(
        gateway: Arc<dyn ConfigGateway>,
        probe: Arc<dyn StatusProbe>,
        template: ScriptTemplate,
        registry: IndicatorRegistry,
        interval: Duration,
        event_tx: broadcast::Sender<DaemonEvent>,
    ) -> Self {
        // Subscribe before the first pull so no change can slip between them
        let changes = gateway.subscribe();
        let prefs = gateway.current_config();

        let mut poll_loop = Self {
            gateway,
            changes,
            probe,
            normalizer: StateNormalizer::default(),
            debouncer: Debouncer::new(),
            registry,
            label_text: String::new(),
            script: Arc::from(template.render("")),
            template,
            interval,
            event_tx,
        };
        poll_loop.apply(prefs);
        poll_loop
    }

    /// Pull the configuration off the runtime threads, then apply it
    pub async fn reload(&mut self) {
        let gateway = Arc::clone(&self.gateway);
        match tokio::task::spawn_blocking(move || gateway.current_config()).await {
            Ok(prefs) => self.apply(prefs),
            Err(e) => error!(%e, "preferences read did not complete, keeping current ones"),
        }
    }

    /// Apply a configuration in one step: indicator set, rendered script
    /// and match strategy change together, and the mute state goes back
    /// to `Unknown`.
    fn apply(&mut self, prefs: Preferences) {
        self.registry.rebuild(&prefs.enabled_indicators);

        if prefs.label_text != self.label_text {
            debug!(label = %prefs.label_text, "rendering probe script");
            self.script = Arc::from(self.template.render(&prefs.label_text));
            self.label_text = prefs.label_text;
        }

        self.normalizer = StateNormalizer::new(prefs.match_strategy);
        self.debouncer.reset();

        info!(
            label = %self.label_text,
            indicators = ?self.registry.kinds(),
            strategy = ?self.normalizer.strategy(),
            "preferences applied"
        );
        let _ = self.event_tx.send(DaemonEvent::PreferencesReloaded {
            label_text: self.label_text.clone(),
        });
    }

    /// Run one probe-and-dispatch cycle. Returns the dispatched state,
    /// or `None` when the reading was redundant.
    pub async fn tick(&mut self) -> Option<MuteState> {
        match self.cycle(&mut std::future::pending()).await {
            Cycle::Completed(state) => state,
            Cycle::Abandoned => None,
        }
    }

    /// Probe, normalize and dispatch, unless `shutdown` resolves first.
    /// A probe that outlives the interval is reported every interval
    /// until it returns.
    async fn cycle<S>(&mut self, shutdown: &mut S) -> Cycle
    where
        S: Future<Output = ()> + Unpin,
    {
        let started = Instant::now();
        let mut handle = spawn_probe(Arc::clone(&self.probe), Arc::clone(&self.script));
        let mut stalled = tokio::time::interval_at(started + self.interval, self.interval);

        let joined = loop {
            tokio::select! {
                biased;

                _ = &mut *shutdown => {
                    // Dropping the handle detaches the blocking task
                    warn!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "shutdown requested, abandoning running probe"
                    );
                    return Cycle::Abandoned;
                }

                joined = &mut handle => break joined,

                _ = stalled.tick() => {
                    warn!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "probe still running"
                    );
                }
            }
        };

        Cycle::Completed(self.finish(joined, started.elapsed()))
    }

    fn finish(
        &mut self,
        joined: Result<ProbeResult, JoinError>,
        elapsed: Duration,
    ) -> Option<MuteState> {
        let result = match joined {
            Ok(result) => result,
            Err(e) => {
                error!(%e, "probe task did not complete");
                ProbeResult::Failure(ProbeError::Aborted(e.to_string()))
            }
        };

        if elapsed > self.interval {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                interval_ms = self.interval.as_millis() as u64,
                "probe overran the poll interval, ticks were skipped"
            );
        }

        if let ProbeResult::Failure(e) = &result {
            warn!(%e, "probe failed, treating as muted");
        }

        let unmuted = self.normalizer.normalize(&result);
        let state = self.debouncer.observe(unmuted)?;

        self.registry.dispatch(unmuted);
        let _ = self.event_tx.send(DaemonEvent::MuteStateChanged { state });
        Some(state)
    }

    /// Poll until `shutdown` resolves, then tear every indicator down
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut gateway_open = true;
        tokio::pin!(shutdown);

        info!(interval_ms = self.interval.as_millis() as u64, "poll loop started");

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,

                changed = self.changes.changed(), if gateway_open => match changed {
                    Ok(()) => {
                        let generation = *self.changes.borrow_and_update();
                        debug!(generation, "preferences changed");
                        self.reload().await;
                    }
                    Err(_) => {
                        warn!("preferences gateway closed, reloads disabled");
                        gateway_open = false;
                    }
                },

                _ = ticker.tick() => {
                    if let Cycle::Abandoned = self.cycle(&mut shutdown).await {
                        break;
                    }
                }
            }
        }

        self.shutdown();
    }

    /// Tear down every installed indicator
    pub fn shutdown(&mut self) {
        info!("poll loop stopping");
        self.registry.teardown_all();
    }
}

/// The probe blocks, so it runs on the blocking pool
fn spawn_probe(probe: Arc<dyn StatusProbe>, script: Arc<str>) -> JoinHandle<ProbeResult> {
    tokio::task::spawn_blocking(move || probe.invoke(&script))
}
