//! Simulation controller - periodic tick driver with start/stop/reset
//!
//! State machine:
//!
//! ```text
//!   Stopped --start--> Running --stop/reset--> Stopped
//!      ^                  |
//!      +------reset-------+   (reset also empties the window)
//! ```
//!
//! Every arm/disarm bumps a generation counter while holding the session lock.
//! A tick carries the generation of the timer that fired it and is discarded
//! if the counter has moved on, so a late tick can never append to a window
//! that was just reset.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use miette::Diagnostic;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};
use ulid::Ulid;

use crate::core::{MeasurementRecord, SettingsError, SimulationSettings, WindowStats};
use crate::sim::clock::{Clock, RuntimeClock};
use crate::sim::session::Session;

/// Capacity of the record broadcast channel
const RECORD_CHANNEL_CAPACITY: usize = 1024;

/// Errors constructing or reconfiguring a controller
#[derive(Debug, Error, Diagnostic)]
pub enum ControllerError {
    #[error("The simulation controller must be created inside a Tokio runtime")]
    #[diagnostic(code(qcsim::controller::no_runtime))]
    NoRuntime,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Settings(#[from] SettingsError),
}

/// State shared between the controller and its timer task
struct Shared {
    session: Mutex<Session>,
    generation: AtomicU64,
    clock: Arc<dyn Clock>,
    records: broadcast::Sender<MeasurementRecord>,
}

impl Shared {
    /// Run one tick for `generation`; `None` means the timer was superseded
    fn tick(&self, generation: u64) -> Option<MeasurementRecord> {
        let mut session = self.session.lock();
        let current = self.generation.load(Ordering::SeqCst);
        if current != generation {
            debug!(generation, current, "discarding stale tick");
            return None;
        }

        let record = session.tick(self.clock.now());
        drop(session);

        trace!(
            id = record.id,
            measured_x = record.measured_x,
            p_in_spec = record.p_in_spec,
            flagged = record.flagged,
            "tick"
        );
        // No subscribers is not an error
        let _ = self.records.send(record.clone());
        Some(record)
    }
}

/// Builder for [`SimulationController`]
pub struct ControllerBuilder {
    settings: SimulationSettings,
    seed: Option<u64>,
    clock: Option<Arc<dyn Clock>>,
    runtime: Option<Handle>,
}

impl ControllerBuilder {
    /// Use a fixed random seed for reproducible runs
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Override the timestamp source
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Spawn timers on a specific runtime instead of the current one
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Validate the settings and create a stopped controller
    ///
    /// If the settings ask for `is_running`, the controller starts right away.
    pub fn build(self) -> Result<SimulationController, ControllerError> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| ControllerError::NoRuntime)?,
        };

        let auto_start = self.settings.is_running;
        let mut settings = self.settings;
        settings.is_running = false;

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let session = Session::with_rng(settings, rng)?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(RuntimeClock::new()) as Arc<dyn Clock>);
        let (records, _) = broadcast::channel(RECORD_CHANNEL_CAPACITY);

        let controller = SimulationController {
            shared: Arc::new(Shared {
                session: Mutex::new(session),
                generation: AtomicU64::new(0),
                clock,
                records,
            }),
            runtime,
            timer: Mutex::new(None),
        };

        if auto_start {
            controller.start();
        }
        Ok(controller)
    }
}

/// Owner of the simulation session and the single active tick timer
pub struct SimulationController {
    shared: Arc<Shared>,
    runtime: Handle,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl SimulationController {
    /// Create a stopped controller on the current Tokio runtime
    pub fn new(settings: SimulationSettings) -> Result<Self, ControllerError> {
        Self::builder(settings).build()
    }

    pub fn builder(settings: SimulationSettings) -> ControllerBuilder {
        ControllerBuilder {
            settings,
            seed: None,
            clock: None,
            runtime: None,
        }
    }

    /// Start ticking; re-arms the timer if already running
    pub fn start(&self) {
        let mut session = self.shared.session.lock();
        self.arm(&mut session);
    }

    /// Stop ticking; the window is preserved
    pub fn stop(&self) {
        let mut session = self.shared.session.lock();
        self.disarm(&mut session);
        info!(records = session.window().len(), "simulation stopped");
    }

    /// Stop ticking and clear the window
    pub fn reset(&self) {
        let mut session = self.shared.session.lock();
        self.disarm(&mut session);
        session.reset();
        info!(session = %session.id(), "simulation reset");
    }

    /// Replace the settings between ticks
    ///
    /// Invalid settings are rejected and the current ones stay in effect.
    /// Toggling `is_running` starts or stops the clock; changing `interval`
    /// while running re-arms the timer.
    pub fn update_settings(&self, settings: SimulationSettings) -> Result<(), SettingsError> {
        let mut session = self.shared.session.lock();
        let previous = match session.replace_settings(settings) {
            Ok(previous) => previous,
            Err(e) => {
                warn!(error = %e, "rejected settings update");
                return Err(e);
            }
        };

        let current = session.settings();
        match (previous.is_running, current.is_running) {
            (false, true) => self.arm(&mut session),
            (true, false) => self.disarm(&mut session),
            (true, true) if previous.interval != current.interval => {
                debug!(
                    from = previous.interval,
                    to = current.interval,
                    "tick interval changed"
                );
                self.arm(&mut session);
            }
            _ => {}
        }
        Ok(())
    }

    /// Current settings
    pub fn settings(&self) -> SimulationSettings {
        self.shared.session.lock().settings().clone()
    }

    pub fn is_running(&self) -> bool {
        self.shared.session.lock().settings().is_running
    }

    /// Owned, ordered copy of the window
    pub fn snapshot(&self) -> Vec<MeasurementRecord> {
        self.shared.session.lock().snapshot()
    }

    /// Aggregates over the current window
    pub fn stats(&self) -> WindowStats {
        self.shared.session.lock().stats()
    }

    /// Identifier of the current id sequence (changes on reset)
    pub fn session_id(&self) -> Ulid {
        self.shared.session.lock().id()
    }

    /// Stream of records as they are produced
    pub fn subscribe(&self) -> broadcast::Receiver<MeasurementRecord> {
        self.shared.records.subscribe()
    }

    /// Current timer generation
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Invalidate the running timer (if any) and spawn a new one
    fn arm(&self, session: &mut Session) {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        session.set_running(true);

        let period = session.settings().tick_period();
        let first = Instant::now() + period;
        let shared = Arc::clone(&self.shared);

        let task = self.runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if shared.tick(generation).is_none() {
                    break;
                }
            }
        });

        if let Some(old) = self.timer.lock().replace(task) {
            old.abort();
        }
        info!(
            generation,
            interval_ms = period.as_millis() as u64,
            "simulation started"
        );
    }

    /// Invalidate and cancel the running timer (if any)
    fn disarm(&self, session: &mut Session) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        session.set_running(false);
        if let Some(task) = self.timer.lock().take() {
            task.abort();
        }
    }

    #[cfg(test)]
    fn tick_for(&self, generation: u64) -> Option<MeasurementRecord> {
        self.shared.tick(generation)
    }
}

impl Drop for SimulationController {
    fn drop(&mut self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.timer.get_mut().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast_settings() -> SimulationSettings {
        SimulationSettings {
            interval: 100,
            time_window: 60.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_build_outside_runtime_fails() {
        let result = SimulationController::new(SimulationSettings::default());
        assert!(matches!(result, Err(ControllerError::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_rejects_invalid_settings() {
        let settings = SimulationSettings {
            measurement_std: 0.0,
            ..Default::default()
        };
        let result = SimulationController::new(settings);
        assert!(matches!(result, Err(ControllerError::Settings(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_generation_tick_is_discarded() {
        let controller = SimulationController::builder(fast_settings())
            .seed(1)
            .build()
            .unwrap();
        controller.start();
        let armed = controller.generation();

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(controller.snapshot().len(), 3);

        controller.reset();
        // A tick that was already scheduled by the old timer arrives late
        assert!(controller.tick_for(armed).is_none());
        assert!(controller.snapshot().is_empty());

        // The current generation is still accepted
        assert!(controller.tick_for(controller.generation()).is_some());
        assert_eq!(controller.snapshot().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_start_from_settings() {
        let settings = SimulationSettings {
            is_running: true,
            ..fast_settings()
        };
        let controller = SimulationController::builder(settings)
            .seed(2)
            .build()
            .unwrap();
        assert!(controller.is_running());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(controller.snapshot().len(), 2);
    }
}
