//! Simulation session - settings, window, random source and id sequence
//!
//! A session is the synchronous heart of the simulator: one [`Session::tick`]
//! generates a record with the current settings, appends it to the window and
//! prunes. The controller drives a session from a timer; offline batches drive
//! it directly.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ulid::Ulid;

use crate::core::{
    MeasurementGenerator, MeasurementRecord, SettingsError, SimulationSettings, SlidingWindow,
    WindowStats,
};

/// Owner of all mutable simulation state
#[derive(Debug)]
pub struct Session {
    id: Ulid,
    settings: SimulationSettings,
    window: SlidingWindow,
    rng: StdRng,
    next_id: u64,
    generator: MeasurementGenerator,
}

impl Session {
    /// Create a session seeded from the operating system
    pub fn new(settings: SimulationSettings) -> Result<Self, SettingsError> {
        Self::with_rng(settings, StdRng::from_os_rng())
    }

    /// Create a reproducible session
    pub fn seeded(settings: SimulationSettings, seed: u64) -> Result<Self, SettingsError> {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    /// Create a session with an explicit random source
    pub fn with_rng(settings: SimulationSettings, rng: StdRng) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            id: Ulid::new(),
            settings,
            window: SlidingWindow::new(),
            rng,
            next_id: 1,
            generator: MeasurementGenerator,
        })
    }

    /// Generate one record at `now`, append it and prune the window
    pub fn tick(&mut self, now: DateTime<Utc>) -> MeasurementRecord {
        let id = self.next_id;
        self.next_id += 1;

        let record = self
            .generator
            .generate(&self.settings, &mut self.rng, id, now);
        self.window
            .append(record.clone(), now, self.settings.retention());
        record
    }

    /// Clear the window, restart ids and stop
    ///
    /// Settings other than `is_running` are left untouched. A fresh session
    /// id distinguishes the new id sequence from the previous one.
    pub fn reset(&mut self) {
        self.window.reset();
        self.next_id = 1;
        self.settings.is_running = false;
        self.id = Ulid::new();
    }

    /// Replace the settings, returning the previous ones
    ///
    /// Invalid settings are rejected and the current ones stay in effect.
    pub fn replace_settings(
        &mut self,
        settings: SimulationSettings,
    ) -> Result<SimulationSettings, SettingsError> {
        settings.validate()?;
        Ok(std::mem::replace(&mut self.settings, settings))
    }

    pub fn set_running(&mut self, running: bool) {
        self.settings.is_running = running;
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    /// Identifier of the current id sequence (changes on reset)
    pub fn id(&self) -> Ulid {
        self.id
    }

    pub fn snapshot(&self) -> Vec<MeasurementRecord> {
        self.window.snapshot()
    }

    pub fn stats(&self) -> WindowStats {
        WindowStats::from_records(self.window.iter())
    }
}
