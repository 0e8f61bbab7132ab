use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

/// What a video slide does when it becomes the active slide again.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ReentryPolicy {
    Restart,
    Resume,
}

impl Default for ReentryPolicy {
    fn default() -> Self {
        ReentryPolicy::Restart
    }
}

/// Tunables for the feed engine. Durations are stored in milliseconds so the JSON stays flat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedConfig {
    /// Watch-time thresholds (minutes) at which a break slide is offered.
    pub break_intervals_minutes: Vec<f64>,
    pub load_threshold: usize,
    pub batch_size: usize,
    pub preload_window: usize,
    pub animation_ms: u64,
    /// Delay between a navigation and the break check it schedules.
    pub settle_delay_ms: u64,
    pub swipe_distance_threshold: f32,
    /// Pixels per millisecond.
    pub swipe_velocity_threshold: f32,
    pub swipe_duration_cap_ms: u64,
    pub min_resistance: f32,
    /// Drag distance (px) over which edge resistance decays by a factor of e.
    pub resistance_falloff: f32,
    pub viewport_height: f32,
    pub progress_poll_ms: u64,
    /// Nominal video length assumed when the player cannot report timing.
    pub fallback_duration_ms: u64,
    pub advance_delay_ms: u64,
    pub toggle_debounce_ms: u64,
    pub init_timeout_ms: u64,
    pub rest_duration_ms: u64,
    pub heartbeat_ms: u64,
    pub break_check_every_heartbeats: u32,
    pub wheel_threshold: f32,
    pub reentry_policy: ReentryPolicy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            break_intervals_minutes: vec![15.0, 30.0, 60.0, 120.0],
            load_threshold: 3,
            batch_size: 5,
            preload_window: 2,
            animation_ms: 300,
            settle_delay_ms: 500,
            swipe_distance_threshold: 50.0,
            swipe_velocity_threshold: 0.3,
            swipe_duration_cap_ms: 300,
            min_resistance: 0.3,
            resistance_falloff: 300.0,
            viewport_height: 800.0,
            progress_poll_ms: 100,
            fallback_duration_ms: 30_000,
            advance_delay_ms: 500,
            toggle_debounce_ms: 300,
            init_timeout_ms: 10_000,
            rest_duration_ms: 60_000,
            heartbeat_ms: 1_000,
            break_check_every_heartbeats: 5,
            wheel_threshold: 10.0,
            reentry_policy: ReentryPolicy::Restart,
        }
    }
}

impl FeedConfig {
    /// Normalize the break schedule and reject values the engine cannot run with.
    pub fn validate(&mut self) -> Result<()> {
        if let Some(bad) = self
            .break_intervals_minutes
            .iter()
            .find(|minutes| !minutes.is_finite() || **minutes <= 0.0)
        {
            bail!("break interval must be a positive number of minutes, got {bad}");
        }
        self.break_intervals_minutes.sort_by(f64::total_cmp);
        self.break_intervals_minutes.dedup();

        if self.batch_size == 0 {
            bail!("batch_size must be greater than zero");
        }
        for (name, value) in [
            ("progress_poll_ms", self.progress_poll_ms),
            ("heartbeat_ms", self.heartbeat_ms),
            ("fallback_duration_ms", self.fallback_duration_ms),
            ("init_timeout_ms", self.init_timeout_ms),
            ("rest_duration_ms", self.rest_duration_ms),
        ] {
            if value == 0 {
                bail!("{name} must be greater than zero");
            }
        }
        if self.break_check_every_heartbeats == 0 {
            bail!("break_check_every_heartbeats must be greater than zero");
        }
        if !(self.min_resistance > 0.0 && self.min_resistance <= 1.0) {
            bail!("min_resistance must be in (0, 1], got {}", self.min_resistance);
        }
        if self.resistance_falloff <= 0.0 || self.viewport_height <= 0.0 {
            bail!("resistance_falloff and viewport_height must be positive");
        }
        Ok(())
    }

    pub fn animation(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn swipe_duration_cap(&self) -> Duration {
        Duration::from_millis(self.swipe_duration_cap_ms)
    }

    pub fn progress_poll(&self) -> Duration {
        Duration::from_millis(self.progress_poll_ms)
    }

    pub fn fallback_duration(&self) -> Duration {
        Duration::from_millis(self.fallback_duration_ms)
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn toggle_debounce(&self) -> Duration {
        Duration::from_millis(self.toggle_debounce_ms)
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }

    pub fn rest_duration(&self) -> Duration {
        Duration::from_millis(self.rest_duration_ms)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }
}

/// Feed configuration persisted as pretty JSON.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<FeedConfig>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let mut data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read feed settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring unreadable feed settings at {}: {err}",
                    path.display()
                );
                FeedConfig::default()
            })
        } else {
            FeedConfig::default()
        };
        data.validate()
            .with_context(|| format!("Invalid feed settings in {}", path.display()))?;

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn config(&self) -> FeedConfig {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, mut config: FeedConfig) -> Result<()> {
        config.validate()?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        self.persist(&config)?;
        *guard = config;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read feed settings from {}", self.path.display()))?;
        let mut data: FeedConfig = serde_json::from_str(&contents)?;
        data.validate()?;
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = data;
        Ok(())
    }

    fn persist(&self, data: &FeedConfig) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write feed settings to {}", self.path.display()))
    }
}
