use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_FPS: u32 = 30;

/// Session configuration. Loaded once before the session starts and treated
/// as read-only by the orchestrator. Out-of-range values are repaired by
/// [`Config::normalize`] rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub message: String,
    pub warning: String,
    pub warning_hint: String,
    pub end_title: String,
    pub end_message: String,

    /// Idle time between breaks, in seconds.
    pub timer_duration: f64,
    /// Length of the break overlay, in seconds.
    pub break_duration: f64,
    /// Lead time of the warning overlay, in seconds.
    pub warning_duration: f64,
    /// Pause after a snoozed warning, in seconds.
    pub snooze_duration: f64,

    pub warning_enabled: bool,
    pub skip_enabled: bool,
    pub snooze_enabled: bool,
    pub stop_enabled: bool,
    pub end_enabled: bool,
    pub hints_enabled: bool,
    pub time_enabled: bool,
    pub sound_enabled: bool,
    pub block_input: bool,
    pub repeat: bool,

    pub fps: u32,
    pub start_sound_path: Option<PathBuf>,
    pub end_sound_path: Option<PathBuf>,
    pub volume: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "Take a break!".to_string(),
            message: "Rest your eyes. Stretch your legs. Breathe. Relax.".to_string(),
            warning: "Break coming up...".to_string(),
            warning_hint: "enter: break now   s: snooze   x: skip   q: quit".to_string(),
            end_title: "Break has ended!".to_string(),
            end_message: "Press any key to continue...".to_string(),
            timer_duration: 20.0 * 60.0,
            break_duration: 60.0,
            warning_duration: 15.0,
            snooze_duration: 5.0 * 60.0,
            warning_enabled: true,
            skip_enabled: true,
            snooze_enabled: true,
            stop_enabled: true,
            end_enabled: true,
            hints_enabled: true,
            time_enabled: true,
            sound_enabled: false,
            block_input: false,
            repeat: true,
            fps: DEFAULT_FPS,
            start_sound_path: None,
            end_sound_path: None,
            volume: 1.0,
        }
    }
}

impl Config {
    /// Clamp anomalous values into their documented ranges. Negative
    /// durations become zero-length phases (immediately elapsed), a zero
    /// fps falls back to the default, volume is clamped into [0, 1].
    pub fn normalize(&mut self) {
        self.timer_duration = self.timer_duration.max(0.0);
        self.break_duration = self.break_duration.max(0.0);
        self.warning_duration = self.warning_duration.max(0.0);
        self.snooze_duration = self.snooze_duration.max(0.0);
        if self.fps == 0 {
            self.fps = DEFAULT_FPS;
        }
        self.volume = self.volume.clamp(0.0, 1.0);
    }

    /// One frame at the configured rate. Call [`Config::normalize`] first.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "tbreak") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("tbreak_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
