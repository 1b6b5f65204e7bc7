use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::tty::IsTty;
use std::{error::Error, io::stdin, path::PathBuf, process};

use tbreak::{
    config::{Config, ConfigStore, FileConfigStore},
    runtime::CrosstermEventSource,
    session::Orchestrator,
    sound::RodioPlayer,
    ui::TerminalScreen,
};

/// periodic screen-break reminder for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Waits quietly between breaks, warns you ahead of time, then takes over the terminal with a countdown overlay until the break is done. Snooze, skip, or quit at any point."
)]
pub struct Cli {
    /// path to an alternate config file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// seconds of idle time between breaks
    #[clap(short = 't', long)]
    timer_duration: Option<f64>,

    /// seconds a break lasts
    #[clap(short = 'b', long)]
    break_duration: Option<f64>,

    /// seconds of warning lead time before a break
    #[clap(short = 'w', long)]
    warning_duration: Option<f64>,

    /// seconds a snoozed warning stays away
    #[clap(short = 's', long)]
    snooze_duration: Option<f64>,

    /// redraw rate of the countdown overlays
    #[clap(long)]
    fps: Option<u32>,

    /// playback volume for sound cues, 0.0 to 1.0
    #[clap(long)]
    volume: Option<f32>,

    /// run a single break cycle and exit
    #[clap(long)]
    once: bool,

    /// skip the warning overlay and start breaks directly
    #[clap(long)]
    no_warning: bool,

    /// skip the end screen after a break
    #[clap(long)]
    no_end: bool,

    /// disable sound cues
    #[clap(long)]
    no_sound: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(secs) = self.timer_duration {
            config.timer_duration = secs;
        }
        if let Some(secs) = self.break_duration {
            config.break_duration = secs;
        }
        if let Some(secs) = self.warning_duration {
            config.warning_duration = secs;
        }
        if let Some(secs) = self.snooze_duration {
            config.snooze_duration = secs;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(volume) = self.volume {
            config.volume = volume;
        }
        if self.once {
            config.repeat = false;
        }
        if self.no_warning {
            config.warning_enabled = false;
        }
        if self.no_end {
            config.end_enabled = false;
        }
        if self.no_sound {
            config.sound_enabled = false;
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(err) = run(cli) {
        eprintln!("tbreak: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let mut config = store.load();
    cli.apply(&mut config);
    config.normalize();

    let events = CrosstermEventSource::new();
    let sounds = RodioPlayer;
    let mut screen = TerminalScreen::new();

    // A fatal collaborator error propagates here; TerminalScreen's Drop
    // still puts the terminal back before main reports it.
    let mut orchestrator = Orchestrator::new(config, &mut screen, &events, &sounds);
    orchestrator.run()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_override_nothing() {
        let cli = Cli::parse_from(["tbreak"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn cli_duration_overrides() {
        let cli = Cli::parse_from([
            "tbreak", "-t", "900", "-b", "90", "-w", "10", "-s", "120",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.timer_duration, 900.0);
        assert_eq!(config.break_duration, 90.0);
        assert_eq!(config.warning_duration, 10.0);
        assert_eq!(config.snooze_duration, 120.0);
    }

    #[test]
    fn cli_flag_overrides() {
        let cli = Cli::parse_from([
            "tbreak",
            "--once",
            "--no-warning",
            "--no-end",
            "--no-sound",
            "--fps",
            "60",
            "--volume",
            "0.3",
        ]);
        let mut config = Config {
            sound_enabled: true,
            ..Config::default()
        };
        cli.apply(&mut config);

        assert!(!config.repeat);
        assert!(!config.warning_enabled);
        assert!(!config.end_enabled);
        assert!(!config.sound_enabled);
        assert_eq!(config.fps, 60);
        assert_eq!(config.volume, 0.3);
    }

    #[test]
    fn cli_negative_duration_is_normalized_not_rejected() {
        let cli = Cli::parse_from(["tbreak", "--timer-duration=-5"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        config.normalize();
        assert_eq!(config.timer_duration, 0.0);
    }

    #[test]
    fn cli_config_path() {
        let cli = Cli::parse_from(["tbreak", "-c", "/tmp/other.json"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/other.json")));
    }
}
