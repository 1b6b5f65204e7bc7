use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;

use log::debug;
use rodio::{Decoder, OutputStream, Sink};

/// Fire-and-forget playback of a sound cue.
///
/// The session never waits for, joins, or observes a job: a cue that cannot
/// be played is simply absent. Jobs own a copy of their inputs, so rapid
/// phase changes may overlap cues without sharing any state.
pub trait SoundPlayer {
    fn spawn_play(&self, path: &Path, volume: f32);
}

/// Production player streaming through the default rodio output device.
/// Each job runs on its own detached thread because the stream and sink
/// are not `Send`.
#[derive(Debug, Default)]
pub struct RodioPlayer;

impl SoundPlayer for RodioPlayer {
    fn spawn_play(&self, path: &Path, volume: f32) {
        let path: PathBuf = path.to_path_buf();
        thread::spawn(move || {
            if let Err(err) = play_once(&path, volume) {
                debug!("sound job for {} failed: {err}", path.display());
            }
        });
    }
}

fn play_once(path: &Path, volume: f32) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let source = Decoder::new(BufReader::new(file))?;
    let (_stream, handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&handle)?;
    sink.set_volume(volume);
    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}
