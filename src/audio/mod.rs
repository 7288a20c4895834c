/// Audio output using cpal
/// A single voice plays at a time; starting a sample cuts off whatever was sounding
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{info, warn};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::sequencer::{Instrument, Pitch};

pub mod sample;

pub use sample::{load_sample, Sample, SampleLibrary};

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("No playable track in {0}")]
    NoTrack(String),

    #[error("No audio output device available")]
    NoDevice,

    #[error("Output config error: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("Unsupported sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("Failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// Something that can sound a note. Playback is fire-and-forget: failures are
/// handled inside the player and never reach the caller.
pub trait SamplePlayer {
    fn play(&mut self, instrument: &Instrument, pitch: Pitch);

    /// Cut off whatever is sounding
    fn stop(&mut self);

    /// The current note's beat is over. One-shot samples ring out, so this does
    /// nothing unless the player holds notes (MIDI).
    fn release(&mut self) {}
}

impl<P: SamplePlayer + ?Sized> SamplePlayer for Box<P> {
    fn play(&mut self, instrument: &Instrument, pitch: Pitch) {
        (**self).play(instrument, pitch);
    }

    fn stop(&mut self) {
        (**self).stop();
    }

    fn release(&mut self) {
        (**self).release();
    }
}

/// Fan out to two players, e.g. the speakers and a MIDI port
impl<A: SamplePlayer, B: SamplePlayer> SamplePlayer for (A, B) {
    fn play(&mut self, instrument: &Instrument, pitch: Pitch) {
        self.0.play(instrument, pitch);
        self.1.play(instrument, pitch);
    }

    fn stop(&mut self) {
        self.0.stop();
        self.1.stop();
    }

    fn release(&mut self) {
        self.0.release();
        self.1.release();
    }
}

/// The one sample currently sounding, with its read position in sample frames
#[derive(Debug, Default)]
pub struct Voice {
    sample: Option<Arc<Sample>>,
    position: f64,
}

impl Voice {
    pub fn start(&mut self, sample: Arc<Sample>) {
        self.sample = Some(sample);
        self.position = 0.0;
    }

    pub fn stop(&mut self) {
        self.sample = None;
        self.position = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.sample.is_some()
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Fill an interleaved buffer, resampling linearly to `output_rate`
    pub fn render(&mut self, out: &mut [f32], channels: usize, output_rate: u32) {
        let Some(sample) = &self.sample else {
            out.fill(0.0);
            return;
        };

        let frames = sample.frames();
        let step = f64::from(sample.sample_rate) / f64::from(output_rate);
        let last_channel = usize::from(sample.channels).saturating_sub(1);

        for frame in out.chunks_mut(channels.max(1)) {
            let index = self.position as usize;
            if index >= frames {
                frame.fill(0.0);
                continue;
            }

            let frac = (self.position - index as f64) as f32;
            for (channel, out_sample) in frame.iter_mut().enumerate() {
                let source_channel = channel.min(last_channel);
                let a = sample.value(index, source_channel);
                let b = if index + 1 < frames {
                    sample.value(index + 1, source_channel)
                } else {
                    a
                };
                *out_sample = a + (b - a) * frac;
            }
            self.position += step;
        }

        if self.position as usize >= frames {
            self.stop();
        }
    }
}

pub struct AudioOutput {
    stream: Option<cpal::Stream>,
    voice: Arc<Mutex<Voice>>,
    library: SampleLibrary,
}

impl AudioOutput {
    /// Open the default output device. Falls back to a silent output when none works.
    pub fn new(library: SampleLibrary) -> Self {
        let voice = Arc::new(Mutex::new(Voice::default()));

        let stream = match Self::setup_audio_stream(Arc::clone(&voice)) {
            Ok(stream) => Some(stream),
            Err(err) => {
                warn!("audio output unavailable, running silent: {}", err);
                None
            }
        };

        Self {
            stream,
            voice,
            library,
        }
    }

    /// Output with no device attached; samples are still resolved and tracked
    pub fn silent(library: SampleLibrary) -> Self {
        Self {
            stream: None,
            voice: Arc::new(Mutex::new(Voice::default())),
            library,
        }
    }

    pub fn has_device(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_sounding(&self) -> bool {
        self.voice.lock().map(|v| v.is_active()).unwrap_or(false)
    }

    fn setup_audio_stream(voice: Arc<Mutex<Voice>>) -> Result<cpal::Stream, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let config = device.default_output_config()?;

        let sample_rate = config.sample_rate().0;
        let channels = usize::from(config.channels());

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| match voice.lock() {
                    Ok(mut voice) => voice.render(data, channels, sample_rate),
                    Err(_) => data.fill(0.0),
                },
                |err| warn!("audio stream error: {}", err),
                None,
            )?,
            format => return Err(AudioError::UnsupportedFormat(format)),
        };

        stream.play()?;
        info!("audio output running at {} Hz, {} channels", sample_rate, channels);
        Ok(stream)
    }
}

impl SamplePlayer for AudioOutput {
    fn play(&mut self, instrument: &Instrument, pitch: Pitch) {
        self.stop();

        match self.library.get(instrument, pitch) {
            Ok(sample) => {
                if let Ok(mut voice) = self.voice.lock() {
                    voice.start(sample);
                }
            }
            Err(err) => warn!("could not play {}/{}: {}", instrument, pitch, err),
        }
    }

    fn stop(&mut self) {
        if let Ok(mut voice) = self.voice.lock() {
            voice.stop();
        }
    }
}
