use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::AudioError;
use crate::sequencer::{Instrument, Pitch};

/// Decoded audio, interleaved f32
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub sample_rate: u32,
    pub channels: u16,
    pub data: Vec<f32>,
}

impl Sample {
    pub fn new(sample_rate: u32, channels: u16, data: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels: channels.max(1),
            data,
        }
    }

    pub fn frames(&self) -> usize {
        self.data.len() / usize::from(self.channels)
    }

    pub fn value(&self, frame: usize, channel: usize) -> f32 {
        self.data[frame * usize::from(self.channels) + channel]
    }
}

/// Decode a whole audio file into memory
pub fn load_sample(path: &Path) -> Result<Sample, AudioError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::NoTrack(path.display().to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder =
        symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let mut sample_rate = codec_params.sample_rate.unwrap_or(44_100);
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(1) as u16;
    let mut data = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(err) => return Err(err.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                data.extend_from_slice(buffer.samples());
            }
            // A corrupt frame is skipped, the rest of the file still plays
            Err(SymphoniaError::DecodeError(err)) => debug!("skipping bad frame: {}", err),
            Err(err) => return Err(err.into()),
        }
    }

    Ok(Sample::new(sample_rate, channels, data))
}

/// Samples laid out as `{root}/{instrument}/{pitch}.{extension}`, decoded on first use
#[derive(Debug, Clone)]
pub struct SampleLibrary {
    root: PathBuf,
    extension: String,
    cache: HashMap<(Instrument, Pitch), Arc<Sample>>,
}

impl SampleLibrary {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            cache: HashMap::new(),
        }
    }

    pub fn path_for(&self, instrument: &Instrument, pitch: Pitch) -> PathBuf {
        self.root
            .join(instrument.id())
            .join(format!("{}.{}", pitch.label(), self.extension))
    }

    pub fn insert(&mut self, instrument: &Instrument, pitch: Pitch, sample: Arc<Sample>) {
        self.cache.insert((instrument.clone(), pitch), sample);
    }

    /// Failed loads are not cached, so a file dropped in later is picked up
    pub fn get(
        &mut self,
        instrument: &Instrument,
        pitch: Pitch,
    ) -> Result<Arc<Sample>, AudioError> {
        if let Some(sample) = self.cache.get(&(instrument.clone(), pitch)) {
            return Ok(Arc::clone(sample));
        }

        let path = self.path_for(instrument, pitch);
        let sample = Arc::new(load_sample(&path)?);
        debug!(
            "loaded {} ({} frames at {} Hz)",
            path.display(),
            sample.frames(),
            sample.sample_rate
        );
        self.insert(instrument, pitch, Arc::clone(&sample));
        Ok(sample)
    }
}
