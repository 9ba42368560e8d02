//! Looping sound effects.
//!
//! ```text
//!   soundeffects/*.wav ──hound──▶ mono f32 @ device rate ──▶ Mixer
//!                                                             │
//!   SoundPort::start/stop ──▶ Arc<Mutex<Mixer>> ◀── cpal output callback
//! ```
//!
//! All three clips are decoded once at startup. The [`Mixer`] sums every
//! playing voice into each output frame and wraps voices back to the start
//! when they run out, so an effect loops until stopped. The cpal stream is
//! owned by a dedicated `audio-out` thread because `cpal::Stream` is not
//! `Send` on every host.

use std::path::Path;
use std::process::Command;
use std::sync::{Arc, Mutex, PoisonError};

use log::info;

use crate::app::ports::{Effect, SoundPort};
use crate::error::AudioError;

// ── Decoding ───────────────────────────────────────────────────

fn asset_error(path: &Path, reason: impl ToString) -> AudioError {
    AudioError::Asset {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Load a WAV file as mono f32 samples at `sample_rate`.
pub fn load_clip(path: &Path, sample_rate: u32) -> Result<Vec<f32>, AudioError> {
    let mut reader = hound::WavReader::open(path).map_err(|e| asset_error(path, e))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<_, _>>()
                .map_err(|e| asset_error(path, e))?
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| asset_error(path, e))?,
    };

    let mono = if spec.channels > 1 {
        let ch = spec.channels as usize;
        samples
            .chunks(ch)
            .map(|frame| frame.iter().sum::<f32>() / ch as f32)
            .collect()
    } else {
        samples
    };
    if mono.is_empty() {
        return Err(asset_error(path, "no samples"));
    }
    Ok(resample(&mono, spec.sample_rate, sample_rate))
}

/// Linear-interpolation resampler.
pub fn resample(samples: &[f32], from_hz: u32, to_hz: u32) -> Vec<f32> {
    if from_hz == to_hz || from_hz == 0 || samples.is_empty() {
        return samples.to_vec();
    }
    let last = samples.len() - 1;
    let out_len = ((samples.len() as u64 * u64::from(to_hz)) / u64::from(from_hz)).max(1) as usize;
    let step = f64::from(from_hz) / f64::from(to_hz);
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos as usize).min(last);
            let frac = (pos - idx as f64) as f32;
            let a = samples[idx];
            let b = samples[(idx + 1).min(last)];
            a + (b - a) * frac
        })
        .collect()
}

// ── Mixer ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Voice {
    clip: Arc<[f32]>,
    position: usize,
    playing: bool,
}

/// One looping voice per [`Effect`].
#[derive(Debug, Default)]
pub struct Mixer {
    voices: [Voice; 3],
}

impl Mixer {
    /// Clips indexed by [`Effect::index`].
    pub fn new(clips: [Vec<f32>; 3]) -> Self {
        Self {
            voices: clips.map(|clip| Voice {
                clip: clip.into(),
                position: 0,
                playing: false,
            }),
        }
    }

    /// Decode every effect from `dir`.
    pub fn load(dir: &Path, sample_rate: u32) -> Result<Self, AudioError> {
        let mut clips: [Vec<f32>; 3] = Default::default();
        for effect in Effect::ALL {
            let path = dir.join(effect.file_name());
            let clip = load_clip(&path, sample_rate)?;
            info!(
                "sound: loaded {} ({} samples @ {} Hz)",
                path.display(),
                clip.len(),
                sample_rate
            );
            clips[effect.index()] = clip;
        }
        Ok(Self::new(clips))
    }

    pub fn start(&mut self, effect: Effect) {
        let voice = &mut self.voices[effect.index()];
        voice.position = 0;
        voice.playing = !voice.clip.is_empty();
    }

    pub fn stop(&mut self, effect: Effect) {
        self.voices[effect.index()].playing = false;
    }

    pub fn is_playing(&self, effect: Effect) -> bool {
        self.voices[effect.index()].playing
    }

    /// Render interleaved frames; every channel carries the same mix.
    pub fn fill(&mut self, out: &mut [f32], channels: usize) {
        for frame in out.chunks_mut(channels.max(1)) {
            let mut acc = 0.0_f32;
            for voice in self.voices.iter_mut().filter(|v| v.playing) {
                acc += voice.clip[voice.position];
                voice.position = (voice.position + 1) % voice.clip.len();
            }
            frame.fill(acc.clamp(-1.0, 1.0));
        }
    }
}

// ── SoundPort over a shared mixer ──────────────────────────────

/// [`SoundPort`] that flips voices in a shared [`Mixer`].
pub struct MixerSound {
    mixer: Arc<Mutex<Mixer>>,
    #[cfg(feature = "hardware")]
    _output: Option<output::OutputThread>,
}

impl MixerSound {
    /// Detached from any output device; used by tests and for dry runs.
    pub fn from_mixer(mixer: Mixer) -> Self {
        Self {
            mixer: Arc::new(Mutex::new(mixer)),
            #[cfg(feature = "hardware")]
            _output: None,
        }
    }

    pub fn is_playing(&self, effect: Effect) -> bool {
        self.mixer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_playing(effect)
    }

    /// Route audio to the jack, decode the assets and start the output
    /// stream on its own thread.
    #[cfg(feature = "hardware")]
    pub fn open(sound_dir: &Path) -> Result<Self, AudioError> {
        if let Err(e) = route_to_headphone_jack() {
            log::warn!("sound: {e}");
        }
        let (mixer, thread) = output::spawn(sound_dir)?;
        Ok(Self {
            mixer,
            _output: Some(thread),
        })
    }
}

impl SoundPort for MixerSound {
    fn start(&self, effect: Effect) {
        self.mixer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .start(effect);
    }

    fn stop(&self, effect: Effect) {
        self.mixer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stop(effect);
    }
}

/// Select the 3.5 mm jack on the Pi's onboard codec.
pub fn route_to_headphone_jack() -> Result<(), AudioError> {
    let out = Command::new("amixer")
        .args(["cset", "numid=3", "1"])
        .output()
        .map_err(|e| AudioError::Routing(format!("amixer: {e}")))?;
    if out.status.success() {
        info!("sound: output routed to headphone jack");
        Ok(())
    } else {
        Err(AudioError::Routing(format!(
            "amixer exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )))
    }
}

// ── cpal output ────────────────────────────────────────────────

#[cfg(feature = "hardware")]
mod output {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::thread::{self, JoinHandle};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use crossbeam_channel::Sender;
    use log::{error, info};

    use super::Mixer;
    use crate::error::AudioError;

    type Ready = Result<Arc<Mutex<Mixer>>, AudioError>;

    /// Keeps the stream alive; dropping it stops playback.
    pub struct OutputThread {
        stop: Option<Sender<()>>,
        handle: Option<JoinHandle<()>>,
    }

    impl Drop for OutputThread {
        fn drop(&mut self) {
            self.stop.take();
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }

    pub fn spawn(sound_dir: &Path) -> Result<(Arc<Mutex<Mixer>>, OutputThread), AudioError> {
        let dir: PathBuf = sound_dir.to_path_buf();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Ready>(1);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);

        let handle = thread::Builder::new()
            .name("audio-out".into())
            .spawn(move || match open_stream(&dir) {
                Ok((stream, mixer)) => {
                    let _ = ready_tx.send(Ok(mixer));
                    // Blocks until the sender is dropped.
                    let _ = stop_rx.recv();
                    drop(stream);
                    info!("sound: output stream closed");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| AudioError::Device(format!("cannot spawn audio thread: {e}")))?;

        let mixer = ready_rx
            .recv()
            .map_err(|_| AudioError::Device("audio thread exited during init".into()))??;
        Ok((
            mixer,
            OutputThread {
                stop: Some(stop_tx),
                handle: Some(handle),
            },
        ))
    }

    fn open_stream(dir: &Path) -> Result<(cpal::Stream, Arc<Mutex<Mixer>>), AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::Device("no default output device".into()))?;
        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::Device(format!("no output config: {e}")))?;
        let format = supported.sample_format();
        let config: cpal::StreamConfig = supported.config();
        info!(
            "sound: output {} ch @ {} Hz ({format:?})",
            config.channels, config.sample_rate
        );

        let mixer = Arc::new(Mutex::new(Mixer::load(dir, config.sample_rate)?));
        let stream = match format {
            cpal::SampleFormat::F32 => build::<f32>(&device, &config, Arc::clone(&mixer))?,
            cpal::SampleFormat::I16 => build::<i16>(&device, &config, Arc::clone(&mixer))?,
            cpal::SampleFormat::U16 => build::<u16>(&device, &config, Arc::clone(&mixer))?,
            other => {
                return Err(AudioError::Device(format!(
                    "unsupported sample format {other:?}"
                )));
            }
        };
        stream
            .play()
            .map_err(|e| AudioError::Device(format!("failed to start output stream: {e}")))?;
        Ok((stream, mixer))
    }

    fn build<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mixer: Arc<Mutex<Mixer>>,
    ) -> Result<cpal::Stream, AudioError>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = usize::from(config.channels);
        let mut scratch: Vec<f32> = Vec::new();
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _info: &cpal::OutputCallbackInfo| {
                    scratch.resize(data.len(), 0.0);
                    match mixer.lock() {
                        Ok(mut m) => m.fill(&mut scratch, channels),
                        Err(_) => scratch.fill(0.0),
                    }
                    for (out, sample) in data.iter_mut().zip(&scratch) {
                        *out = T::from_sample(*sample);
                    }
                },
                move |err| {
                    error!("audio output stream error: {err}");
                },
                None,
            )
            .map_err(|e| AudioError::Device(format!("failed to build output stream: {e}")))
    }
}
