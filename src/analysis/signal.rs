//! Signal-level feature extraction from decoded PCM.
//!
//! Both estimators work on short-time FFT magnitudes. Tempo autocorrelates a
//! spectral-flux onset envelope over the 60-200 BPM range, then checks whether
//! the double tempo fits the envelope as well. Key is the pitch class holding
//! the most chroma energy. Mode is not estimated.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::decoder::DecodedAudio;
use crate::providers::ProviderError;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalFeatures {
    /// BPM
    pub tempo: Option<f64>,
    /// Pitch class 0..=11
    pub key: Option<u8>,
    /// Mean RMS, 0..1 for normalized input
    pub energy: f64,
    pub loudness_db: f64,
    pub duration_secs: f64,
}

/// Anything that can turn mono PCM into tempo/key/energy/loudness/duration.
pub trait SignalAnalyzer: Send + Sync {
    fn analyze(&self, audio: &DecodedAudio) -> Result<SignalFeatures, ProviderError>;
}

const MIN_BPM: f64 = 60.0;
const MAX_BPM: f64 = 200.0;
const PRIOR_CENTER_BPM: f64 = 120.0;
const ENVELOPE_RATE_HZ: u32 = 200;
const ONSET_FRAME_SIZE: usize = 1024;
/// Share of the best correlation the double tempo must reach to be preferred.
const OCTAVE_RATIO: f64 = 0.8;
const SILENCE_RMS: f64 = 1e-5;
const LOUDNESS_FLOOR_DB: f64 = -100.0;

// C2..B6
const LOWEST_MIDI_NOTE: f64 = 36.0;
const HIGHEST_MIDI_NOTE: f64 = 95.0;
const KEY_FRAME_SIZE: usize = 8192;

#[derive(Debug, Clone)]
pub struct BasicAnalyzer {
    /// Seconds of audio considered for tempo and key.
    max_window_secs: f64,
    /// Upper bound on chroma frames sampled across the window.
    max_key_frames: usize,
}

impl Default for BasicAnalyzer {
    fn default() -> Self {
        Self {
            max_window_secs: 120.0,
            max_key_frames: 48,
        }
    }
}

impl BasicAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    fn window<'a>(&self, audio: &'a DecodedAudio) -> &'a [f32] {
        let max = (self.max_window_secs * audio.sample_rate as f64) as usize;
        &audio.samples[..audio.samples.len().min(max)]
    }
}

impl SignalAnalyzer for BasicAnalyzer {
    fn analyze(&self, audio: &DecodedAudio) -> Result<SignalFeatures, ProviderError> {
        if audio.samples.is_empty() || audio.sample_rate == 0 {
            return Err(ProviderError::Analysis("empty signal".to_string()));
        }

        let energy = rms(&audio.samples);
        let loudness_db = if energy > 0.0 {
            (20.0 * energy.log10()).max(LOUDNESS_FLOOR_DB)
        } else {
            LOUDNESS_FLOOR_DB
        };

        let window = self.window(audio);
        let (tempo, key) = if energy < SILENCE_RMS {
            (None, None)
        } else {
            (
                estimate_tempo(window, audio.sample_rate),
                estimate_key(window, audio.sample_rate, self.max_key_frames),
            )
        };

        Ok(SignalFeatures {
            tempo,
            key,
            energy,
            loudness_db,
            duration_secs: audio.duration_secs(),
        })
    }
}

fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt()
}

/// Hann-windowed forward FFT of a fixed frame size.
struct Spectrum {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl Spectrum {
    fn new(size: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        let window = (0..size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / (size - 1).max(1) as f32;
                0.5 - 0.5 * phase.cos()
            })
            .collect();
        Self { fft, window }
    }

    fn size(&self) -> usize {
        self.window.len()
    }

    /// Magnitudes of the non-negative frequency bins. `frame` must hold `size()` samples.
    fn magnitudes(&self, frame: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = frame
            .iter()
            .zip(&self.window)
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        self.fft.process(&mut buffer);
        buffer[..self.size() / 2].iter().map(|c| c.norm()).collect()
    }
}

/// Half-wave rectified spectral flux at roughly `ENVELOPE_RATE_HZ` frames per second.
fn onset_envelope(samples: &[f32], sample_rate: u32) -> (Vec<f64>, f64) {
    let hop = (sample_rate / ENVELOPE_RATE_HZ).max(1) as usize;
    let frame_rate = sample_rate as f64 / hop as f64;

    if samples.len() < ONSET_FRAME_SIZE {
        return (Vec::new(), frame_rate);
    }

    let spectrum = Spectrum::new(ONSET_FRAME_SIZE);
    let mut previous: Option<Vec<f32>> = None;
    let mut onsets = Vec::with_capacity((samples.len() - ONSET_FRAME_SIZE) / hop + 1);

    for start in (0..=samples.len() - ONSET_FRAME_SIZE).step_by(hop) {
        let current = spectrum.magnitudes(&samples[start..start + ONSET_FRAME_SIZE]);
        if let Some(prev) = &previous {
            let flux: f64 = current
                .iter()
                .zip(prev)
                .map(|(&c, &p)| (c - p).max(0.0) as f64)
                .sum();
            onsets.push(flux);
        }
        previous = Some(current);
    }

    // Mean removal keeps steady-state energy from rewarding every lag.
    let mean = onsets.iter().sum::<f64>() / onsets.len().max(1) as f64;
    for v in onsets.iter_mut() {
        *v = (*v - mean).max(0.0);
    }

    (onsets, frame_rate)
}

fn tempo_prior(bpm: f64) -> f64 {
    let octaves = (bpm / PRIOR_CENTER_BPM).log2();
    (-0.5 * octaves * octaves).exp()
}

fn autocorrelation(onsets: &[f64], lag: usize) -> f64 {
    if lag == 0 || lag >= onsets.len() {
        return 0.0;
    }
    let pairs = onsets.len() - lag;
    onsets[..pairs]
        .iter()
        .zip(&onsets[lag..])
        .map(|(a, b)| a * b)
        .sum::<f64>()
        / pairs as f64
}

/// Strongest correlation within one frame of `lag`, absorbing rounding of the period.
fn peak_near(onsets: &[f64], lag: usize) -> f64 {
    (lag.saturating_sub(1)..=lag + 1)
        .map(|l| autocorrelation(onsets, l))
        .fold(0.0, f64::max)
}

fn estimate_tempo(samples: &[f32], sample_rate: u32) -> Option<f64> {
    let (onsets, frame_rate) = onset_envelope(samples, sample_rate);

    let min_lag = (60.0 * frame_rate / MAX_BPM).ceil() as usize;
    let max_lag = (60.0 * frame_rate / MIN_BPM).floor() as usize;
    if min_lag == 0 || onsets.len() < max_lag * 2 {
        return None;
    }

    if onsets.iter().all(|&v| v <= f64::EPSILON) {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for lag in min_lag..=max_lag {
        let bpm = 60.0 * frame_rate / lag as f64;
        let score = autocorrelation(&onsets, lag) * tempo_prior(bpm);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((lag, score));
        }
    }

    let (mut lag, score) = best?;
    if score <= 0.0 {
        return None;
    }

    // A pulse train correlates at every multiple of its period; the prior can
    // land on the half tempo, so climb back while the shorter lag holds up.
    while lag / 2 >= min_lag {
        let half = lag / 2;
        let (candidate, strength) = (half..=half + 1)
            .map(|l| (l, autocorrelation(&onsets, l)))
            .fold((half, 0.0), |best, c| if c.1 > best.1 { c } else { best });
        if strength >= OCTAVE_RATIO * peak_near(&onsets, lag) {
            lag = candidate;
        } else {
            break;
        }
    }

    Some(60.0 * frame_rate / lag as f64)
}

fn chroma(samples: &[f32], sample_rate: u32, max_frames: usize) -> [f64; 12] {
    let mut bins = [0.0f64; 12];
    let frame_size = KEY_FRAME_SIZE.min(samples.len());
    if frame_size < 256 || max_frames == 0 {
        return bins;
    }

    let available = samples.len() / frame_size;
    let step = (available / max_frames).max(1);
    let spectrum = Spectrum::new(frame_size);
    let bin_hz = sample_rate as f64 / frame_size as f64;

    // Pitch class of every FFT bin inside the note range.
    let classes: Vec<Option<usize>> = (0..frame_size / 2)
        .map(|k| {
            let freq = k as f64 * bin_hz;
            if freq <= 0.0 {
                return None;
            }
            let midi = (69.0 + 12.0 * (freq / 440.0).log2()).round();
            (LOWEST_MIDI_NOTE..=HIGHEST_MIDI_NOTE)
                .contains(&midi)
                .then(|| (midi as i64).rem_euclid(12) as usize)
        })
        .collect();

    for start in (0..available).step_by(step).take(max_frames) {
        let offset = start * frame_size;
        let magnitudes = spectrum.magnitudes(&samples[offset..offset + frame_size]);
        for (magnitude, class) in magnitudes.iter().zip(&classes) {
            if let Some(class) = class {
                bins[*class] += *magnitude as f64;
            }
        }
    }

    bins
}

fn estimate_key(samples: &[f32], sample_rate: u32, max_frames: usize) -> Option<u8> {
    let bins = chroma(samples, sample_rate, max_frames);
    let total: f64 = bins.iter().sum();
    if total <= f64::EPSILON {
        return None;
    }

    bins.iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(class, _)| class as u8)
}
