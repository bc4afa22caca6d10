use std::io::Cursor;
use std::sync::Arc;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::providers::ProviderError;

/// Mono PCM, down-mixed by averaging channels.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

fn analysis_error(context: &str, err: impl std::fmt::Display) -> ProviderError {
    ProviderError::Analysis(format!("{}: {}", context, err))
}

/// Decodes a whole in-memory file. `extension` is only a probe hint.
pub fn decode_mono(bytes: Arc<[u8]>, extension: Option<&str>) -> Result<DecodedAudio, ProviderError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| analysis_error("unrecognized audio container", e))?;

    let mut reader = probed.format;
    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ProviderError::Analysis("no audio track".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| analysis_error("unsupported codec", e))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(analysis_error("failed to read packet", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let rate = *sample_rate.get_or_insert(spec.rate);
                if rate != spec.rate {
                    log::debug!("Sample rate changed mid-stream ({} -> {})", rate, spec.rate);
                }

                let channels = spec.channels.count().max(1);
                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);

                samples.extend(
                    buf.samples()
                        .chunks(channels)
                        .map(|frame| frame.iter().sum::<f32>() / channels as f32),
                );
            }
            Err(SymphoniaError::DecodeError(e)) => {
                log::debug!("Skipping undecodable packet: {}", e);
            }
            Err(e) => return Err(analysis_error("decoder failure", e)),
        }
    }

    let sample_rate = sample_rate.unwrap_or(0);
    if samples.is_empty() || sample_rate == 0 {
        return Err(ProviderError::Analysis("no audio samples decoded".to_string()));
    }

    log::debug!(
        "Decoded {} mono samples at {} Hz",
        samples.len(),
        sample_rate
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Cursor;

    /// 16-bit WAV bytes for the given mono samples.
    pub fn wav_bytes(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                let value = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                for _ in 0..channels {
                    writer.write_sample(value).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    pub fn sine(freq: f32, amplitude: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
        let n = (seconds * sample_rate as f32) as usize;
        (0..n)
            .map(|i| {
                amplitude
                    * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{sine, wav_bytes};
    use super::*;

    #[test]
    fn test_decode_stereo_wav_to_mono() {
        let samples = sine(440.0, 0.5, 1.0, 8000);
        let bytes = wav_bytes(&samples, 8000, 2);

        let decoded = decode_mono(Arc::from(bytes), Some("wav")).unwrap();
        assert_eq!(decoded.sample_rate, 8000);
        assert_eq!(decoded.samples.len(), 8000);
        assert!((decoded.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_garbage_is_analysis_error() {
        let bytes: Vec<u8> = (0..2048).map(|i| (i * 31 % 251) as u8).collect();
        let result = decode_mono(Arc::from(bytes), Some("mp3"));
        assert!(matches!(result, Err(ProviderError::Analysis(_))));
    }
}
