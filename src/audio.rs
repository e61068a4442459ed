//! PCM to WAV wrapping for synthesised speech
//!
//! Speech comes back from the TTS model as raw little-endian PCM. Players
//! need a container, so the samples are prefixed with a canonical 44-byte
//! RIFF/WAVE header and otherwise copied verbatim.

use crate::{Error, Result};
use base64::Engine as _;
use serde::Serialize;

pub const WAV_HEADER_LEN: usize = 44;

const PCM_FORMAT_TAG: u16 = 1;

/// Sample layout of a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WavSpec {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    /// Mono, 24 kHz, 16-bit: what the TTS model emits.
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 24_000,
            bits_per_sample: 16,
        }
    }
}

impl WavSpec {
    /// Read the layout from a PCM MIME type such as
    /// `audio/L16;codec=pcm;rate=24000`.
    ///
    /// Parameters that are missing or unparseable keep their defaults.
    pub fn from_mime(mime_type: &str) -> Self {
        let mut spec = Self::default();
        let mut params = mime_type.split(';');

        if let Some(essence) = params.next() {
            let essence = essence.trim().to_ascii_lowercase();
            if let Some(bits) = essence
                .strip_prefix("audio/l")
                .and_then(|b| b.parse::<u16>().ok())
            {
                spec.bits_per_sample = bits;
            }
        }

        for param in params {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "rate" => {
                    if let Ok(rate) = value.trim().parse() {
                        spec.sample_rate = rate;
                    }
                }
                "channels" => {
                    if let Ok(channels) = value.trim().parse() {
                        spec.channels = channels;
                    }
                }
                _ => {}
            }
        }

        spec
    }

    pub fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.block_align())
    }

    fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(Error::AudioFormat("channel count must be positive".to_string()));
        }
        if self.sample_rate == 0 {
            return Err(Error::AudioFormat("sample rate must be positive".to_string()));
        }
        if !matches!(self.bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(Error::AudioFormat(format!(
                "unsupported bit depth {}",
                self.bits_per_sample
            )));
        }
        let block_align = u32::from(self.channels) * u32::from(self.bits_per_sample / 8);
        if block_align > u32::from(u16::MAX) || self.sample_rate.checked_mul(block_align).is_none()
        {
            return Err(Error::AudioFormat(format!(
                "{} channels at {} Hz overflows the WAV header",
                self.channels, self.sample_rate
            )));
        }
        Ok(())
    }
}

/// Wrap raw PCM samples in a WAV container.
///
/// Output is deterministic: the same samples and spec always produce the
/// same bytes.
pub fn encode_wav(pcm: &[u8], spec: WavSpec) -> Result<Vec<u8>> {
    spec.validate()?;

    let block_align = usize::from(spec.block_align());
    if pcm.len() % block_align != 0 {
        return Err(Error::AudioFormat(format!(
            "{} bytes is not a whole number of {}-byte frames",
            pcm.len(),
            block_align
        )));
    }

    let data_len = u32::try_from(pcm.len())
        .ok()
        .filter(|len| len.checked_add(36).is_some())
        .ok_or_else(|| {
            Error::AudioFormat(format!("{} bytes exceeds the WAV size limit", pcm.len()))
        })?;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    out.extend_from_slice(&spec.channels.to_le_bytes());
    out.extend_from_slice(&spec.sample_rate.to_le_bytes());
    out.extend_from_slice(&spec.byte_rate().to_le_bytes());
    out.extend_from_slice(&spec.block_align().to_le_bytes());
    out.extend_from_slice(&spec.bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);

    Ok(out)
}

/// Header fields decoded from a canonical WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub spec: WavSpec,
    pub data_len: u32,
}

impl WavHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < WAV_HEADER_LEN {
            return Err(Error::AudioFormat(format!(
                "{} bytes is too short for a WAV header",
                bytes.len()
            )));
        }
        if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(Error::AudioFormat("missing RIFF/WAVE marker".to_string()));
        }
        if &bytes[12..16] != b"fmt " || &bytes[36..40] != b"data" {
            return Err(Error::AudioFormat("not a canonical PCM WAV layout".to_string()));
        }

        let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        let u32_at =
            |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

        if u16_at(20) != PCM_FORMAT_TAG {
            return Err(Error::AudioFormat(format!(
                "unsupported format tag {}",
                u16_at(20)
            )));
        }

        Ok(Self {
            spec: WavSpec {
                channels: u16_at(22),
                sample_rate: u32_at(24),
                bits_per_sample: u16_at(34),
            },
            data_len: u32_at(40),
        })
    }
}

/// A playable WAV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavAudio {
    pub bytes: Vec<u8>,
}

impl WavAudio {
    pub fn from_pcm(pcm: &[u8], spec: WavSpec) -> Result<Self> {
        Ok(Self {
            bytes: encode_wav(pcm, spec)?,
        })
    }

    pub fn to_data_uri(&self) -> String {
        format!(
            "data:audio/wav;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    pub fn duration_secs(&self) -> Option<f64> {
        let header = WavHeader::parse(&self.bytes).ok()?;
        Some(f64::from(header.data_len) / f64::from(header.spec.byte_rate()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_one_second_of_silence() {
        let pcm = vec![0u8; 48_000];
        let wav = encode_wav(&pcm, WavSpec::default()).unwrap();

        assert_eq!(wav.len(), 44 + 48_000);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");

        let header = WavHeader::parse(&wav).unwrap();
        assert_eq!(header.spec.sample_rate, 24_000);
        assert_eq!(header.spec.channels, 1);
        assert_eq!(header.spec.bits_per_sample, 16);
        assert_eq!(header.data_len, 48_000);
        assert!(wav[44..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_wrapping_is_deterministic_and_header_round_trips() {
        let pcm: Vec<u8> = (0..=255u8).cycle().take(4_800).collect();
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
        };

        let first = encode_wav(&pcm, spec).unwrap();
        let second = encode_wav(&pcm, spec).unwrap();
        assert_eq!(first, second);
        assert_eq!(&first[WAV_HEADER_LEN..], pcm.as_slice());

        let header = WavHeader::parse(&first).unwrap();
        assert_eq!(header.spec, spec);
        assert_eq!(header.spec.byte_rate(), 44_100 * 4);
    }

    #[test]
    fn test_riff_size_field() {
        let wav = encode_wav(&[0u8; 10], WavSpec::default()).unwrap();
        assert_eq!(u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]), 46);
    }

    #[test]
    fn test_truncated_frame_is_rejected() {
        let err = encode_wav(&[0u8; 3], WavSpec::default()).unwrap_err();
        assert!(matches!(err, Error::AudioFormat(_)));
    }

    #[test]
    fn test_invalid_spec_is_rejected() {
        let zero_channels = WavSpec {
            channels: 0,
            ..WavSpec::default()
        };
        assert!(encode_wav(&[0u8; 4], zero_channels).is_err());

        let odd_depth = WavSpec {
            bits_per_sample: 12,
            ..WavSpec::default()
        };
        assert!(encode_wav(&[0u8; 4], odd_depth).is_err());
    }

    #[test]
    fn test_parse_rejects_non_wav() {
        assert!(WavHeader::parse(b"RIFF").is_err());
        assert!(WavHeader::parse(&[0u8; 64]).is_err());
    }

    #[test]
    fn test_spec_from_tts_mime() {
        let spec = WavSpec::from_mime("audio/L16;codec=pcm;rate=24000");
        assert_eq!(spec, WavSpec::default());

        let spec = WavSpec::from_mime("audio/L16; rate=16000");
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);

        assert_eq!(WavSpec::from_mime("audio/pcm"), WavSpec::default());
    }

    #[test]
    fn test_wav_audio_data_uri_and_duration() {
        let audio = WavAudio::from_pcm(&[0u8; 48_000], WavSpec::default()).unwrap();
        assert!(audio.to_data_uri().starts_with("data:audio/wav;base64,UklGR"));
        assert_eq!(audio.duration_secs(), Some(1.0));
    }
}
