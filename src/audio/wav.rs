//! Canonical 44-byte WAV framing for raw little-endian PCM.

use base64::Engine;

use crate::audio::AudioFormat;

/// Size of the canonical RIFF/WAVE header.
pub const HEADER_SIZE: usize = 44;

const PCM_FORMAT: u16 = 1;
const FMT_CHUNK_SIZE: u32 = 16;

/// RIFF and data chunk sizes for `len` bytes of PCM. Payloads past the 4 GiB
/// RIFF limit get saturated size fields.
fn size_fields(len: usize) -> (u32, u32) {
    let data_size = u32::try_from(len).unwrap_or(u32::MAX);
    (data_size.saturating_add(36), data_size)
}

/// Wrap raw PCM in a WAV container.
pub fn pcm_to_wav(pcm: &[u8], format: AudioFormat) -> Vec<u8> {
    let (file_size, data_size) = size_fields(pcm.len());

    let mut wav = Vec::with_capacity(HEADER_SIZE + pcm.len());

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&file_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
    wav.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    wav.extend_from_slice(&format.channels.to_le_bytes());
    wav.extend_from_slice(&format.sample_rate.to_le_bytes());
    wav.extend_from_slice(&format.byte_rate().to_le_bytes());
    wav.extend_from_slice(&format.block_align().to_le_bytes());
    wav.extend_from_slice(&format.bits_per_sample.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    wav.extend_from_slice(pcm);

    wav
}

/// Decode base64 PCM chunks, concatenate them in order and wrap the result.
///
/// Chunks that are not valid base64 are skipped. Returns `None` when there is
/// no audio at all, which is a normal outcome for a text-only turn.
pub fn combine_and_wrap<S: AsRef<str>>(chunks: &[S], format: AudioFormat) -> Option<Vec<u8>> {
    let mut pcm = Vec::new();
    for chunk in chunks {
        match base64::engine::general_purpose::STANDARD.decode(chunk.as_ref()) {
            Ok(decoded) => pcm.extend_from_slice(&decoded),
            Err(e) => tracing::warn!("skipping audio chunk with invalid base64: {}", e),
        }
    }

    if pcm.is_empty() {
        return None;
    }
    Some(pcm_to_wav(&pcm, format))
}

/// Strip a canonical WAV header.
///
/// Input that does not start with a RIFF/WAVE header is assumed to already be
/// raw PCM and is returned unchanged.
pub fn wav_to_pcm(wav: &[u8]) -> &[u8] {
    if !has_header(wav) {
        return wav;
    }
    let data_size = read_u32(wav, 40) as usize;
    let end = HEADER_SIZE.saturating_add(data_size).min(wav.len());
    &wav[HEADER_SIZE..end]
}

/// Read the PCM format out of a canonical WAV header.
pub fn parse_header(wav: &[u8]) -> Option<AudioFormat> {
    if !has_header(wav) || &wav[12..16] != b"fmt " || read_u16(wav, 20) != PCM_FORMAT {
        return None;
    }
    Some(AudioFormat {
        channels: read_u16(wav, 22),
        sample_rate: read_u32(wav, 24),
        bits_per_sample: read_u16(wav, 34),
    })
}

fn has_header(wav: &[u8]) -> bool {
    wav.len() >= HEADER_SIZE && &wav[0..4] == b"RIFF" && &wav[8..12] == b"WAVE"
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn test_header_layout() {
        let pcm = [1u8, 2, 3, 4, 5, 6];
        let wav = pcm_to_wav(&pcm, AudioFormat::playback());

        assert_eq!(wav.len(), HEADER_SIZE + pcm.len());
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[4..8], &(36u32 + 6).to_le_bytes());
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[16..20], &16u32.to_le_bytes());
        assert_eq!(&wav[20..22], &[0x01, 0x00]);
        assert_eq!(&wav[22..24], &[0x01, 0x00]);
        assert_eq!(&wav[24..28], &24000u32.to_le_bytes());
        assert_eq!(&wav[28..32], &48000u32.to_le_bytes());
        assert_eq!(&wav[32..34], &2u16.to_le_bytes());
        assert_eq!(&wav[34..36], &16u16.to_le_bytes());
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(&wav[40..44], &6u32.to_le_bytes());
        assert_eq!(&wav[44..], &pcm);
    }

    #[test]
    fn test_size_fields() {
        assert_eq!(size_fields(0), (36, 0));
        assert_eq!(size_fields(100), (136, 100));
        assert_eq!(size_fields(u32::MAX as usize - 10), (u32::MAX, u32::MAX - 10));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_size_fields_past_riff_limit() {
        assert_eq!(size_fields(u32::MAX as usize + 10), (u32::MAX, u32::MAX));
    }

    #[test]
    fn test_stereo_rates() {
        let wav = pcm_to_wav(&[], AudioFormat::new(44100, 2, 16));
        assert_eq!(&wav[28..32], &(44100u32 * 4).to_le_bytes());
        assert_eq!(&wav[32..34], &4u16.to_le_bytes());
        assert_eq!(&wav[40..44], &0u32.to_le_bytes());
    }

    #[test]
    fn test_combine_empty() {
        let chunks: Vec<String> = vec![];
        assert!(combine_and_wrap(&chunks, AudioFormat::playback()).is_none());
        assert!(combine_and_wrap(&["not-base64!!"], AudioFormat::playback()).is_none());
        assert!(combine_and_wrap(&[""], AudioFormat::playback()).is_none());
    }

    #[test]
    fn test_combine_preserves_order() {
        let first = [9u8, 8, 7];
        let second = [1u8, 2];
        let wav = combine_and_wrap(&[b64(&first), b64(&second)], AudioFormat::playback()).unwrap();
        assert_eq!(wav_to_pcm(&wav), &[9, 8, 7, 1, 2]);
    }

    #[test]
    fn test_combine_skips_invalid_chunks() {
        let wav = combine_and_wrap(
            &[b64(&[1, 2]), "%%%".to_string(), b64(&[3, 4])],
            AudioFormat::playback(),
        )
        .unwrap();
        assert_eq!(wav_to_pcm(&wav), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_wav_to_pcm_passes_raw_through() {
        let raw = vec![0u8; 100];
        assert_eq!(wav_to_pcm(&raw), raw.as_slice());

        let short = b"RIFF....WAVE".to_vec();
        assert_eq!(wav_to_pcm(&short), short.as_slice());
    }

    #[test]
    fn test_parse_header() {
        let wav = pcm_to_wav(&[0, 0], AudioFormat::capture());
        assert_eq!(parse_header(&wav), Some(AudioFormat::capture()));
        assert_eq!(parse_header(&[0u8; 44]), None);
    }
}
