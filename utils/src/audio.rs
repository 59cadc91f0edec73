use ringbuf::HeapRb;
use rubato::{FastFixedIn, PolynomialDegree};

/// Rate the server expects for microphone audio.
pub const LIVE_API_INPUT_SAMPLE_RATE: f64 = 16000.0;
/// Rate of the audio the server sends back.
pub const LIVE_API_OUTPUT_SAMPLE_RATE: f64 = 24000.0;

pub fn create_resampler(
    in_sampling_rate: f64,
    out_sampling_rate: f64,
    chunk_size: usize,
) -> anyhow::Result<FastFixedIn<f32>> {
    let resampler = FastFixedIn::<f32>::new(
        out_sampling_rate / in_sampling_rate,
        1.0,
        PolynomialDegree::Cubic,
        chunk_size,
        1,
    )?;
    Ok(resampler)
}

/// Split `samples` into `chunk_size` pieces, padding the last with silence.
pub fn split_for_chunks(samples: &[f32], chunk_size: usize) -> Vec<Vec<f32>> {
    samples
        .chunks(chunk_size)
        .map(|chunk| {
            let mut chunk = chunk.to_vec();
            chunk.resize(chunk_size, 0.0);
            chunk
        })
        .collect()
}

pub fn shared_buffer(size: usize) -> HeapRb<f32> {
    HeapRb::new(size)
}

/// Little-endian 16-bit PCM to samples in [-1.0, 1.0]. A trailing odd byte is ignored.
pub fn pcm16_to_f32(pcm16: &[u8]) -> Vec<f32> {
    pcm16
        .chunks_exact(2)
        .map(|chunk| {
            let v = i16::from_le_bytes([chunk[0], chunk[1]]);
            (v as f32 / i16::MAX as f32).clamp(-1.0, 1.0)
        })
        .collect()
}

/// Samples to little-endian 16-bit PCM, saturating out-of-range values.
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|&sample| {
            let v = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            v.to_le_bytes()
        })
        .collect()
}
