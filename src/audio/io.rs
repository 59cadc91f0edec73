/// Something that can render audio, typically a speaker.
///
/// Implementations should queue when already playing; `play` must not block
/// the session task for the duration of playback.
pub trait AudioOutput: Send {
    /// Play a WAV container or raw PCM buffer at `volume` (0.0 to 1.0).
    fn play(&mut self, audio: Vec<u8>, volume: f32);

    /// Stop playback and drop anything queued.
    fn stop(&mut self);
}

/// Something that captures audio, typically a microphone tap.
///
/// Captured chunks reach the session through `Client::send_audio_chunk`;
/// the session only needs to be able to shut capture down.
pub trait AudioInput: Send {
    fn stop(&mut self);
}
