use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gemini_live::audio::{wav, AudioInput, AudioOutput};
use gemini_live::types::SupportedModel;
use gemini_live::utils;
use gemini_live::utils::audio::{LIVE_API_INPUT_SAMPLE_RATE, LIVE_API_OUTPUT_SAMPLE_RATE};
use gemini_live::utils::cpal::traits::{DeviceTrait, StreamTrait};
use gemini_live::utils::cpal::{self, FrameCount, StreamConfig};
use gemini_live::utils::ringbuf::traits::{Consumer, Producer, Split};
use gemini_live::utils::rubato::Resampler;
use gemini_live::{Client, Config, ConnectionStatus, FlushPolicy, TranscriptRx};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

const INPUT_CHUNK_SIZE: usize = 1024;
const OUTPUT_CHUNK_SIZE: usize = 1024;
// whole turns arrive at once
const OUTPUT_BUFFER_SECONDS: usize = 30;

/// Talk to a Gemini Live model through the default microphone and speaker.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Model name, with or without the `models/` prefix.
    #[arg(long)]
    model: Option<SupportedModel>,

    /// `all` or `threshold(n)`.
    #[arg(long, default_value = "all")]
    flush: FlushPolicy,

    #[arg(long, default_value_t = 0.9)]
    volume: f32,

    #[arg(long)]
    input_device: Option<String>,

    #[arg(long)]
    output_device: Option<String>,

    /// Print the available devices and exit.
    #[arg(long)]
    list_devices: bool,
}

/// Forwards flushed turns to the resampling task feeding the speaker.
struct SpeakerOutput {
    tx: tokio::sync::mpsc::Sender<(Vec<u8>, f32)>,
}

impl AudioOutput for SpeakerOutput {
    fn play(&mut self, audio: Vec<u8>, volume: f32) {
        if let Err(e) = self.tx.try_send((audio, volume)) {
            tracing::warn!("speaker queue full, dropping turn: {}", e);
        }
    }

    fn stop(&mut self) {
        tracing::info!("speaker stopped");
    }
}

/// Gates the microphone callback.
struct MicInput {
    capturing: Arc<AtomicBool>,
}

impl AudioInput for MicInput {
    fn stop(&mut self) {
        self.capturing.store(false, Ordering::SeqCst);
        tracing::info!("microphone stopped");
    }
}

fn print_transcript(label: &'static str, mut rx: TranscriptRx) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut open = false;
        while let Ok(segment) = rx.recv().await {
            if segment.is_close() {
                if open {
                    println!();
                }
                open = false;
                continue;
            }
            if !open {
                print!("{}: ", label);
                open = true;
            }
            print!("{}", segment.text);
            let _ = std::io::stdout().flush();
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv_override().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    let args = Args::parse();
    if args.list_devices {
        println!("Available inputs:\n{}", utils::device::get_available_inputs()?);
        println!("Available outputs:\n{}", utils::device::get_available_outputs()?);
        return Ok(());
    }

    // Audio input
    let input = utils::device::get_or_default_input(args.input_device.clone())?;
    let input_config = input.default_input_config().context("failed to get default input config")?;
    let input_config = StreamConfig {
        channels: input_config.channels(),
        sample_rate: input_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(FrameCount::from(INPUT_CHUNK_SIZE as u32)),
    };
    tracing::info!("input: device={:?}, config={:?}", input.name(), &input_config);
    let input_channel_count = input_config.channels as usize;
    let input_sample_rate = input_config.sample_rate.0 as f64;

    let capturing = Arc::new(AtomicBool::new(true));
    let (mic_tx, mut mic_rx) = tokio::sync::mpsc::channel::<Vec<f32>>(64);
    let mic_gate = capturing.clone();
    let input_stream = input.build_input_stream(
        &input_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            if !mic_gate.load(Ordering::SeqCst) {
                return;
            }
            // first channel only
            let mono: Vec<f32> = data.iter().step_by(input_channel_count.max(1)).copied().collect();
            if let Err(e) = mic_tx.try_send(mono) {
                tracing::debug!("dropping microphone buffer: {}", e);
            }
        },
        move |err| tracing::error!("an error occurred on input stream: {}", err),
        None,
    )?;

    // Audio output
    let output = utils::device::get_or_default_output(args.output_device.clone())?;
    let output_config = output.default_output_config().context("failed to get default output config")?;
    let output_config = StreamConfig {
        channels: output_config.channels(),
        sample_rate: output_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(FrameCount::from(OUTPUT_CHUNK_SIZE as u32)),
    };
    tracing::info!("output: device={:?}, config={:?}", output.name(), &output_config);
    let output_channel_count = output_config.channels as usize;
    let output_sample_rate = output_config.sample_rate.0 as f64;

    let audio_out_buffer =
        utils::audio::shared_buffer(output_sample_rate as usize * OUTPUT_BUFFER_SECONDS);
    let (mut audio_out_tx, mut audio_out_rx) = audio_out_buffer.split();
    let output_stream = output.build_output_stream(
        &output_config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(output_channel_count.max(1)) {
                let sample = audio_out_rx.try_pop().unwrap_or(0.0);
                for channel in frame.iter_mut() {
                    *channel = sample;
                }
            }
        },
        move |err| tracing::error!("an error occurred on output stream: {}", err),
        None,
    )?;

    let mut out_resampler = utils::audio::create_resampler(
        LIVE_API_OUTPUT_SAMPLE_RATE,
        output_sample_rate,
        OUTPUT_CHUNK_SIZE,
    )?;
    let (speaker_tx, mut speaker_rx) = tokio::sync::mpsc::channel::<(Vec<u8>, f32)>(16);
    let post_process = tokio::spawn(async move {
        while let Some((audio, volume)) = speaker_rx.recv().await {
            let samples: Vec<f32> = utils::audio::pcm16_to_f32(wav::wav_to_pcm(&audio))
                .into_iter()
                .map(|s| s * volume)
                .collect();
            let chunk_size = out_resampler.input_frames_next();
            for chunk in utils::audio::split_for_chunks(&samples, chunk_size) {
                match out_resampler.process(&[chunk.as_slice()], None) {
                    Ok(resampled) => {
                        if let Some(resampled) = resampled.first() {
                            let pushed = audio_out_tx.push_slice(resampled);
                            if pushed < resampled.len() {
                                tracing::warn!("speaker buffer full, dropped {} samples", resampled.len() - pushed);
                            }
                        }
                    }
                    Err(e) => tracing::error!("failed to resample output: {}", e),
                }
            }
        }
    });

    // Live session
    let mut builder = Config::builder()
        .with_flush_policy(args.flush)
        .with_volume(args.volume)
        .with_transcription(true);
    if let Some(model) = args.model {
        builder = builder.with_model(model);
    }
    let mut client = Client::new(gemini_live::DEFAULT_CAPACITY, builder.build());
    client.set_audio_output(SpeakerOutput { tx: speaker_tx });
    client.set_audio_input(MicInput { capturing });
    client.connect()?;

    let input_printer = print_transcript("You", client.input_transcripts()?);
    let output_printer = print_transcript("Gemini", client.output_transcripts()?);
    let mut status = client.status_changes();

    input_stream.play()?;
    output_stream.play()?;

    let mut in_resampler =
        utils::audio::create_resampler(input_sample_rate, LIVE_API_INPUT_SAMPLE_RATE, INPUT_CHUNK_SIZE)?;
    let mut buffer: VecDeque<f32> = VecDeque::with_capacity(INPUT_CHUNK_SIZE * 2);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!("Received Ctrl-C, shutting down...");
                break;
            }
            changed = status.changed() => {
                let current = *status.borrow();
                if changed.is_err() || current == ConnectionStatus::Disconnected {
                    tracing::info!("session ended");
                    break;
                }
                tracing::info!("status: {:?}", current);
            }
            Some(samples) = mic_rx.recv() => {
                buffer.extend(samples);
                let mut resampled: Vec<f32> = Vec::new();
                while buffer.len() >= INPUT_CHUNK_SIZE {
                    let chunk: Vec<f32> = buffer.drain(..INPUT_CHUNK_SIZE).collect();
                    match in_resampler.process(&[chunk.as_slice()], None) {
                        Ok(out) => {
                            if let Some(out) = out.first() {
                                resampled.extend_from_slice(out);
                            }
                        }
                        Err(e) => tracing::error!("failed to resample input: {}", e),
                    }
                }
                if !resampled.is_empty() {
                    client.send_audio_chunk(&utils::audio::f32_to_pcm16(&resampled)).await;
                }
            }
        }
    }

    client.disconnect();
    client.wait_closed().await;
    let stats = client.stats();
    println!(
        "tokens: prompt={}, response={}, total={}",
        stats.prompt_tokens(),
        stats.response_tokens(),
        stats.total_tokens()
    );

    post_process.abort();
    input_printer.abort();
    output_printer.abort();
    Ok(())
}
