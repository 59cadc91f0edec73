use std::sync::{Arc, Mutex};
use std::time::Duration;

use gemini_live::audio::AudioOutput;
use gemini_live::transport::{OutboundFrame, TransportChannels, TransportEvent, TransportPeer};
use gemini_live::{Client, Config, ConnectError, ConnectionStatus, FlushPolicy, RealtimeError};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

const WAIT: Duration = Duration::from_secs(2);

async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(WAIT, future).await.expect("timed out")
}

fn config() -> Config {
    Config::builder().with_api_key("test-key").build()
}

/// A client whose session has sent its setup frame.
async fn connected(config: Config) -> (Client, TransportPeer, serde_json::Value) {
    let mut client = Client::new(32, config);
    let (channels, mut peer) = TransportChannels::pair(32);
    client.connect_with_transport(channels).unwrap();
    peer.events.send(TransportEvent::Connected).await.unwrap();

    let Some(OutboundFrame::Text(setup)) = within(peer.outbound.recv()).await else {
        panic!("expected setup frame");
    };
    (client, peer, serde_json::from_str(&setup).unwrap())
}

async fn ready(config: Config) -> (Client, TransportPeer) {
    let (client, peer, _) = connected(config).await;
    send(&peer, r#"{"setupComplete":{}}"#).await;
    let mut status = client.status_changes();
    within(status.wait_for(|s| *s == ConnectionStatus::HandshakeComplete))
        .await
        .unwrap();
    (client, peer)
}

async fn send(peer: &TransportPeer, frame: &str) {
    peer.events
        .send(TransportEvent::Text(frame.to_string()))
        .await
        .unwrap();
}

fn audio_turn(data: &str) -> String {
    format!(
        r#"{{"serverContent":{{"modelTurn":{{"parts":[{{"inlineData":{{"mimeType":"audio/pcm;rate=24000","data":"{}"}}}}]}}}}}}"#,
        data
    )
}

#[derive(Clone, Default)]
struct RecordingOutput {
    played: Arc<Mutex<Vec<(Vec<u8>, f32)>>>,
    stopped: Arc<Mutex<bool>>,
}

impl AudioOutput for RecordingOutput {
    fn play(&mut self, audio: Vec<u8>, volume: f32) {
        self.played.lock().unwrap().push((audio, volume));
    }

    fn stop(&mut self) {
        *self.stopped.lock().unwrap() = true;
    }
}

#[tokio::test]
async fn setup_is_sent_when_transport_connects() {
    let (client, _peer, setup) = connected(config()).await;

    assert_eq!(
        setup["setup"]["model"],
        "models/gemini-2.5-flash-native-audio-preview-12-2025"
    );
    assert_eq!(setup["setup"]["generationConfig"]["responseModalities"][0], "AUDIO");
    assert_eq!(setup["setup"]["inputAudioTranscription"], serde_json::json!({}));

    let mut status = client.status_changes();
    within(status.wait_for(|s| *s == ConnectionStatus::Connected))
        .await
        .unwrap();
}

#[tokio::test]
async fn audio_is_dropped_until_setup_completes() {
    let (client, mut peer, _) = connected(config()).await;
    client.send_audio_chunk(&[1, 0, 2, 0]).await;

    send(&peer, r#"{"setupComplete":{}}"#).await;
    let mut status = client.status_changes();
    within(status.wait_for(|s| *s == ConnectionStatus::HandshakeComplete))
        .await
        .unwrap();

    client.send_audio_chunk(&[1, 0, 2, 0]).await;
    let Some(OutboundFrame::Text(frame)) = within(peer.outbound.recv()).await else {
        panic!("expected audio frame");
    };
    let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(json["realtimeInput"]["audio"]["data"], "AQACAA==");
    assert_eq!(json["realtimeInput"]["audio"]["mimeType"], "audio/pcm;rate=16000");
    assert!(peer.outbound.try_recv().is_err());
}

#[tokio::test]
async fn send_without_session_is_a_no_op() {
    let client = Client::new(8, config());
    client.send_audio_chunk(&[0, 0]).await;
    client.send_text("hello").await;
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
    assert!(matches!(client.input_transcripts(), Err(RealtimeError::NotConnected)));
}

#[tokio::test]
async fn transcripts_follow_the_speaker() {
    let (client, peer) = ready(config()).await;
    let mut input = client.input_transcripts().unwrap();
    let mut output = client.output_transcripts().unwrap();

    send(&peer, r#"{"serverContent":{"inputTranscription":{"text":"Hel"}}}"#).await;
    send(&peer, r#"{"serverContent":{"inputTranscription":{"text":"lo"}}}"#).await;
    send(&peer, r#"{"serverContent":{"outputTranscription":{"text":"Hi"}}}"#).await;
    send(&peer, r#"{"serverContent":{"inputTranscription":{"text":"again"}}}"#).await;
    send(&peer, r#"{"serverContent":{"turnComplete":true}}"#).await;

    let first = within(input.recv()).await.unwrap();
    let second = within(input.recv()).await.unwrap();
    let close = within(input.recv()).await.unwrap();
    assert_eq!(first.text, "Hel");
    assert_eq!(second.text, "lo");
    assert_eq!(first.segment_id, second.segment_id);
    assert!(close.is_close());
    assert_eq!(close.segment_id, first.segment_id);

    let reply = within(output.recv()).await.unwrap();
    let reply_close = within(output.recv()).await.unwrap();
    assert_eq!(reply.text, "Hi");
    assert_eq!(reply_close, gemini_live::TranscriptSegment { segment_id: reply.segment_id, text: String::new() });

    let resumed = within(input.recv()).await.unwrap();
    let resumed_close = within(input.recv()).await.unwrap();
    assert_eq!(resumed.text, "again");
    assert_ne!(resumed.segment_id, first.segment_id);
    assert!(resumed_close.is_close());
    assert_eq!(resumed_close.segment_id, resumed.segment_id);
}

#[tokio::test]
async fn empty_transcription_deltas_are_ignored() {
    let (client, peer) = ready(config()).await;
    let mut output = client.output_transcripts().unwrap();

    send(&peer, r#"{"serverContent":{"outputTranscription":{"text":"Hi"}}}"#).await;
    send(&peer, r#"{"serverContent":{"outputTranscription":{"text":""}}}"#).await;
    send(&peer, r#"{"serverContent":{"outputTranscription":{}}}"#).await;
    send(&peer, r#"{"serverContent":{"outputTranscription":{"text":" there"}}}"#).await;
    send(&peer, r#"{"serverContent":{"turnComplete":true}}"#).await;

    let first = within(output.recv()).await.unwrap();
    let second = within(output.recv()).await.unwrap();
    let close = within(output.recv()).await.unwrap();
    assert_eq!(first.text, "Hi");
    assert_eq!(second.text, " there");
    assert_eq!(second.segment_id, first.segment_id);
    assert!(close.is_close());
    assert_eq!(close.segment_id, first.segment_id);
    assert!(matches!(output.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(client.status(), ConnectionStatus::HandshakeComplete);
}

#[tokio::test]
async fn turn_audio_waits_for_turn_complete() {
    let output = RecordingOutput::default();
    let mut client = Client::new(32, config());
    client.set_audio_output(output.clone());
    let (channels, mut peer) = TransportChannels::pair(32);
    client.connect_with_transport(channels).unwrap();
    peer.events.send(TransportEvent::Connected).await.unwrap();
    within(peer.outbound.recv()).await.unwrap();
    send(&peer, r#"{"setupComplete":{}}"#).await;
    let mut status = client.status_changes();
    within(status.wait_for(|s| *s == ConnectionStatus::HandshakeComplete))
        .await
        .unwrap();
    let mut turn_audio = client.turn_audio().unwrap();

    send(&peer, &audio_turn("AQACAA==")).await;
    send(&peer, &audio_turn("AwAEAA==")).await;
    send(&peer, r#"{"serverContent":{"turnComplete":true}}"#).await;

    let audio = within(turn_audio.recv()).await.unwrap();
    assert_eq!(&audio.wav[..4], b"RIFF");
    assert_eq!(&audio.wav[44..], &[1, 0, 2, 0, 3, 0, 4, 0]);
    assert_eq!(audio.format.sample_rate, 24000);

    let played = output.played.lock().unwrap().clone();
    assert_eq!(played.len(), 1);
    assert_eq!(played[0].0, audio.wav);
    assert_eq!(played[0].1, 0.9);
}

#[tokio::test]
async fn threshold_flushes_mid_turn() {
    let config = Config::builder()
        .with_api_key("test-key")
        .with_flush_policy(FlushPolicy::threshold(2).unwrap())
        .build();
    let (client, peer) = ready(config).await;
    let mut turn_audio = client.turn_audio().unwrap();
    let mut output = client.output_transcripts().unwrap();

    send(&peer, &audio_turn("AQACAA==")).await;
    send(&peer, &audio_turn("AwAEAA==")).await;
    let early = within(turn_audio.recv()).await.unwrap();
    assert_eq!(early.wav.len(), 44 + 8);

    // third message plus the turn boundary in one frame
    send(
        &peer,
        r#"{"serverContent":{"modelTurn":{"parts":[{"inlineData":{"mimeType":"audio/pcm","data":"BQAGAA=="}}]},"turnComplete":true}}"#,
    )
    .await;
    let rest = within(turn_audio.recv()).await.unwrap();
    assert_eq!(&rest.wav[44..], &[5, 0, 6, 0]);

    send(&peer, r#"{"serverContent":{"outputTranscription":{"text":"sync"}}}"#).await;
    within(output.recv()).await.unwrap();
    assert!(matches!(turn_audio.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn threshold_and_turn_complete_in_one_frame_flush_once() {
    let config = Config::builder()
        .with_api_key("test-key")
        .with_flush_policy(FlushPolicy::threshold(1).unwrap())
        .build();
    let (client, peer) = ready(config).await;
    let mut turn_audio = client.turn_audio().unwrap();
    let mut output = client.output_transcripts().unwrap();

    send(
        &peer,
        r#"{"serverContent":{"modelTurn":{"parts":[{"inlineData":{"mimeType":"audio/pcm","data":"AQACAA=="}}]},"turnComplete":true}}"#,
    )
    .await;
    send(&peer, r#"{"serverContent":{"outputTranscription":{"text":"sync"}}}"#).await;
    within(output.recv()).await.unwrap();

    within(turn_audio.recv()).await.unwrap();
    assert!(matches!(turn_audio.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn turn_text_is_concatenated() {
    let (client, peer) = ready(config()).await;
    let mut turn_text = client.turn_text().unwrap();

    send(&peer, r#"{"serverContent":{"modelTurn":{"parts":[{"text":"Good "}]}}}"#).await;
    send(&peer, r#"{"serverContent":{"modelTurn":{"parts":[{"text":"morning"}]}}}"#).await;
    send(&peer, r#"{"serverContent":{"turnComplete":true}}"#).await;

    assert_eq!(within(turn_text.recv()).await.unwrap(), "Good morning");
}

#[tokio::test]
async fn usage_is_forwarded_and_totalled() {
    let (client, peer) = ready(config()).await;
    let mut usage = client.usage_metadata().unwrap();

    send(&peer, r#"{"usageMetadata":{"promptTokenCount":10,"responseTokenCount":5,"totalTokenCount":15}}"#).await;
    send(&peer, r#"{"usageMetadata":{"promptTokenCount":1,"responseTokenCount":2,"totalTokenCount":3}}"#).await;

    assert_eq!(within(usage.recv()).await.unwrap().total_token_count(), Some(15));
    assert_eq!(within(usage.recv()).await.unwrap().total_token_count(), Some(3));
    let stats = client.stats();
    assert_eq!(stats.total_tokens(), 18);
    assert_eq!(stats.prompt_tokens(), 11);
    assert_eq!(stats.response_tokens(), 7);
}

#[tokio::test]
async fn usage_totals_saturate_without_ending_the_session() {
    let (client, peer) = ready(config()).await;
    let mut output = client.output_transcripts().unwrap();

    let huge = format!(r#"{{"usageMetadata":{{"totalTokenCount":{}}}}}"#, u64::MAX);
    send(&peer, &huge).await;
    send(&peer, &huge).await;
    send(&peer, r#"{"serverContent":{"outputTranscription":{"text":"sync"}}}"#).await;

    assert_eq!(within(output.recv()).await.unwrap().text, "sync");
    assert_eq!(client.stats().total_tokens(), u64::MAX);
    assert_eq!(client.stats().reports(), 2);
    assert_eq!(client.status(), ConnectionStatus::HandshakeComplete);
}

#[tokio::test]
async fn turns_before_setup_complete_are_not_flushed() {
    let (client, peer, _) = connected(config()).await;
    let mut turn_audio = client.turn_audio().unwrap();
    let mut turn_text = client.turn_text().unwrap();
    let mut output = client.output_transcripts().unwrap();

    send(
        &peer,
        r#"{"serverContent":{"modelTurn":{"parts":[{"text":"early"},{"inlineData":{"mimeType":"audio/pcm","data":"AQACAA=="}}]},"turnComplete":true}}"#,
    )
    .await;
    send(&peer, r#"{"setupComplete":{}}"#).await;
    let mut status = client.status_changes();
    within(status.wait_for(|s| *s == ConnectionStatus::HandshakeComplete))
        .await
        .unwrap();
    send(&peer, r#"{"serverContent":{"turnComplete":true}}"#).await;
    send(&peer, r#"{"serverContent":{"outputTranscription":{"text":"sync"}}}"#).await;
    within(output.recv()).await.unwrap();

    assert!(matches!(turn_audio.try_recv(), Err(TryRecvError::Empty)));
    assert!(matches!(turn_text.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn video_frames_are_sent_as_realtime_input() {
    let (client, mut peer) = ready(config()).await;

    client.send_video_frame(&[0xff, 0xd8], "image/jpeg").await;
    let Some(OutboundFrame::Text(frame)) = within(peer.outbound.recv()).await else {
        panic!("expected video frame");
    };
    let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(json["realtimeInput"]["video"]["data"], "/9g=");
    assert_eq!(json["realtimeInput"]["video"]["mimeType"], "image/jpeg");
}

#[tokio::test]
async fn bad_frames_do_not_end_the_session() {
    let (client, peer) = ready(config()).await;
    let mut input = client.input_transcripts().unwrap();

    send(&peer, "not json at all").await;
    send(&peer, r#"{"goAway":{"timeLeft":"10s"}}"#).await;
    peer.events
        .send(TransportEvent::Binary(
            br#"{"serverContent":{"inputTranscription":{"text":"still here"}}}"#.to_vec(),
        ))
        .await
        .unwrap();

    assert_eq!(within(input.recv()).await.unwrap().text, "still here");
    assert_eq!(client.status(), ConnectionStatus::HandshakeComplete);
}

#[tokio::test]
async fn disconnect_is_idempotent_and_closes_streams() {
    let output = RecordingOutput::default();
    let mut client = Client::new(32, config());
    client.set_audio_output(output.clone());
    let (channels, mut peer) = TransportChannels::pair(32);
    client.connect_with_transport(channels).unwrap();
    peer.events.send(TransportEvent::Connected).await.unwrap();
    within(peer.outbound.recv()).await.unwrap();

    let mut input = client.input_transcripts().unwrap();
    let mut status = client.status_changes();

    client.disconnect();
    client.disconnect();
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
    assert!(matches!(within(input.recv()).await, Err(RecvError::Closed)));
    assert!(matches!(client.output_transcripts(), Err(RealtimeError::NotConnected)));
    assert_eq!(within(peer.outbound.recv()).await, Some(OutboundFrame::Close));

    within(status.wait_for(|s| *s == ConnectionStatus::Disconnected))
        .await
        .unwrap();
    within(client.wait_closed()).await;
    assert!(*output.stopped.lock().unwrap());

    // a fresh session can follow
    let (channels, _peer) = TransportChannels::pair(8);
    client.connect_with_transport(channels).unwrap();
    assert_eq!(client.status(), ConnectionStatus::Connecting);
}

#[tokio::test]
async fn transport_close_tears_the_session_down() {
    let (client, peer) = ready(config()).await;
    let mut output = client.output_transcripts().unwrap();
    let mut status = client.status_changes();

    send(&peer, r#"{"serverContent":{"outputTranscription":{"text":"half a sen"}}}"#).await;
    within(output.recv()).await.unwrap();
    peer.events
        .send(TransportEvent::Closed(Some("going away".to_string())))
        .await
        .unwrap();

    within(status.wait_for(|s| *s == ConnectionStatus::Disconnected))
        .await
        .unwrap();
    assert!(matches!(within(output.recv()).await, Err(RecvError::Closed)));
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn second_connect_is_rejected() {
    let (mut client, _peer, _) = connected(config()).await;
    let (channels, _other) = TransportChannels::pair(8);
    assert!(matches!(
        client.connect_with_transport(channels),
        Err(ConnectError::AlreadyConnected)
    ));
}
