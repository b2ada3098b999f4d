//! Listen command implementation
//!
//! Drives a controller over the manual speech engine. Every stdin line is
//! one recognizer callback:
//!
//! - `open camera`       final result, confidence 1.0
//! - `open camera @0.42` final result with explicit confidence
//! - `~hey vox`          partial result
//! - `!no_match`         recognition error (`!network`, `!speech_timeout`, ...)
//! - `:stop` / `:start`  stop or start listening

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{info, warn};

use vox::config::Config;
use vox::speech::{
    ManualSpeechEngine, RecognitionError, RecognitionResult, SpeechEvent, Transcript,
};
use vox::{CommandAction, Parameters, VoiceController, VoiceEvent};

/// One parsed stdin line
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Speech(SpeechEvent),
    Start,
    Stop,
    Empty,
}

/// Parse one line of the console protocol.
pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }

    match line {
        ":start" => return Input::Start,
        ":stop" => return Input::Stop,
        _ => {}
    }

    if let Some(name) = line.strip_prefix('!') {
        return Input::Speech(SpeechEvent::Error(RecognitionError::from_name(name)));
    }

    if let Some(text) = line.strip_prefix('~') {
        return Input::Speech(SpeechEvent::Result(RecognitionResult::partial_text(
            text.trim(),
        )));
    }

    let (text, confidence) = split_confidence(line);
    Input::Speech(SpeechEvent::Result(RecognitionResult {
        transcripts: vec![Transcript::new(text, confidence)],
        is_final: true,
    }))
}

/// `text @0.42` -> ("text", 0.42). Anything unparsable keeps confidence 1.0.
fn split_confidence(line: &str) -> (&str, f32) {
    if let Some((text, score)) = line.rsplit_once(" @") {
        if let Ok(confidence) = score.trim().parse::<f32>() {
            if (0.0..=1.0).contains(&confidence) {
                return (text.trim_end(), confidence);
            }
        }
    }
    (line, 1.0)
}

/// Human-readable rendering of an event
pub fn describe(event: &VoiceEvent) -> String {
    match event {
        VoiceEvent::WakeWordDetected { wake_word, text } => {
            format!("wake word \"{}\" heard in \"{}\"", wake_word, text)
        }
        VoiceEvent::CommandRecognized { text } => format!("command \"{}\"", text),
        VoiceEvent::CommandExecuted {
            pattern,
            parameters,
        } => {
            if parameters.is_empty() {
                format!("executed \"{}\"", pattern)
            } else {
                let params: Vec<String> = parameters
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect();
                format!("executed \"{}\" ({})", pattern, params.join(", "))
            }
        }
        VoiceEvent::Error { kind, message } => format!("error [{}]: {}", kind, message),
        VoiceEvent::StateChanged { engine, state } => format!("{} engine: {}", engine, state),
        VoiceEvent::BackgroundModeChanged { enabled } => {
            format!("background mode {}", if *enabled { "on" } else { "off" })
        }
    }
}

async fn print_events(mut events: broadcast::Receiver<VoiceEvent>, json: bool) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if json {
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => warn!("Failed to serialize event: {}", e),
                    }
                } else {
                    println!("{}", describe(&event));
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Dropped {} events", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

pub async fn listen_command(
    config_path: Option<&Path>,
    wake_words: Vec<String>,
    json: bool,
) -> Result<()> {
    let mut config = Config::load(config_path)?;
    if !wake_words.is_empty() {
        config.wake.wake_words = wake_words;
    }
    let voice_config = config.voice_config()?;

    let engine = Arc::new(ManualSpeechEngine::new());
    let mut controller = VoiceController::new(engine.clone());
    let printer = tokio::spawn(print_events(controller.subscribe(), json));

    controller
        .initialize(voice_config)
        .await
        .context("Failed to initialize voice controller")?;

    for entry in &config.commands {
        let pattern = entry.pattern.clone();
        let action: Arc<dyn CommandAction> = Arc::new(move |params: &Parameters| {
            info!("Running '{}' with {:?}", pattern, params);
        });
        controller
            .add_command(&entry.pattern, &entry.parameters, action)
            .with_context(|| format!("Invalid command in config: {}", entry.pattern))?;
    }

    if config.background_mode {
        controller.set_background_mode(true).await?;
    }

    controller.start().await?;
    eprintln!(
        "Listening for {:?}. Commands: {}",
        config.wake.wake_words,
        controller.available_commands().join(", ")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        match parse_line(&line) {
            Input::Empty => {}
            Input::Start => {
                if let Err(e) = controller.start().await {
                    eprintln!("{}", e);
                }
            }
            Input::Stop => {
                if let Err(e) = controller.stop().await {
                    eprintln!("{}", e);
                }
            }
            Input::Speech(event) => {
                if !engine.emit(event) {
                    eprintln!("(not listening)");
                }
            }
        }
    }

    controller.shutdown().await;
    drop(controller);
    if let Err(e) = printer.await {
        warn!("Event printer failed: {}", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox::voice::{EngineKind, ListeningState};
    use vox::ErrorKind;

    fn final_result(text: &str, confidence: f32) -> Input {
        Input::Speech(SpeechEvent::Result(RecognitionResult::final_text(
            text, confidence,
        )))
    }

    #[test]
    fn test_parse_plain_line_is_final_result() {
        assert_eq!(parse_line("  open camera "), final_result("open camera", 1.0));
    }

    #[test]
    fn test_parse_explicit_confidence() {
        assert_eq!(parse_line("open camera @0.42"), final_result("open camera", 0.42));
        // Out of range stays part of the text
        assert_eq!(
            parse_line("meet me @7"),
            final_result("meet me @7", 1.0)
        );
    }

    #[test]
    fn test_parse_partial_error_and_controls() {
        assert_eq!(
            parse_line("~hey vox"),
            Input::Speech(SpeechEvent::Result(RecognitionResult::partial_text(
                "hey vox"
            )))
        );
        assert_eq!(
            parse_line("!no_match"),
            Input::Speech(SpeechEvent::Error(RecognitionError::NoMatch))
        );
        assert_eq!(parse_line(":stop"), Input::Stop);
        assert_eq!(parse_line(":start"), Input::Start);
        assert_eq!(parse_line("   "), Input::Empty);
    }

    #[test]
    fn test_describe_events() {
        let mut parameters = Parameters::new();
        parameters.insert("level".to_string(), "42".to_string());
        assert_eq!(
            describe(&VoiceEvent::CommandExecuted {
                pattern: "set volume to {level}".to_string(),
                parameters,
            }),
            "executed \"set volume to {level}\" (level=42)"
        );
        assert_eq!(
            describe(&VoiceEvent::StateChanged {
                engine: EngineKind::Wake,
                state: ListeningState::Listening,
            }),
            "wake engine: Listening"
        );
        assert_eq!(
            describe(&VoiceEvent::Error {
                kind: ErrorKind::Timeout,
                message: "No command recognized within 5000 ms".to_string(),
            }),
            "error [timeout]: No command recognized within 5000 ms"
        );
    }
}
