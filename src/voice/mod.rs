//! Voice input: a secondary source feeding the same submission path as typed
//! text.

pub mod capture;
pub mod wav;

pub use capture::{CapturedAudio, CpalMicrophone, Microphone};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("no microphone input device is available")]
    NoInputDevice,
    #[error("microphone configuration unavailable: {0}")]
    DeviceConfig(String),
    #[error("unsupported microphone sample format: {0}")]
    UnsupportedFormat(String),
    #[error("microphone stream failed: {0}")]
    Stream(String),
    #[error("speech recognizer failed: {0}")]
    #[cfg_attr(not(test), allow(dead_code))]
    Recognizer(String),
    #[error("failed to encode recording: {0}")]
    Encode(#[from] hound::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSegment {
    pub text: String,
    pub is_final: bool,
}

#[cfg_attr(not(test), allow(dead_code))]
impl TranscriptSegment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// In-process speech-to-text. When one is installed, recording sessions
/// produce text locally instead of uploading audio.
///
/// The desktop build ships without a local engine: `main` passes `None`, so
/// sessions record and upload WAV for server-side transcription. Engines plug
/// in here; the segment constructors and `VoiceError::Recognizer` exist for
/// them.
pub trait SpeechRecognizer {
    fn start(&mut self) -> Result<(), VoiceError>;

    /// Segments recognised since the last call.
    fn drain(&mut self) -> Vec<TranscriptSegment>;

    /// Ends the session and returns any trailing segments.
    fn stop(&mut self) -> Vec<TranscriptSegment>;
}

/// Accumulates recogniser output: final segments in order plus the latest
/// interim guess.
#[derive(Debug, Default, Clone)]
pub struct TranscriptBuffer {
    finals: Vec<String>,
    interim: Option<String>,
}

impl TranscriptBuffer {
    pub fn extend(&mut self, segments: impl IntoIterator<Item = TranscriptSegment>) {
        for segment in segments {
            let text = segment.text.trim();
            if text.is_empty() {
                continue;
            }
            if segment.is_final {
                self.finals.push(text.to_string());
                self.interim = None;
            } else {
                self.interim = Some(text.to_string());
            }
        }
    }

    /// Final segments joined, or the last interim guess when nothing is final.
    pub fn text(&self) -> Option<String> {
        if !self.finals.is_empty() {
            return Some(self.finals.join(" "));
        }
        self.interim.clone()
    }

    /// What to show while still listening.
    pub fn live_text(&self) -> String {
        let mut parts = self.finals.clone();
        if let Some(interim) = &self.interim {
            parts.push(interim.clone());
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceMode {
    Recognition,
    Recording,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOutcome {
    /// Nothing was recording.
    Idle,
    /// A local transcript to submit as a chat message.
    Submit(String),
    /// A WAV clip to send for server-side transcription.
    Upload(Vec<u8>),
    NotUnderstood,
}

struct ActiveSession {
    mode: VoiceMode,
    transcript: TranscriptBuffer,
}

pub struct VoiceCapture {
    microphone: Box<dyn Microphone>,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    session: Option<ActiveSession>,
}

impl VoiceCapture {
    pub fn new(
        microphone: Box<dyn Microphone>,
        recognizer: Option<Box<dyn SpeechRecognizer>>,
    ) -> Self {
        Self {
            microphone,
            recognizer,
            session: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn mode(&self) -> Option<VoiceMode> {
        self.session.as_ref().map(|session| session.mode)
    }

    pub fn start(&mut self) -> Result<VoiceMode, VoiceError> {
        if let Some(session) = &self.session {
            return Ok(session.mode);
        }

        self.microphone.open()?;

        let mode = match self.recognizer.as_mut() {
            Some(recognizer) => match recognizer.start() {
                Ok(()) => VoiceMode::Recognition,
                Err(err) => {
                    tracing::warn!("speech recognizer unavailable, recording instead: {err}");
                    VoiceMode::Recording
                }
            },
            None => VoiceMode::Recording,
        };

        tracing::info!(?mode, "voice capture started");
        self.session = Some(ActiveSession {
            mode,
            transcript: TranscriptBuffer::default(),
        });
        Ok(mode)
    }

    /// Pulls pending recogniser segments; call once per frame while recording.
    pub fn poll(&mut self) {
        let (Some(session), Some(recognizer)) = (self.session.as_mut(), self.recognizer.as_mut())
        else {
            return;
        };
        if session.mode == VoiceMode::Recognition {
            session.transcript.extend(recognizer.drain());
        }
    }

    pub fn live_transcript(&self) -> Option<String> {
        let session = self.session.as_ref()?;
        let text = session.transcript.live_text();
        (!text.is_empty()).then_some(text)
    }

    /// Ends the session. The microphone and recogniser are released before
    /// anything else happens, whatever the outcome.
    pub fn stop(&mut self) -> Result<VoiceOutcome, VoiceError> {
        let Some(mut session) = self.session.take() else {
            return Ok(VoiceOutcome::Idle);
        };

        let audio = self.microphone.close();
        if session.mode == VoiceMode::Recognition {
            if let Some(recognizer) = self.recognizer.as_mut() {
                let mut trailing = recognizer.drain();
                trailing.extend(recognizer.stop());
                session.transcript.extend(trailing);
            }
        }
        tracing::info!(mode = ?session.mode, samples = audio.samples.len(), "voice capture stopped");

        match session.mode {
            VoiceMode::Recognition => Ok(match session.transcript.text() {
                Some(text) => VoiceOutcome::Submit(text),
                None => VoiceOutcome::NotUnderstood,
            }),
            VoiceMode::Recording if audio.samples.is_empty() => Ok(VoiceOutcome::NotUnderstood),
            VoiceMode::Recording => {
                let bytes = wav::encode_wav(&audio.samples, audio.sample_rate)?;
                Ok(VoiceOutcome::Upload(bytes))
            }
        }
    }
}

impl Drop for VoiceCapture {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.microphone.close();
            if session.mode == VoiceMode::Recognition {
                if let Some(recognizer) = self.recognizer.as_mut() {
                    recognizer.stop();
                }
            }
        }
    }
}
