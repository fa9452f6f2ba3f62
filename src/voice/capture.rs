use crate::voice::VoiceError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mono samples captured between `open` and `close`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// An exclusive microphone input stream.
pub trait Microphone {
    /// Acquires the input device and starts buffering. On error nothing stays
    /// acquired.
    fn open(&mut self) -> Result<(), VoiceError>;

    /// Releases the stream and hands back whatever was captured. Safe to call
    /// when not open.
    fn close(&mut self) -> CapturedAudio;
}

/// Default input device via cpal, downmixed to mono.
pub struct CpalMicrophone {
    buffer: Arc<Mutex<Vec<f32>>>,
    is_recording: Arc<AtomicBool>,
    stream: Option<Stream>,
    sample_rate: u32,
}

impl CpalMicrophone {
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Vec::new())),
            is_recording: Arc::new(AtomicBool::new(false)),
            stream: None,
            sample_rate: 0,
        }
    }

    fn build_stream<T>(&self, device: &Device, config: &StreamConfig) -> Result<Stream, VoiceError>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let buffer = Arc::clone(&self.buffer);
        let is_recording = Arc::clone(&self.is_recording);
        let channels = usize::from(config.channels.max(1));

        device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    if !is_recording.load(Ordering::SeqCst) {
                        return;
                    }
                    if let Ok(mut buffer) = buffer.lock() {
                        for frame in data.chunks(channels) {
                            let sum: f32 = frame.iter().map(|sample| sample.to_sample::<f32>()).sum();
                            buffer.push(sum / frame.len() as f32);
                        }
                    }
                },
                |err| tracing::error!("audio capture error: {err}"),
                None,
            )
            .map_err(|err| VoiceError::Stream(err.to_string()))
    }
}

impl Default for CpalMicrophone {
    fn default() -> Self {
        Self::new()
    }
}

impl Microphone for CpalMicrophone {
    fn open(&mut self) -> Result<(), VoiceError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(VoiceError::NoInputDevice)?;
        let supported = device
            .default_input_config()
            .map_err(|err| VoiceError::DeviceConfig(err.to_string()))?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();

        tracing::info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            "opening microphone"
        );

        match self.buffer.lock() {
            Ok(mut buffer) => buffer.clear(),
            Err(_) => return Err(VoiceError::Stream("audio buffer poisoned".to_string())),
        }

        let stream = match sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(&device, &config)?,
            SampleFormat::I16 => self.build_stream::<i16>(&device, &config)?,
            SampleFormat::U16 => self.build_stream::<u16>(&device, &config)?,
            other => return Err(VoiceError::UnsupportedFormat(format!("{other:?}"))),
        };

        self.is_recording.store(true, Ordering::SeqCst);
        if let Err(err) = stream.play() {
            self.is_recording.store(false, Ordering::SeqCst);
            return Err(VoiceError::Stream(err.to_string()));
        }

        self.sample_rate = config.sample_rate.0;
        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) -> CapturedAudio {
        self.is_recording.store(false, Ordering::SeqCst);
        let had_stream = self.stream.take().is_some();

        let samples = match self.buffer.lock() {
            Ok(mut buffer) => std::mem::take(&mut *buffer),
            Err(_) => Vec::new(),
        };

        if had_stream {
            tracing::info!(
                samples = samples.len(),
                sample_rate = self.sample_rate,
                "microphone released"
            );
        }

        CapturedAudio {
            samples,
            sample_rate: self.sample_rate,
        }
    }
}

impl Drop for CpalMicrophone {
    fn drop(&mut self) {
        self.is_recording.store(false, Ordering::SeqCst);
        self.stream = None;
    }
}
