use crate::voice::VoiceError;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Sample rate the transcription endpoint expects.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Encodes mono samples as 16-bit PCM WAV, resampling to 16 kHz first.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, VoiceError> {
    let resampled = resample(samples, sample_rate, TARGET_SAMPLE_RATE);
    let spec = WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for &sample in &resampled {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

/// Linear interpolation resampler.
pub fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || input.is_empty() || from_rate == 0 || to_rate == 0 {
        return input.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (input.len() as f64 / ratio) as usize;
    let last = input.len() - 1;

    (0..output_len)
        .map(|i| {
            let position = i as f64 * ratio;
            let floor = (position.floor() as usize).min(last);
            let ceil = (floor + 1).min(last);
            let frac = (position - floor as f64) as f32;
            input[floor] * (1.0 - frac) + input[ceil] * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{encode_wav, resample, TARGET_SAMPLE_RATE};
    use std::io::Cursor;

    #[test]
    fn resample_downsamples_by_rate_ratio() {
        let input: Vec<f32> = (0..4800).map(|i| (i as f32 / 4800.0) - 0.5).collect();
        let output = resample(&input, 48_000, 16_000);
        assert_eq!(output.len(), 1600);
        assert!((output[0] - input[0]).abs() < f32::EPSILON);
    }

    #[test]
    fn encoded_clip_is_16khz_mono_pcm() {
        let samples = vec![0.25_f32; 48_000];
        let bytes = encode_wav(&samples, 48_000).expect("encoding should succeed");
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");

        let reader = hound::WavReader::new(Cursor::new(bytes)).expect("valid wav");
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.duration(), 16_000);
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let bytes = encode_wav(&[2.0, -2.0], TARGET_SAMPLE_RATE).expect("encoding should succeed");
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).expect("valid wav");
        let samples: Vec<i16> = reader
            .samples::<i16>()
            .collect::<Result<_, _>>()
            .expect("samples should decode");
        assert_eq!(samples, vec![i16::MAX, -i16::MAX]);
    }
}
