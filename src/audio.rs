//! Audio frames and the pre-processing hook.
//!
//! Capture devices belong to the platform layer. Frames handed to the
//! controller pass through an [`AudioPreprocessor`] before they reach the
//! speech engine; the default preprocessor leaves them untouched.

/// Capture format expected by speech engines (16 kHz mono, 16-bit PCM)
pub const SAMPLE_RATE: u32 = 16_000;

/// A block of mono PCM samples
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl AudioFrame {
    pub fn new(samples: Vec<i16>) -> Self {
        Self {
            samples,
            sample_rate: SAMPLE_RATE,
        }
    }

    /// Decode little-endian 16-bit PCM bytes. A trailing odd byte is ignored.
    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self::new(samples)
    }

    /// Frame duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }

    pub fn level(&self) -> f32 {
        rms_level(&self.samples)
    }
}

/// Root-mean-square level of the samples, scaled to [0, 1].
pub fn rms_level(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (sum / samples.len() as f64).sqrt();
    (rms / i16::MAX as f64).min(1.0) as f32
}

/// Hook applied to every frame before it reaches the speech engine
pub trait AudioPreprocessor: Send {
    fn process(&mut self, frame: AudioFrame) -> AudioFrame;
}

/// Leaves frames unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl AudioPreprocessor for PassThrough {
    fn process(&mut self, frame: AudioFrame) -> AudioFrame {
        frame
    }
}
