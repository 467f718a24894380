//! Periodic waveform generators.

use sonance_core::{
    ChannelLayout, Error, ReadResult, Reader, Result, Sound, Specs,
};

/// Waveform shape of an [`Oscillator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Sample value at phase `p` in `[0, 1)`.
    fn sample(self, phase: f64) -> f32 {
        match self {
            Self::Sine => (phase * std::f64::consts::TAU).sin() as f32,
            Self::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            },
            Self::Sawtooth => (2.0 * phase - 1.0) as f32,
            Self::Triangle => (4.0 * (phase - 0.5).abs() - 1.0) as f32,
        }
    }
}

/// An infinite mono generator sound at a fixed frequency and rate.
#[derive(Debug, Clone, Copy)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    rate: u32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32, rate: u32) -> Self {
        Self {
            waveform,
            frequency,
            rate,
        }
    }

    pub fn sine(frequency: f32, rate: u32) -> Self {
        Self::new(Waveform::Sine, frequency, rate)
    }

    pub fn square(frequency: f32, rate: u32) -> Self {
        Self::new(Waveform::Square, frequency, rate)
    }

    pub fn sawtooth(frequency: f32, rate: u32) -> Self {
        Self::new(Waveform::Sawtooth, frequency, rate)
    }

    pub fn triangle(frequency: f32, rate: u32) -> Self {
        Self::new(Waveform::Triangle, frequency, rate)
    }
}

impl Sound for Oscillator {
    fn create_reader(&self) -> Result<Box<dyn Reader>> {
        Ok(Box::new(OscillatorReader::new(
            self.waveform,
            self.frequency,
            self.rate,
        )?))
    }
}

/// Streams one waveform; infinite and seekable.
#[derive(Debug)]
pub struct OscillatorReader {
    waveform: Waveform,
    frequency: f64,
    rate: u32,
    position: u64,
}

impl OscillatorReader {
    pub fn new(waveform: Waveform, frequency: f32, rate: u32) -> Result<Self> {
        if rate == 0 {
            return Err(Error::specs("oscillator sample rate must be positive"));
        }
        if !(frequency > 0.0) {
            return Err(Error::specs(format!(
                "oscillator frequency must be positive, got {frequency}"
            )));
        }
        Ok(Self {
            waveform,
            frequency: frequency as f64,
            rate,
            position: 0,
        })
    }
}

impl Reader for OscillatorReader {
    fn specs(&self) -> Specs {
        Specs::new(self.rate, ChannelLayout::Mono)
    }

    fn length(&self) -> Option<u64> {
        None
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seekable(&self) -> bool {
        true
    }

    fn seek(&mut self, frame: u64) -> bool {
        self.position = frame;
        true
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let step = self.frequency / self.rate as f64;
        for (i, sample) in out.iter_mut().enumerate() {
            let phase = ((self.position + i as u64) as f64 * step).fract();
            *sample = self.waveform.sample(phase);
        }
        self.position += out.len() as u64;
        ReadResult::new(out.len(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::{Oscillator, OscillatorReader, Waveform};
    use sonance_core::{Reader, Sound};

    #[test]
    fn sine_is_periodic_and_bounded() {
        let mut reader = OscillatorReader::new(Waveform::Sine, 100.0, 1000).expect("valid params");
        let mut out = vec![0.0f32; 1000];
        let result = reader.read(&mut out);
        assert_eq!(result.frames, 1000);
        assert!(!result.eos);
        for &sample in &out {
            assert!(sample.abs() <= 1.0);
        }
        // One period is ten samples at this ratio.
        assert!((out[0] - out[10]).abs() < 1e-5);
    }

    #[test]
    fn square_alternates_sign_at_half_period() {
        let mut reader = OscillatorReader::new(Waveform::Square, 100.0, 1000).expect("valid params");
        let mut out = vec![0.0f32; 10];
        reader.read(&mut out);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[5], -1.0);
    }

    #[test]
    fn seek_is_observable() {
        let mut reader =
            OscillatorReader::new(Waveform::Sawtooth, 440.0, 48_000).expect("valid params");
        assert!(reader.seek(1234));
        assert_eq!(reader.position(), 1234);
    }

    #[test]
    fn independent_readers_do_not_share_position() {
        let sound = Oscillator::sine(440.0, 48_000);
        let mut a = sound.create_reader().expect("reader");
        let b = sound.create_reader().expect("reader");
        let mut out = vec![0.0f32; 16];
        a.read(&mut out);
        assert_eq!(a.position(), 16);
        assert_eq!(b.position(), 0);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(OscillatorReader::new(Waveform::Sine, 0.0, 48_000).is_err());
        assert!(OscillatorReader::new(Waveform::Sine, 440.0, 0).is_err());
    }
}
