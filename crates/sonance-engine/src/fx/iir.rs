//! Generic IIR filtering and the biquad presets built on it.

use sonance_core::{Error, ReadResult, Reader, Result, Specs};

/// Direct-form II transposed filter with user-supplied coefficients.
///
/// `b` are the numerator coefficients, `a` the denominator; `a[0]` is
/// normalized away and an empty `a` makes the filter FIR.
pub struct IirFilterReader {
    reader: Box<dyn Reader>,
    b: Vec<f32>,
    a: Vec<f32>,
    state: Vec<Vec<f32>>,
}

impl IirFilterReader {
    pub fn new(reader: Box<dyn Reader>, b: Vec<f32>, a: Vec<f32>) -> Result<Self> {
        if b.is_empty() {
            return Err(Error::specs("filter numerator coefficients are required"));
        }

        let (mut b, mut a) = (b, a);
        if let Some(&a0) = a.first() {
            if a0 == 0.0 {
                return Err(Error::specs("filter a[0] must be non-zero"));
            }
            if a0 != 1.0 {
                for coeff in &mut b {
                    *coeff /= a0;
                }
                for coeff in &mut a {
                    *coeff /= a0;
                }
            }
        }

        let order = b.len().max(a.len().max(1)) - 1;
        let channels = reader.specs().channels();
        Ok(Self {
            reader,
            b,
            a,
            state: vec![vec![0.0; order]; channels],
        })
    }

    /// RBJ lowpass biquad with cutoff `frequency` and quality `q`.
    pub fn lowpass(reader: Box<dyn Reader>, frequency: f32, q: f32) -> Result<Self> {
        let (b, a) = biquad_coefficients(reader.specs().rate, frequency, q, false)?;
        Self::new(reader, b, a)
    }

    /// RBJ highpass biquad with cutoff `frequency` and quality `q`.
    pub fn highpass(reader: Box<dyn Reader>, frequency: f32, q: f32) -> Result<Self> {
        let (b, a) = biquad_coefficients(reader.specs().rate, frequency, q, true)?;
        Self::new(reader, b, a)
    }

    fn filter_sample(&mut self, channel: usize, x: f32) -> f32 {
        let state = &mut self.state[channel];
        let order = state.len();
        if order == 0 {
            return self.b[0] * x;
        }

        let y = self.b[0] * x + state[0];
        for i in 0..order {
            let next = if i + 1 < order { state[i + 1] } else { 0.0 };
            let feed = self.b.get(i + 1).copied().unwrap_or(0.0) * x;
            let back = self.a.get(i + 1).copied().unwrap_or(0.0) * y;
            state[i] = feed - back + next;
        }
        y
    }
}

impl Reader for IirFilterReader {
    fn specs(&self) -> Specs {
        self.reader.specs()
    }

    fn length(&self) -> Option<u64> {
        self.reader.length()
    }

    fn position(&self) -> u64 {
        self.reader.position()
    }

    fn seekable(&self) -> bool {
        self.reader.seekable()
    }

    fn seek(&mut self, frame: u64) -> bool {
        let applied = self.reader.seek(frame);
        if applied {
            for state in &mut self.state {
                state.fill(0.0);
            }
        }
        applied
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let channels = self.state.len();
        let result = self.reader.read(out);

        for frame in 0..result.frames {
            for channel in 0..channels {
                let index = frame * channels + channel;
                out[index] = self.filter_sample(channel, out[index]);
            }
        }
        result
    }
}

/// Standard RBJ cookbook biquad, normalized by `a0`.
fn biquad_coefficients(
    rate: u32,
    frequency: f32,
    q: f32,
    highpass: bool,
) -> Result<(Vec<f32>, Vec<f32>)> {
    if !(frequency > 0.0) || frequency * 2.0 > rate as f32 {
        return Err(Error::specs(format!(
            "cutoff frequency {frequency} is outside (0, rate/2] for rate {rate}"
        )));
    }
    if !(q > 0.0) {
        return Err(Error::specs(format!(
            "filter quality must be positive, got {q}"
        )));
    }

    let w0 = std::f32::consts::TAU * frequency / rate as f32;
    let alpha = w0.sin() / (2.0 * q);
    let cos_w0 = w0.cos();

    let b = if highpass {
        vec![(1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0]
    } else {
        vec![(1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0]
    };
    let a = vec![1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha];
    Ok((b, a))
}

#[cfg(test)]
mod tests {
    use super::IirFilterReader;
    use crate::generator::{Oscillator, Waveform};
    use crate::source::MemorySound;
    use sonance_core::{ChannelLayout, Reader, Sound, Specs};

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn fir_moving_average() {
        let sound = MemorySound::from_frames(
            vec![1.0, 1.0, 1.0, 1.0],
            Specs::new(10, ChannelLayout::Mono),
        )
        .expect("whole frames");
        let mut reader = IirFilterReader::new(
            sound.create_reader().expect("reader"),
            vec![0.5, 0.5],
            vec![],
        )
        .expect("valid filter");

        let mut out = vec![0.0f32; 4];
        reader.read(&mut out);
        assert_eq!(out, vec![0.5, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn a0_is_normalized() {
        let sound = MemorySound::from_frames(vec![2.0, 0.0], Specs::new(10, ChannelLayout::Mono))
            .expect("whole frames");
        let mut reader =
            IirFilterReader::new(sound.create_reader().expect("reader"), vec![1.0], vec![2.0])
                .expect("valid filter");
        let mut out = vec![0.0f32; 2];
        reader.read(&mut out);
        assert_eq!(out, vec![1.0, 0.0]);
    }

    #[test]
    fn lowpass_attenuates_high_frequencies() {
        let make = |frequency: f32| {
            let sound = Oscillator::new(Waveform::Sine, frequency, 48_000);
            IirFilterReader::lowpass(sound.create_reader().expect("reader"), 1000.0, 1.0)
                .expect("valid filter")
        };

        let mut low = make(100.0);
        let mut high = make(20_000.0);
        let mut low_out = vec![0.0f32; 48_000];
        let mut high_out = vec![0.0f32; 48_000];
        low.read(&mut low_out);
        high.read(&mut high_out);

        // Skip the transient before measuring.
        assert!(rms(&low_out[4800..]) > 0.6);
        assert!(rms(&high_out[4800..]) < 0.05);
    }

    #[test]
    fn highpass_attenuates_low_frequencies() {
        let sound = Oscillator::new(Waveform::Sine, 50.0, 48_000);
        let mut reader =
            IirFilterReader::highpass(sound.create_reader().expect("reader"), 2000.0, 1.0)
                .expect("valid filter");
        let mut out = vec![0.0f32; 48_000];
        reader.read(&mut out);
        assert!(rms(&out[4800..]) < 0.05);
    }

    #[test]
    fn empty_numerator_is_rejected() {
        let sound = MemorySound::from_frames(vec![0.0], Specs::new(10, ChannelLayout::Mono))
            .expect("whole frames");
        assert!(
            IirFilterReader::new(sound.create_reader().expect("reader"), vec![], vec![1.0])
                .is_err()
        );
    }
}
