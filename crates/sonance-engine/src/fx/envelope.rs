//! Envelope follower.

use sonance_core::{Error, ReadResult, Reader, Result, Specs};

/// Replaces the signal with its smoothed magnitude envelope.
///
/// Per channel: `y = c * (y_prev - x') + x'` where `x' = |x|` zeroed below
/// `threshold` and `c` is the attack coefficient while rising, the release
/// coefficient while falling. Coefficients derive from
/// `arthreshold^(1 / (rate * time))`.
pub struct EnvelopeReader {
    reader: Box<dyn Reader>,
    attack_coeff: f32,
    release_coeff: f32,
    threshold: f32,
    state: Vec<f32>,
}

impl EnvelopeReader {
    pub fn new(
        reader: Box<dyn Reader>,
        attack: f64,
        release: f64,
        threshold: f32,
        arthreshold: f32,
    ) -> Result<Self> {
        if !(arthreshold > 0.0) || !(arthreshold < 1.0) {
            return Err(Error::specs(format!(
                "envelope arthreshold must be within (0, 1), got {arthreshold}"
            )));
        }
        if !(threshold >= 0.0) {
            return Err(Error::specs("envelope threshold must be non-negative"));
        }
        let rate = reader.specs().rate as f64;
        let coeff = |time: f64| -> f32 {
            if time <= 0.0 {
                0.0
            } else {
                (arthreshold as f64).powf(1.0 / (rate * time)) as f32
            }
        };
        let channels = reader.specs().channels();
        Ok(Self {
            attack_coeff: coeff(attack),
            release_coeff: coeff(release),
            threshold,
            state: vec![0.0; channels],
            reader,
        })
    }
}

impl Reader for EnvelopeReader {
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
            self.state.fill(0.0);
        }
        applied
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let channels = self.state.len();
        let result = self.reader.read(out);

        for frame in 0..result.frames {
            for channel in 0..channels {
                let sample = &mut out[frame * channels + channel];
                let mut magnitude = sample.abs();
                if magnitude < self.threshold {
                    magnitude = 0.0;
                }
                let previous = self.state[channel];
                let coeff = if magnitude > previous {
                    self.attack_coeff
                } else {
                    self.release_coeff
                };
                let value = coeff * (previous - magnitude) + magnitude;
                self.state[channel] = value;
                *sample = value;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::EnvelopeReader;
    use crate::source::MemorySound;
    use sonance_core::{ChannelLayout, Reader, Sound, Specs};

    #[test]
    fn follows_magnitude_and_decays() {
        let mut samples = vec![1.0f32; 10];
        samples.extend(std::iter::repeat(0.0).take(30));
        let sound = MemorySound::from_frames(samples, Specs::new(100, ChannelLayout::Mono))
            .expect("whole frames");
        let mut reader = EnvelopeReader::new(
            sound.create_reader().expect("reader"),
            0.01,
            0.1,
            0.0,
            0.01,
        )
        .expect("valid envelope");

        let mut out = vec![0.0f32; 40];
        reader.read(&mut out);

        // Attack pulls the envelope up toward 1 within the burst.
        assert!(out[9] > 0.9);
        // Release lets it decay smoothly but not instantly.
        assert!(out[12] < out[9]);
        assert!(out[12] > 0.0);
        assert!(out[39] < out[12]);
        // Envelope is non-negative by construction.
        assert!(out.iter().all(|&v| v >= 0.0));
    }
}
