//! Pitch shift by virtual sample-rate scaling.

use sonance_core::{Error, ReadResult, Reader, Result, Specs};

/// Scales the advertised sample rate by a factor without resampling.
///
/// A downstream rate converter turns the scaled rate back into real
/// playback speed, which is what shifts the pitch.
pub struct PitchReader {
    reader: Box<dyn Reader>,
    rate: u32,
}

impl PitchReader {
    pub fn new(reader: Box<dyn Reader>, factor: f64) -> Result<Self> {
        if !(factor > 0.0) {
            return Err(Error::specs(format!(
                "pitch factor must be positive, got {factor}"
            )));
        }
        let rate = (reader.specs().rate as f64 * factor).round() as u32;
        if rate == 0 {
            return Err(Error::specs(format!(
                "pitch factor {factor} collapses the sample rate to zero"
            )));
        }
        Ok(Self { reader, rate })
    }
}

impl Reader for PitchReader {
    fn specs(&self) -> Specs {
        Specs::new(self.rate, self.reader.specs().layout)
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
        self.reader.seek(frame)
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        self.reader.read(out)
    }
}
