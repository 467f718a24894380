//! Linear fade in/out.

use sonance_core::{Error, ReadResult, Reader, Result, Specs};

/// Which side of the ramp the fade applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    /// Silent before `start`, unity after `start + length`.
    In,
    /// Unity before `start`, silent after `start + length`.
    Out,
}

/// Applies a linear gain ramp over `[start, start + length)` seconds.
pub struct FadeReader {
    reader: Box<dyn Reader>,
    direction: FadeDirection,
    start: f64,
    length: f64,
}

impl FadeReader {
    pub fn new(
        reader: Box<dyn Reader>,
        direction: FadeDirection,
        start: f64,
        length: f64,
    ) -> Result<Self> {
        if !(start >= 0.0) || !(length >= 0.0) {
            return Err(Error::specs(format!(
                "fade start and length must be non-negative, got start={start} length={length}"
            )));
        }
        Ok(Self {
            reader,
            direction,
            start,
            length,
        })
    }

    pub fn fade_in(reader: Box<dyn Reader>, start: f64, length: f64) -> Result<Self> {
        Self::new(reader, FadeDirection::In, start, length)
    }

    pub fn fade_out(reader: Box<dyn Reader>, start: f64, length: f64) -> Result<Self> {
        Self::new(reader, FadeDirection::Out, start, length)
    }

    fn gain_at(&self, seconds: f64) -> f32 {
        let ramp = if seconds <= self.start {
            0.0
        } else if seconds >= self.start + self.length {
            1.0
        } else {
            (seconds - self.start) / self.length
        };
        match self.direction {
            FadeDirection::In => ramp as f32,
            FadeDirection::Out => (1.0 - ramp) as f32,
        }
    }
}

impl Reader for FadeReader {
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
        self.reader.seek(frame)
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let channels = self.specs().channels();
        let rate = self.specs().rate as f64;
        let start_frame = self.reader.position();
        let result = self.reader.read(out);

        for frame in 0..result.frames {
            let seconds = (start_frame + frame as u64) as f64 / rate;
            let gain = self.gain_at(seconds);
            for sample in &mut out[frame * channels..(frame + 1) * channels] {
                *sample *= gain;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::FadeReader;
    use crate::source::MemorySound;
    use sonance_core::{ChannelLayout, Reader, Sound, Specs};

    fn ones(frames: usize) -> MemorySound {
        MemorySound::from_frames(vec![1.0; frames], Specs::new(10, ChannelLayout::Mono))
            .expect("whole frames")
    }

    #[test]
    fn fade_in_ramps_up() {
        // Ramp over the first second: frames 0..10.
        let mut reader =
            FadeReader::fade_in(ones(20).create_reader().expect("reader"), 0.0, 1.0)
                .expect("valid fade");
        let mut out = vec![0.0f32; 20];
        reader.read(&mut out);

        assert_eq!(out[0], 0.0);
        assert!((out[5] - 0.5).abs() < 1e-6);
        assert_eq!(out[10], 1.0);
        assert_eq!(out[19], 1.0);
    }

    #[test]
    fn fade_out_ramps_down_and_stays_silent() {
        let mut reader =
            FadeReader::fade_out(ones(20).create_reader().expect("reader"), 0.5, 0.5)
                .expect("valid fade");
        let mut out = vec![0.0f32; 20];
        reader.read(&mut out);

        assert_eq!(out[0], 1.0);
        assert_eq!(out[4], 1.0);
        assert!((out[7] - 0.6).abs() < 1e-6);
        assert_eq!(out[10], 0.0);
        assert_eq!(out[19], 0.0);
    }
}
