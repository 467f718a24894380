//! Sign quantization.

use sonance_core::{ReadResult, Reader, Specs};

/// Quantizes samples to -1, 0 or +1 around a symmetric threshold.
pub struct ThresholdReader {
    reader: Box<dyn Reader>,
    threshold: f32,
}

impl ThresholdReader {
    pub fn new(reader: Box<dyn Reader>, threshold: f32) -> Self {
        Self {
            reader,
            threshold: threshold.abs(),
        }
    }
}

impl Reader for ThresholdReader {
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
        let result = self.reader.read(out);
        let produced = result.frames * self.specs().channels();
        for sample in &mut out[..produced] {
            *sample = if *sample > self.threshold {
                1.0
            } else if *sample < -self.threshold {
                -1.0
            } else {
                0.0
            };
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::ThresholdReader;
    use crate::source::MemorySound;
    use sonance_core::{ChannelLayout, Reader, Sound, Specs};

    #[test]
    fn quantizes_to_sign() {
        let sound = MemorySound::from_frames(
            vec![0.7, -0.7, 0.0, 0.1, -0.1],
            Specs::new(10, ChannelLayout::Mono),
        )
        .expect("whole frames");
        let mut reader = ThresholdReader::new(sound.create_reader().expect("reader"), 0.5);
        let mut out = vec![0.0f32; 5];
        reader.read(&mut out);
        assert_eq!(out, vec![1.0, -1.0, 0.0, 0.0, 0.0]);
    }
}
