//! Running sample sum.

use sonance_core::{ReadResult, Reader, Specs};

/// Outputs the running sum of input samples, per channel.
pub struct SumReader {
    reader: Box<dyn Reader>,
    sum: Vec<f32>,
}

impl SumReader {
    pub fn new(reader: Box<dyn Reader>) -> Self {
        let channels = reader.specs().channels();
        Self {
            reader,
            sum: vec![0.0; channels],
        }
    }
}

impl Reader for SumReader {
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
            self.sum.fill(0.0);
        }
        applied
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let channels = self.sum.len();
        let result = self.reader.read(out);

        for frame in 0..result.frames {
            for channel in 0..channels {
                let index = frame * channels + channel;
                self.sum[channel] += out[index];
                out[index] = self.sum[channel];
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::SumReader;
    use crate::source::MemorySound;
    use sonance_core::{ChannelLayout, Reader, Sound, Specs};

    #[test]
    fn accumulates_per_channel() {
        let sound = MemorySound::from_frames(
            vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0],
            Specs::new(10, ChannelLayout::Stereo),
        )
        .expect("whole frames");
        let mut reader = SumReader::new(sound.create_reader().expect("reader"));
        let mut out = vec![0.0f32; 6];
        reader.read(&mut out);
        assert_eq!(out, vec![1.0, -1.0, 3.0, -3.0, 6.0, -6.0]);
    }
}
