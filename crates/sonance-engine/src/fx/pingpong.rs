//! Forward-then-backward playback.

use sonance_core::{Error, ReadResult, Reader, Result, SampleBuffer, Specs};

use crate::fx::reverse::read_segment;

/// Plays a finite, seekable stream forward and then in reverse.
pub struct PingPongReader {
    reader: Box<dyn Reader>,
    length: u64,
    position: u64,
    scratch: SampleBuffer,
}

impl PingPongReader {
    pub fn new(reader: Box<dyn Reader>) -> Result<Self> {
        if !reader.seekable() {
            return Err(Error::specs("pingpong requires a seekable source"));
        }
        let Some(length) = reader.length() else {
            return Err(Error::specs("pingpong requires a source of known length"));
        };
        Ok(Self {
            reader,
            length,
            position: 0,
            scratch: SampleBuffer::new(),
        })
    }

    fn total(&self) -> u64 {
        self.length * 2
    }
}

impl Reader for PingPongReader {
    fn specs(&self) -> Specs {
        self.reader.specs()
    }

    fn length(&self) -> Option<u64> {
        Some(self.total())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seekable(&self) -> bool {
        true
    }

    fn seek(&mut self, frame: u64) -> bool {
        self.position = frame.min(self.total());
        true
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let channels = self.specs().channels();
        let want = out.len() / channels;
        let mut filled = 0;

        while filled < want && self.position < self.total() {
            let frames = if self.position < self.length {
                // Forward half.
                let n = (want - filled).min((self.length - self.position) as usize);
                let got = read_segment(
                    &mut self.reader,
                    self.position,
                    n,
                    channels,
                    &mut out[filled * channels..(filled + n) * channels],
                );
                if got < n {
                    self.position = self.total();
                    break;
                }
                n
            } else {
                // Backward half.
                let reversed = self.position - self.length;
                let n = (want - filled).min((self.length - reversed) as usize);
                self.scratch.ensure_size(n * channels);
                let start = self.length - reversed - n as u64;
                let got = read_segment(
                    &mut self.reader,
                    start,
                    n,
                    channels,
                    self.scratch.as_mut_slice(),
                );
                if got < n {
                    self.position = self.total();
                    break;
                }
                let scratch = self.scratch.as_slice();
                for frame in 0..n {
                    let src = (n - 1 - frame) * channels;
                    out[(filled + frame) * channels..(filled + frame + 1) * channels]
                        .copy_from_slice(&scratch[src..src + channels]);
                }
                n
            };
            filled += frames;
            self.position += frames as u64;
        }

        ReadResult::new(filled, self.position >= self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::PingPongReader;
    use crate::source::MemorySound;
    use sonance_core::{ChannelLayout, Reader, Sound, Specs};

    #[test]
    fn plays_forward_then_backward() {
        let sound = MemorySound::from_frames(
            vec![1.0, 2.0, 3.0],
            Specs::new(10, ChannelLayout::Mono),
        )
        .expect("whole frames");
        let mut reader =
            PingPongReader::new(sound.create_reader().expect("reader")).expect("seekable");
        assert_eq!(reader.length(), Some(6));

        let mut out = vec![0.0f32; 6];
        let result = reader.read(&mut out);
        assert_eq!(result.frames, 6);
        assert!(result.eos);
        assert_eq!(out, vec![1.0, 2.0, 3.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn crossing_the_turnaround_in_one_call() {
        let sound = MemorySound::from_frames(
            vec![1.0, 2.0, 3.0, 4.0],
            Specs::new(10, ChannelLayout::Mono),
        )
        .expect("whole frames");
        let mut reader =
            PingPongReader::new(sound.create_reader().expect("reader")).expect("seekable");
        assert!(reader.seek(3));

        let mut out = vec![0.0f32; 3];
        let result = reader.read(&mut out);
        assert_eq!(result.frames, 3);
        assert_eq!(out, vec![4.0, 4.0, 3.0]);
    }
}
