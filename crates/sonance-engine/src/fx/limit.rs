//! Time window trimming.

use sonance_core::{Error, ReadResult, Reader, Result, Specs};

/// Trims the stream to `[start, end)` seconds.
pub struct LimitReader {
    reader: Box<dyn Reader>,
    start_frame: u64,
    limit_frames: u64,
    position: u64,
}

impl LimitReader {
    pub fn new(reader: Box<dyn Reader>, start: f64, end: f64) -> Result<Self> {
        if !(start >= 0.0) || end < start {
            return Err(Error::specs(format!(
                "limit window must satisfy 0 <= start <= end, got start={start} end={end}"
            )));
        }
        let rate = reader.specs().rate as f64;
        let start_frame = (start * rate).round() as u64;
        let end_frame = (end * rate).round() as u64;

        let mut limit = Self {
            reader,
            start_frame,
            limit_frames: end_frame - start_frame,
            position: 0,
        };
        limit.align_upstream(0);
        Ok(limit)
    }

    /// Puts the upstream at window position `frame`, skipping forward by
    /// reading when the source cannot seek.
    fn align_upstream(&mut self, frame: u64) {
        let target = self.start_frame + frame;
        if self.reader.seek(target) {
            return;
        }
        let channels = self.reader.specs().channels();
        let mut skip = target.saturating_sub(self.reader.position());
        let mut scratch = vec![0.0f32; 1024 * channels];
        while skip > 0 {
            let chunk = (skip as usize).min(1024);
            let result = self.reader.read(&mut scratch[..chunk * channels]);
            skip -= result.frames as u64;
            if result.frames == 0 {
                break;
            }
        }
    }
}

impl Reader for LimitReader {
    fn specs(&self) -> Specs {
        self.reader.specs()
    }

    fn length(&self) -> Option<u64> {
        Some(self.limit_frames)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seekable(&self) -> bool {
        self.reader.seekable()
    }

    fn seek(&mut self, frame: u64) -> bool {
        let frame = frame.min(self.limit_frames);
        if !self.reader.seek(self.start_frame + frame) {
            return false;
        }
        self.position = frame;
        true
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let channels = self.specs().channels();
        let want = out.len() / channels;
        let remaining = (self.limit_frames - self.position) as usize;
        let frames = want.min(remaining);
        if frames == 0 {
            return ReadResult::new(0, true);
        }

        let result = self.reader.read(&mut out[..frames * channels]);
        self.position += result.frames as u64;
        let eos = result.eos || self.position >= self.limit_frames;
        ReadResult::new(result.frames, eos)
    }
}

#[cfg(test)]
mod tests {
    use super::LimitReader;
    use crate::source::MemorySound;
    use sonance_core::{ChannelLayout, Reader, Sound, Specs};

    fn source() -> MemorySound {
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        MemorySound::from_frames(samples, Specs::new(10, ChannelLayout::Mono))
            .expect("whole frames")
    }

    #[test]
    fn trims_to_the_window() {
        let mut reader = LimitReader::new(source().create_reader().expect("reader"), 0.2, 0.5)
            .expect("valid window");
        assert_eq!(reader.length(), Some(3));

        let mut out = vec![0.0f32; 5];
        let result = reader.read(&mut out);
        assert_eq!(result.frames, 3);
        assert!(result.eos);
        assert_eq!(&out[..3], &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn seek_translates_into_the_window() {
        let mut reader = LimitReader::new(source().create_reader().expect("reader"), 0.2, 0.8)
            .expect("valid window");
        assert!(reader.seek(2));
        assert_eq!(reader.position(), 2);

        let mut out = vec![0.0f32; 2];
        reader.read(&mut out);
        assert_eq!(out, vec![4.0, 5.0]);
    }

    #[test]
    fn window_past_the_source_ends_early() {
        let mut reader = LimitReader::new(source().create_reader().expect("reader"), 0.8, 2.0)
            .expect("valid window");
        let mut out = vec![0.0f32; 8];
        let result = reader.read(&mut out);
        assert_eq!(result.frames, 2);
        assert!(result.eos);
    }
}
