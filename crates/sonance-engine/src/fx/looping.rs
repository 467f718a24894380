//! Repetition at end-of-stream.

use sonance_core::{ReadResult, Reader, Specs};

/// Restarts the upstream at eos.
///
/// A count of `-1` loops forever, `0` disables looping, `n > 0` replays
/// the stream `n` more times before eos propagates.
pub struct LoopReader {
    reader: Box<dyn Reader>,
    count: i32,
    remaining: i32,
    position: u64,
}

impl LoopReader {
    pub fn new(reader: Box<dyn Reader>, count: i32) -> Self {
        Self {
            reader,
            count,
            remaining: count,
            position: 0,
        }
    }

    pub fn loop_count(&self) -> i32 {
        self.count
    }

    /// Replaces the loop count; also resets the remaining repetitions.
    pub fn set_loop_count(&mut self, count: i32) {
        self.count = count;
        self.remaining = count;
    }
}

impl Reader for LoopReader {
    fn specs(&self) -> Specs {
        self.reader.specs()
    }

    fn length(&self) -> Option<u64> {
        if self.count < 0 {
            return None;
        }
        self.reader
            .length()
            .map(|len| len * (self.count as u64 + 1))
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seekable(&self) -> bool {
        self.reader.seekable()
    }

    fn seek(&mut self, frame: u64) -> bool {
        // Seeks map into the current pass; repetitions are not rewound.
        let target = match self.reader.length() {
            Some(len) if len > 0 => frame % len,
            _ => frame,
        };
        if !self.reader.seek(target) {
            return false;
        }
        self.position = frame;
        true
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let channels = self.specs().channels();
        let want = out.len() / channels;
        let mut filled = 0;
        let mut eos = false;
        let mut empty_wraps = 0;

        while filled < want {
            let result = self
                .reader
                .read(&mut out[filled * channels..want * channels]);
            filled += result.frames;
            if !result.eos {
                continue;
            }
            // An empty source would wrap forever without progress.
            empty_wraps = if result.frames == 0 { empty_wraps + 1 } else { 0 };
            if self.remaining == 0 || empty_wraps > 1 || !self.reader.seek(0) {
                eos = true;
                break;
            }
            if self.remaining > 0 {
                self.remaining -= 1;
            }
        }

        self.position += filled as u64;
        ReadResult::new(filled, eos)
    }
}
