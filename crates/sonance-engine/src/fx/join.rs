//! Sequential playback of two streams.

use sonance_core::{Error, ReadResult, Reader, Result, Specs};

/// Plays `first` to its end, then `second`, within the same stream.
pub struct JoinReader {
    first: Box<dyn Reader>,
    second: Box<dyn Reader>,
    in_second: bool,
    position: u64,
}

impl JoinReader {
    pub fn new(first: Box<dyn Reader>, second: Box<dyn Reader>) -> Result<Self> {
        if first.specs() != second.specs() {
            return Err(Error::specs(format!(
                "join requires equal specs, got {:?} and {:?}",
                first.specs(),
                second.specs()
            )));
        }
        Ok(Self {
            first,
            second,
            in_second: false,
            position: 0,
        })
    }
}

impl Reader for JoinReader {
    fn specs(&self) -> Specs {
        self.first.specs()
    }

    fn length(&self) -> Option<u64> {
        match (self.first.length(), self.second.length()) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        }
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seekable(&self) -> bool {
        self.first.seekable() && self.second.seekable() && self.first.length().is_some()
    }

    fn seek(&mut self, frame: u64) -> bool {
        let Some(first_len) = self.first.length() else {
            return false;
        };
        let applied = if frame < first_len {
            self.first.seek(frame) && self.second.seek(0)
        } else {
            self.second.seek(frame - first_len)
        };
        if applied {
            self.in_second = frame >= first_len;
            self.position = frame;
        }
        applied
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let channels = self.specs().channels();
        let want = out.len() / channels;
        let mut filled = 0;
        let mut eos = false;

        while filled < want {
            if !self.in_second {
                let result = self
                    .first
                    .read(&mut out[filled * channels..want * channels]);
                filled += result.frames;
                if result.eos {
                    self.in_second = true;
                }
                if !result.eos && result.frames == 0 {
                    break;
                }
            } else {
                let result = self
                    .second
                    .read(&mut out[filled * channels..want * channels]);
                filled += result.frames;
                eos = result.eos;
                break;
            }
        }

        self.position += filled as u64;
        ReadResult::new(filled, eos)
    }
}
