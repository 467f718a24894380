//! Difference accumulation.

use sonance_core::{ReadResult, Reader, Specs};

/// Accumulates positive input differences into a monotonic signal.
///
/// Per channel with `d = x[n] - x[n-1]`:
/// plain form `y[n] = y[n-1] + max(0, d)`, additive form
/// `y[n] = y[n-1] + d + max(0, d)` (no longer monotonic). The first sample
/// passes through unchanged.
pub struct AccumulateReader {
    reader: Box<dyn Reader>,
    additive: bool,
    last_in: Vec<f32>,
    sum: Vec<f32>,
    primed: bool,
}

impl AccumulateReader {
    pub fn new(reader: Box<dyn Reader>, additive: bool) -> Self {
        let channels = reader.specs().channels();
        Self {
            reader,
            additive,
            last_in: vec![0.0; channels],
            sum: vec![0.0; channels],
            primed: false,
        }
    }
}

impl Reader for AccumulateReader {
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
            self.last_in.fill(0.0);
            self.sum.fill(0.0);
            self.primed = false;
        }
        applied
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        let channels = self.last_in.len();
        let result = self.reader.read(out);

        for frame in 0..result.frames {
            for channel in 0..channels {
                let index = frame * channels + channel;
                let x = out[index];
                if !self.primed {
                    self.sum[channel] = x;
                } else {
                    let d = x - self.last_in[channel];
                    let step = if self.additive {
                        d + d.max(0.0)
                    } else {
                        d.max(0.0)
                    };
                    self.sum[channel] += step;
                }
                self.last_in[channel] = x;
                out[index] = self.sum[channel];
            }
            self.primed = true;
        }
        result
    }
}
