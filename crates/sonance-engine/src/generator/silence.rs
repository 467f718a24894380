//! A quiet, infinite mono source.

use sonance_core::{ChannelLayout, Error, ReadResult, Reader, Result, Sound, Specs};

/// A sound producing silence forever.
#[derive(Debug, Clone, Copy)]
pub struct Silence {
    rate: u32,
}

impl Silence {
    pub fn new(rate: u32) -> Self {
        Self { rate }
    }
}

impl Sound for Silence {
    fn create_reader(&self) -> Result<Box<dyn Reader>> {
        Ok(Box::new(SilenceReader::new(self.rate)?))
    }
}

/// Streams zeros; infinite and seekable.
#[derive(Debug)]
pub struct SilenceReader {
    rate: u32,
    position: u64,
}

impl SilenceReader {
    pub fn new(rate: u32) -> Result<Self> {
        if rate == 0 {
            return Err(Error::specs("silence sample rate must be positive"));
        }
        Ok(Self { rate, position: 0 })
    }
}

impl Reader for SilenceReader {
    fn specs(&self) -> Specs {
        Specs::new(self.rate, ChannelLayout::Mono)
    }

    fn length(&self) -> Option<u64> {
        None
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seekable(&self) -> bool {
        true
    }

    fn seek(&mut self, frame: u64) -> bool {
        self.position = frame;
        true
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        out.fill(0.0);
        self.position += out.len() as u64;
        ReadResult::new(out.len(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::SilenceReader;
    use sonance_core::Reader;

    #[test]
    fn produces_zeros_forever() {
        let mut reader = SilenceReader::new(48_000).expect("valid rate");
        let mut out = vec![1.0f32; 64];
        let result = reader.read(&mut out);
        assert_eq!(result.frames, 64);
        assert!(!result.eos);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(reader.position(), 64);
    }
}
