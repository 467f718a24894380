//! A growable scratch buffer for interleaved samples.

/// Resizable sample storage shared by readers that need scratch space.
///
/// After [`ensure_size`](SampleBuffer::ensure_size) the buffer holds at
/// least the requested number of samples; unless `keep` is requested the
/// previous contents may be discarded. The logical size only grows.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    data: Vec<f32>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer that already holds `size` zeroed samples.
    pub fn with_size(size: usize) -> Self {
        Self {
            data: vec![0.0; size],
        }
    }

    /// Grows the buffer to hold at least `size` samples, discarding old
    /// contents when reallocation is needed.
    pub fn ensure_size(&mut self, size: usize) {
        self.ensure_size_keep(size, false);
    }

    /// Grows the buffer to hold at least `size` samples. With `keep` the
    /// old contents survive in place.
    pub fn ensure_size_keep(&mut self, size: usize, keep: bool) {
        if size <= self.data.len() {
            return;
        }
        if keep {
            self.data.resize(size, 0.0);
        } else {
            self.data = vec![0.0; size];
        }
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::SampleBuffer;

    #[test]
    fn ensure_size_only_grows() {
        let mut buffer = SampleBuffer::new();
        buffer.ensure_size(64);
        assert_eq!(buffer.len(), 64);
        buffer.ensure_size(16);
        assert_eq!(buffer.len(), 64);
        buffer.ensure_size(128);
        assert_eq!(buffer.len(), 128);
    }

    #[test]
    fn keep_preserves_contents() {
        let mut buffer = SampleBuffer::with_size(4);
        buffer.as_mut_slice().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        buffer.ensure_size_keep(8, true);
        assert_eq!(&buffer.as_slice()[..4], &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(&buffer.as_slice()[4..], &[0.0; 4]);
    }
}
