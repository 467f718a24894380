//! The pull-driven source contract every graph node implements.

use crate::specs::Specs;

/// Outcome of a single [`Reader::read`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadResult {
    /// Number of frames actually written to the output slice.
    pub frames: usize,
    /// True iff the source is exhausted and will produce no further data
    /// without a seek.
    pub eos: bool,
}

impl ReadResult {
    pub const fn new(frames: usize, eos: bool) -> Self {
        Self { frames, eos }
    }

    /// Zero frames, more data pending. Only valid transiently inside
    /// composite readers; a `read` call must not return this.
    pub const fn empty() -> Self {
        Self {
            frames: 0,
            eos: false,
        }
    }
}

/// A lazy, possibly infinite sequence of interleaved audio frames.
///
/// Contract:
/// - `read` fills `out` with up to `out.len() / channels` frames laid out
///   per [`specs`](Reader::specs) and reports the produced count; it never
///   reports zero frames without also reporting eos.
/// - `position` advances by exactly the produced frame count.
/// - Non-seekable readers return `false` from `seek` without side effects;
///   seekable readers clamp to `length()` where known.
pub trait Reader: Send {
    /// The immutable specs of the frames this reader produces.
    fn specs(&self) -> Specs;

    /// Total frame count, or `None` when unknown or infinite.
    fn length(&self) -> Option<u64>;

    /// Current frame index from stream start.
    fn position(&self) -> u64;

    /// Whether random access is supported.
    fn seekable(&self) -> bool;

    /// Attempts to move to `frame`. Returns whether the seek applied.
    fn seek(&mut self, frame: u64) -> bool;

    /// Fills `out` with up to `out.len() / channels` frames.
    fn read(&mut self, out: &mut [f32]) -> ReadResult;
}

impl Reader for Box<dyn Reader> {
    fn specs(&self) -> Specs {
        (**self).specs()
    }

    fn length(&self) -> Option<u64> {
        (**self).length()
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn seekable(&self) -> bool {
        (**self).seekable()
    }

    fn seek(&mut self, frame: u64) -> bool {
        (**self).seek(frame)
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        (**self).read(out)
    }
}
