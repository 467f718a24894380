//! Engine tunables.

use std::time::Duration;

/// Number of small output buffers rotated per stream. Gives the backend
/// prefetch without adding large latency.
pub const CYCLE_BUFFERS: usize = 3;

/// Sleep between mixing passes.
pub(crate) const MIX_INTERVAL: Duration = Duration::from_millis(20);

/// Default frames per refill when none is requested.
pub const DEFAULT_BUFFER_FRAMES: usize = 1024;

/// Default partition length of the convolver in frames. Must stay a power
/// of two.
pub const DEFAULT_PARTITION_FRAMES: usize = 1024;

/// Default total worker thread hint for convolver readers.
pub const DEFAULT_CONVOLVER_THREADS: usize = 2;

pub(crate) const RESAMPLE_CHUNK_FRAMES: usize = 1024;
// Balanced resampler preset: good stop-band rejection without the CPU cost
// of the long-sinc variants.
pub(crate) const RESAMPLE_SINC_LEN: usize = 128;
pub(crate) const RESAMPLE_CUTOFF: f32 = 0.94;
pub(crate) const RESAMPLE_OVERSAMPLING_FACTOR: usize = 128;
pub(crate) const RESAMPLE_WINDOW: rubato::WindowFunction = rubato::WindowFunction::Blackman;
pub(crate) const RESAMPLE_INTERPOLATION: rubato::SincInterpolationType =
    rubato::SincInterpolationType::Linear;
