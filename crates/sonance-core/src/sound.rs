//! The reader factory contract.

use crate::error::Result;
use crate::reader::Reader;

/// A description of a sound from which independent streams can be started.
///
/// Each call to `create_reader` yields a fresh reader with its own
/// position; two live readers never share mutable upstream state.
pub trait Sound: Send + Sync {
    /// Starts a new independent stream over this sound.
    fn create_reader(&self) -> Result<Box<dyn Reader>>;
}
