//! Channel identifiers and mixing matrices for channel rematrixing.

mod layout;
mod matrix;

pub use layout::{Channel, LfeMode, layout_channels};
pub use matrix::{CENTER_COEFF, MixMatrix, SURROUND_COEFF};
