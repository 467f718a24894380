//! Effect readers: each wraps one or two upstream readers and rewrites
//! their frames on the way through.

mod accumulate;
mod adsr;
mod delay;
mod envelope;
mod fader;
mod iir;
mod join;
mod limit;
mod looping;
mod mix;
mod pingpong;
mod pitch;
mod rechannel;
mod reverse;
mod sum;
mod threshold;
mod volume;

pub use accumulate::AccumulateReader;
pub use adsr::AdsrReader;
pub use delay::DelayReader;
pub use envelope::EnvelopeReader;
pub use fader::{FadeDirection, FadeReader};
pub use iir::IirFilterReader;
pub use join::JoinReader;
pub use limit::LimitReader;
pub use looping::LoopReader;
pub use mix::MixReader;
pub use pingpong::PingPongReader;
pub use pitch::PitchReader;
pub use rechannel::RechannelReader;
pub use reverse::ReverseReader;
pub use sum::SumReader;
pub use threshold::ThresholdReader;
pub use volume::VolumeReader;
