//! The backend contract a device schedules onto.

use sonance_core::{DeviceSpecs, Result};

use crate::device::spatial::{DistanceModel, ListenerParams, SpatialParams};

/// Identifies one backend voice (a per-stream output slot with its own
/// queue of buffers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u64);

/// An output backend: hardware, a software mixer, or a silent test sink.
///
/// The device's mixing loop owns the sink behind its mutex; implementations
/// do not need their own locking. Queued buffers are consumed at the
/// backend's own pace; [`processed`](Sink::processed) reports how many
/// completed since the last poll so the loop can refill them.
pub trait Sink: Send {
    /// The fixed output specs of this sink.
    fn specs(&self) -> DeviceSpecs;

    /// False once the backend failed fatally; the mixing loop then exits.
    fn healthy(&self) -> bool;

    fn create_voice(&mut self) -> Result<VoiceId>;

    fn destroy_voice(&mut self, voice: VoiceId);

    /// Queues one buffer of `frames` interleaved frames packed in the
    /// sink's sample format.
    fn queue(&mut self, voice: VoiceId, frames: usize, data: &[u8]) -> Result<()>;

    /// Number of queued buffers fully consumed since the last call.
    fn processed(&mut self, voice: VoiceId) -> usize;

    /// Drops all queued buffers of the voice.
    fn flush(&mut self, voice: VoiceId);

    /// Whether the voice is actively consuming; false after pause, stop or
    /// an underrun.
    fn playing(&self, voice: VoiceId) -> bool;

    fn start(&mut self, voice: VoiceId);

    fn pause(&mut self, voice: VoiceId);

    fn stop(&mut self, voice: VoiceId);

    /// Playback offset inside the currently queued data, in seconds.
    fn offset_seconds(&self, voice: VoiceId) -> f64;

    fn set_volume(&mut self, voice: VoiceId, volume: f32);

    fn set_pitch(&mut self, voice: VoiceId, pitch: f32);

    fn set_spatial(&mut self, voice: VoiceId, params: &SpatialParams);

    fn set_listener(&mut self, listener: &ListenerParams);

    fn set_distance_model(&mut self, model: DistanceModel);

    /// Master gain applied on top of per-voice volumes.
    fn set_master_volume(&mut self, volume: f32);
}
