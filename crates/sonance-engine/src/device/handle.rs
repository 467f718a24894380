//! Transport and attribute control over one live stream.

use std::sync::Weak;

use sonance_core::{Quaternion, Vector3};

use crate::config::CYCLE_BUFFERS;
use crate::device::sink::Sink;
use crate::device::{DeviceShared, HandleEntry, ensure_mixing_thread, preload_buffers};

/// Lifecycle state of a [`Handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Playing,
    Paused,
    /// Parked at end-of-stream by the keep policy; revivable by `seek` or
    /// a larger loop count.
    Stopped,
    /// Terminal; every operation fails without side effects.
    Invalid,
}

/// A reference to a live stream on a device.
///
/// Operations lock the owning device, re-check liveness under the lock and
/// report whether the requested transition applied. A handle outliving its
/// device behaves as invalid.
#[derive(Clone)]
pub struct Handle {
    shared: Weak<DeviceShared>,
    key: super::HandleKey,
}

impl Handle {
    pub(crate) fn new(shared: Weak<DeviceShared>, key: super::HandleKey) -> Self {
        Self { shared, key }
    }

    fn with_entry<R>(&self, f: impl FnOnce(&mut HandleEntry, &mut dyn Sink) -> R) -> Option<R> {
        let shared = self.shared.upgrade()?;
        let mut guard = shared.lock();
        let state = &mut *guard;
        let entry = state.handles.get_mut(self.key)?;
        Some(f(entry, state.sink.as_mut()))
    }

    pub fn status(&self) -> Status {
        self.with_entry(|entry, _| entry.status)
            .unwrap_or(Status::Invalid)
    }

    /// PLAYING → PAUSED.
    pub fn pause(&self) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let mut guard = shared.lock();
        let state = &mut *guard;
        let Some(entry) = state.handles.get_mut(self.key) else {
            return false;
        };
        if entry.status != Status::Playing {
            return false;
        }
        entry.status = Status::Paused;
        state.sink.pause(entry.voice);
        let key = self.key;
        state.playing.retain(|k| *k != key);
        state.paused.push(key);
        true
    }

    /// PAUSED → PLAYING.
    pub fn resume(&self) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        {
            let mut guard = shared.lock();
            let state = &mut *guard;
            let Some(entry) = state.handles.get_mut(self.key) else {
                return false;
            };
            if entry.status != Status::Paused {
                return false;
            }
            entry.status = Status::Playing;
            state.sink.start(entry.voice);
            let key = self.key;
            state.paused.retain(|k| *k != key);
            state.playing.push(key);
        }
        ensure_mixing_thread(&shared);
        true
    }

    /// Any live state → INVALID. Releases the voice and the reader.
    pub fn stop(&self) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let removed;
        {
            let mut guard = shared.lock();
            let state = &mut *guard;
            let Some(entry) = state.handles.remove(self.key) else {
                return false;
            };
            state.sink.stop(entry.voice);
            state.sink.destroy_voice(entry.voice);
            let key = self.key;
            state.playing.retain(|k| *k != key);
            state.paused.retain(|k| *k != key);
            removed = entry;
        }
        // Reader teardown happens unlocked.
        drop(removed);
        true
    }

    /// Repositions the stream; valid in any live state. A STOPPED handle
    /// becomes PAUSED again.
    pub fn seek(&self, seconds: f64) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let mut guard = shared.lock();
        let state = &mut *guard;
        let Some(entry) = state.handles.get_mut(self.key) else {
            return false;
        };

        let frame = (seconds.max(0.0) * shared.specs().rate as f64).round() as u64;
        state.sink.flush(entry.voice);
        entry.reader.seek(frame);
        entry.eos = false;

        if preload_buffers(
            state.sink.as_mut(),
            &mut state.scratch,
            &mut state.bytes,
            entry,
            shared.specs(),
            shared.buffer_frames(),
        )
        .is_err()
        {
            entry.eos = true;
            return false;
        }
        if entry.loop_count != 0 {
            entry.eos = false;
        }

        match entry.status {
            Status::Stopped => entry.status = Status::Paused,
            Status::Playing => state.sink.start(entry.voice),
            _ => {},
        }
        true
    }

    /// Audible position in seconds, compensating for queued-ahead buffers.
    pub fn position(&self) -> f64 {
        let Some(shared) = self.shared.upgrade() else {
            return 0.0;
        };
        let mut guard = shared.lock();
        let state = &mut *guard;
        let Some(entry) = state.handles.get_mut(self.key) else {
            return 0.0;
        };

        let rate = shared.specs().rate as f64;
        let queued_ahead = (shared.buffer_frames() * CYCLE_BUFFERS) as f64;
        let base = (entry.reader.position() as f64 - queued_ahead).max(0.0) / rate;
        base + state.sink.offset_seconds(entry.voice)
    }

    pub fn keep(&self) -> bool {
        self.with_entry(|entry, _| entry.keep).unwrap_or(false)
    }

    pub fn set_keep(&self, keep: bool) -> bool {
        self.with_entry(|entry, _| entry.keep = keep).is_some()
    }

    pub fn loop_count(&self) -> i32 {
        self.with_entry(|entry, _| entry.loop_count).unwrap_or(0)
    }

    /// Updates the remaining loop count; `-1` loops forever. Raising the
    /// count on a STOPPED handle makes it PAUSED with work available.
    pub fn set_loop_count(&self, count: i32) -> bool {
        self.with_entry(|entry, _| {
            if entry.status == Status::Stopped && (count > entry.loop_count || count < 0) {
                entry.status = Status::Paused;
                entry.eos = false;
            }
            entry.loop_count = count;
        })
        .is_some()
    }

    /// Arms a callback fired at most once when the stream reaches natural
    /// end-of-stream.
    pub fn set_stop_callback(&self, callback: impl FnOnce() + Send + 'static) -> bool {
        self.with_entry(|entry, _| entry.stop_callback = Some(Box::new(callback)))
            .is_some()
    }

    /// Voice gain; NaN on an invalid handle.
    pub fn volume(&self) -> f32 {
        self.with_entry(|entry, _| entry.volume).unwrap_or(f32::NAN)
    }

    pub fn set_volume(&self, volume: f32) -> bool {
        self.with_entry(|entry, sink| {
            entry.volume = volume;
            sink.set_volume(entry.voice, volume);
        })
        .is_some()
    }

    /// Voice pitch; NaN on an invalid handle.
    pub fn pitch(&self) -> f32 {
        self.with_entry(|entry, _| entry.pitch).unwrap_or(f32::NAN)
    }

    pub fn set_pitch(&self, pitch: f32) -> bool {
        self.with_entry(|entry, sink| {
            entry.pitch = pitch;
            sink.set_pitch(entry.voice, pitch);
        })
        .is_some()
    }

    pub fn location(&self) -> Vector3 {
        self.with_entry(|entry, _| entry.spatial.location)
            .unwrap_or_default()
    }

    pub fn set_location(&self, location: Vector3) -> bool {
        self.update_spatial(|spatial| spatial.location = location)
    }

    pub fn velocity(&self) -> Vector3 {
        self.with_entry(|entry, _| entry.spatial.velocity)
            .unwrap_or_default()
    }

    pub fn set_velocity(&self, velocity: Vector3) -> bool {
        self.update_spatial(|spatial| spatial.velocity = velocity)
    }

    pub fn orientation(&self) -> Quaternion {
        self.with_entry(|entry, _| entry.spatial.orientation)
            .unwrap_or_default()
    }

    pub fn set_orientation(&self, orientation: Quaternion) -> bool {
        self.update_spatial(|spatial| spatial.orientation = orientation)
    }

    pub fn relative(&self) -> bool {
        self.with_entry(|entry, _| entry.spatial.relative)
            .unwrap_or(false)
    }

    pub fn set_relative(&self, relative: bool) -> bool {
        self.update_spatial(|spatial| spatial.relative = relative)
    }

    pub fn volume_minimum(&self) -> f32 {
        self.with_entry(|entry, _| entry.spatial.volume_minimum)
            .unwrap_or(f32::NAN)
    }

    pub fn set_volume_minimum(&self, volume: f32) -> bool {
        self.update_spatial(|spatial| spatial.volume_minimum = volume)
    }

    pub fn volume_maximum(&self) -> f32 {
        self.with_entry(|entry, _| entry.spatial.volume_maximum)
            .unwrap_or(f32::NAN)
    }

    pub fn set_volume_maximum(&self, volume: f32) -> bool {
        self.update_spatial(|spatial| spatial.volume_maximum = volume)
    }

    pub fn distance_reference(&self) -> f32 {
        self.with_entry(|entry, _| entry.spatial.distance_reference)
            .unwrap_or(f32::NAN)
    }

    pub fn set_distance_reference(&self, distance: f32) -> bool {
        self.update_spatial(|spatial| spatial.distance_reference = distance)
    }

    pub fn distance_maximum(&self) -> f32 {
        self.with_entry(|entry, _| entry.spatial.distance_maximum)
            .unwrap_or(f32::NAN)
    }

    pub fn set_distance_maximum(&self, distance: f32) -> bool {
        self.update_spatial(|spatial| spatial.distance_maximum = distance)
    }

    /// Rolloff factor of the distance model.
    pub fn attenuation(&self) -> f32 {
        self.with_entry(|entry, _| entry.spatial.attenuation)
            .unwrap_or(f32::NAN)
    }

    pub fn set_attenuation(&self, factor: f32) -> bool {
        self.update_spatial(|spatial| spatial.attenuation = factor)
    }

    pub fn cone_angle_inner(&self) -> f32 {
        self.with_entry(|entry, _| entry.spatial.cone_angle_inner)
            .unwrap_or(f32::NAN)
    }

    pub fn set_cone_angle_inner(&self, angle: f32) -> bool {
        self.update_spatial(|spatial| spatial.cone_angle_inner = angle)
    }

    pub fn cone_angle_outer(&self) -> f32 {
        self.with_entry(|entry, _| entry.spatial.cone_angle_outer)
            .unwrap_or(f32::NAN)
    }

    pub fn set_cone_angle_outer(&self, angle: f32) -> bool {
        self.update_spatial(|spatial| spatial.cone_angle_outer = angle)
    }

    pub fn cone_volume_outer(&self) -> f32 {
        self.with_entry(|entry, _| entry.spatial.cone_volume_outer)
            .unwrap_or(f32::NAN)
    }

    pub fn set_cone_volume_outer(&self, volume: f32) -> bool {
        self.update_spatial(|spatial| spatial.cone_volume_outer = volume)
    }

    fn update_spatial(&self, f: impl FnOnce(&mut super::SpatialParams)) -> bool {
        self.with_entry(|entry, sink| {
            f(&mut entry.spatial);
            sink.set_spatial(entry.voice, &entry.spatial);
        })
        .is_some()
    }
}
