//! The output device: owns a sink backend, schedules playing streams and
//! refills their buffer rings from a background mixing thread.

mod handle;
mod null;
mod sink;
mod spatial;

pub use handle::{Handle, Status};
pub use null::NullSink;
pub use sink::{Sink, VoiceId};
pub use spatial::{DistanceModel, ListenerParams, SpatialParams};

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use slotmap::{SlotMap, new_key_type};
use sonance_core::{DeviceSpecs, Error, Reader, Result, SampleBuffer, Sound};

use crate::config::{CYCLE_BUFFERS, MIX_INTERVAL};
use crate::convert::ConverterReader;
use crate::convert::format::pack_samples;

new_key_type! {
    pub(crate) struct HandleKey;
}

type StopCallback = Box<dyn FnOnce() + Send>;

pub(crate) struct HandleEntry {
    reader: Box<dyn Reader>,
    voice: VoiceId,
    status: Status,
    eos: bool,
    keep: bool,
    loop_count: i32,
    stop_callback: Option<StopCallback>,
    volume: f32,
    pitch: f32,
    spatial: SpatialParams,
}

pub(crate) struct DeviceState {
    sink: Box<dyn Sink>,
    handles: SlotMap<HandleKey, HandleEntry>,
    playing: Vec<HandleKey>,
    paused: Vec<HandleKey>,
    listener: ListenerParams,
    distance_model: DistanceModel,
    master_volume: f32,
    mixing: bool,
    shutdown: bool,
    scratch: SampleBuffer,
    bytes: Vec<u8>,
}

pub(crate) struct DeviceShared {
    specs: DeviceSpecs,
    buffer_frames: usize,
    state: Mutex<DeviceState>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl DeviceShared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().expect("device state mutex poisoned")
    }

    pub(crate) fn specs(&self) -> DeviceSpecs {
        self.specs
    }

    pub(crate) fn buffer_frames(&self) -> usize {
        self.buffer_frames
    }
}

/// An output device scheduling many concurrent streams onto one sink.
///
/// The mixing thread starts with the first [`play`](Device::play), exits
/// when nothing is playing and is respawned when work reappears. Dropping
/// the device stops every handle, joins the thread and releases the sink.
pub struct Device {
    shared: Arc<DeviceShared>,
}

impl Device {
    /// Opens a device over a sink backend. `buffer_frames` is the frame
    /// count of each refill buffer.
    pub fn open(sink: Box<dyn Sink>, buffer_frames: usize) -> Result<Self> {
        let specs = sink.specs();
        specs.specs().validate()?;
        if buffer_frames == 0 {
            return Err(Error::specs("device buffer size must be positive"));
        }
        if !sink.healthy() {
            return Err(Error::device("output backend failed to open"));
        }

        Ok(Self {
            shared: Arc::new(DeviceShared {
                specs,
                buffer_frames,
                state: Mutex::new(DeviceState {
                    sink,
                    handles: SlotMap::with_key(),
                    playing: Vec::new(),
                    paused: Vec::new(),
                    listener: ListenerParams::default(),
                    distance_model: DistanceModel::default(),
                    master_volume: 1.0,
                    mixing: false,
                    shutdown: false,
                    scratch: SampleBuffer::new(),
                    bytes: Vec::new(),
                }),
                thread: Mutex::new(None),
            }),
        })
    }

    pub fn specs(&self) -> DeviceSpecs {
        self.shared.specs
    }

    pub fn buffer_frames(&self) -> usize {
        self.shared.buffer_frames
    }

    /// Starts a stream over `reader`, converting it to the device specs.
    /// With `keep` the handle parks in STOPPED at end-of-stream instead of
    /// being destroyed.
    pub fn play(&self, reader: Box<dyn Reader>, keep: bool) -> Result<Handle> {
        let converted = ConverterReader::new(reader, self.shared.specs)?;

        let mut guard = self.shared.lock();
        let state = &mut *guard;
        if state.shutdown {
            return Err(Error::device("device is shutting down"));
        }
        if !state.sink.healthy() {
            return Err(Error::device("output backend failed"));
        }

        let voice = state.sink.create_voice()?;
        let mut entry = HandleEntry {
            reader: Box::new(converted),
            voice,
            status: Status::Playing,
            eos: false,
            keep,
            loop_count: 0,
            stop_callback: None,
            volume: 1.0,
            pitch: 1.0,
            spatial: SpatialParams::default(),
        };

        if let Err(error) = preload_buffers(
            state.sink.as_mut(),
            &mut state.scratch,
            &mut state.bytes,
            &mut entry,
            self.shared.specs,
            self.shared.buffer_frames,
        ) {
            state.sink.destroy_voice(voice);
            return Err(error);
        }

        state.sink.set_volume(voice, entry.volume);
        state.sink.set_pitch(voice, entry.pitch);
        state.sink.set_spatial(voice, &entry.spatial);

        let key = state.handles.insert(entry);
        state.playing.push(key);
        state.sink.start(voice);
        drop(guard);

        ensure_mixing_thread(&self.shared);
        Ok(Handle::new(Arc::downgrade(&self.shared), key))
    }

    /// Starts a stream over a fresh reader of `sound`.
    pub fn play_sound(&self, sound: &dyn Sound, keep: bool) -> Result<Handle> {
        self.play(sound.create_reader()?, keep)
    }

    /// Stops every live handle without firing callbacks.
    pub fn stop_all(&self) {
        let mut removed = Vec::new();
        {
            let mut guard = self.shared.lock();
            let state = &mut *guard;
            let keys: Vec<HandleKey> = state.handles.keys().collect();
            for key in keys {
                if let Some(entry) = state.handles.remove(key) {
                    state.sink.stop(entry.voice);
                    state.sink.destroy_voice(entry.voice);
                    removed.push(entry);
                }
            }
            state.playing.clear();
            state.paused.clear();
        }
        // Reader teardown (worker joins and the like) happens unlocked.
        drop(removed);
    }

    /// Master volume scaling every voice.
    pub fn volume(&self) -> f32 {
        self.shared.lock().master_volume
    }

    pub fn set_volume(&self, volume: f32) {
        let mut guard = self.shared.lock();
        guard.master_volume = volume;
        guard.sink.set_master_volume(volume);
    }

    pub fn listener(&self) -> ListenerParams {
        self.shared.lock().listener
    }

    pub fn set_listener(&self, listener: ListenerParams) {
        let mut guard = self.shared.lock();
        guard.listener = listener;
        guard.sink.set_listener(&listener);
    }

    pub fn speed_of_sound(&self) -> f32 {
        self.shared.lock().listener.speed_of_sound
    }

    pub fn set_speed_of_sound(&self, speed: f32) {
        let mut guard = self.shared.lock();
        guard.listener.speed_of_sound = speed;
        let listener = guard.listener;
        guard.sink.set_listener(&listener);
    }

    pub fn doppler_factor(&self) -> f32 {
        self.shared.lock().listener.doppler_factor
    }

    pub fn set_doppler_factor(&self, factor: f32) {
        let mut guard = self.shared.lock();
        guard.listener.doppler_factor = factor;
        let listener = guard.listener;
        guard.sink.set_listener(&listener);
    }

    pub fn distance_model(&self) -> DistanceModel {
        self.shared.lock().distance_model
    }

    pub fn set_distance_model(&self, model: DistanceModel) {
        let mut guard = self.shared.lock();
        guard.distance_model = model;
        guard.sink.set_distance_model(model);
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        {
            let mut guard = self.shared.lock();
            guard.shutdown = true;
        }
        self.stop_all();

        let thread = self
            .shared
            .thread
            .lock()
            .expect("device thread mutex poisoned")
            .take();
        if let Some(thread) = thread {
            let _ = thread.join();
        }
    }
}

/// Spawns the mixing thread if it is not already running.
pub(crate) fn ensure_mixing_thread(shared: &Arc<DeviceShared>) {
    {
        let mut state = shared.lock();
        if state.mixing || state.shutdown {
            return;
        }
        state.mixing = true;
    }

    let for_thread = Arc::clone(shared);
    let spawned = std::thread::Builder::new()
        .name("sonance-device-mix".to_string())
        .spawn(move || mixing_loop(for_thread));

    let mut slot = shared
        .thread
        .lock()
        .expect("device thread mutex poisoned");
    match spawned {
        Ok(thread) => {
            // The previous thread has already observed `mixing == false`.
            if let Some(old) = slot.replace(thread) {
                let _ = old.join();
            }
        },
        Err(error) => {
            tracing::warn!(%error, "failed to spawn mixing thread");
            shared.lock().mixing = false;
        },
    }
}

fn mixing_loop(shared: Arc<DeviceShared>) {
    loop {
        let mut ended: Vec<(HandleKey, Option<StopCallback>)> = Vec::new();
        {
            let mut guard = shared.lock();
            let state = &mut *guard;
            if state.shutdown {
                state.mixing = false;
                return;
            }
            if !state.sink.healthy() {
                tracing::warn!("output backend failed, stopping mixing loop");
                state.mixing = false;
                return;
            }

            let keys: Vec<HandleKey> = state.playing.clone();
            for key in keys {
                service_handle(
                    state,
                    shared.specs,
                    shared.buffer_frames,
                    key,
                    &mut ended,
                );
            }

            if state.playing.is_empty() && ended.is_empty() {
                state.mixing = false;
                return;
            }
        }

        // Callbacks run unlocked so they may operate on handles freely;
        // they fire before the handle leaves its live state.
        let mut finished = Vec::with_capacity(ended.len());
        for (key, callback) in ended {
            if let Some(callback) = callback {
                if std::panic::catch_unwind(AssertUnwindSafe(callback)).is_err() {
                    tracing::warn!("stop callback panicked");
                }
            }
            finished.push(key);
        }

        if !finished.is_empty() {
            let mut removed = Vec::new();
            let mut guard = shared.lock();
            let state = &mut *guard;
            for key in finished {
                if let Some(entry) = finish_handle(state, key) {
                    removed.push(entry);
                }
            }
            let stop = state.shutdown || state.playing.is_empty();
            if stop {
                state.mixing = false;
            }
            drop(guard);
            drop(removed);
            if stop {
                return;
            }
        }

        std::thread::sleep(MIX_INTERVAL);
    }
}

/// Refills the consumed buffers of one playing handle and reacts to its
/// source state. Failures mark the handle ended, never the loop.
fn service_handle(
    state: &mut DeviceState,
    specs: DeviceSpecs,
    buffer_frames: usize,
    key: HandleKey,
    ended: &mut Vec<(HandleKey, Option<StopCallback>)>,
) {
    let Some(entry) = state.handles.get_mut(key) else {
        return;
    };
    let channels = specs.layout.channel_count();
    let consumed = state.sink.processed(entry.voice);
    state.scratch.ensure_size(buffer_frames * channels);

    for _ in 0..consumed {
        if entry.eos {
            break;
        }

        let want = buffer_frames * channels;
        let result = entry.reader.read(&mut state.scratch.as_mut_slice()[..want]);
        let mut frames = result.frames;
        let mut eos = result.eos;

        // Wrap around when looping is armed.
        if frames == 0 && entry.loop_count != 0 {
            if entry.loop_count > 0 {
                entry.loop_count -= 1;
            }
            entry.reader.seek(0);
            let again = entry.reader.read(&mut state.scratch.as_mut_slice()[..want]);
            frames = again.frames;
            eos = again.eos;
        }
        if entry.loop_count != 0 {
            eos = false;
        }
        if frames == 0 {
            entry.eos = true;
            break;
        }
        entry.eos = eos;

        state.bytes.clear();
        pack_samples(
            specs.format,
            &state.scratch.as_slice()[..frames * channels],
            &mut state.bytes,
        );
        if let Err(error) = state.sink.queue(entry.voice, frames, &state.bytes) {
            tracing::warn!(%error, "failed to queue buffer, marking stream ended");
            entry.eos = true;
            break;
        }
    }

    if !state.sink.playing(entry.voice) {
        if entry.eos {
            // The callback is taken under the lock so it fires at most
            // once; the transition applies after it ran.
            ended.push((key, entry.stop_callback.take()));
        } else {
            // Underrun: data is queued again, restart the voice.
            state.sink.start(entry.voice);
        }
    }
}

/// Applies the end-of-stream transition for a handle whose callback has
/// fired. Returns the removed entry when the handle becomes invalid.
fn finish_handle(state: &mut DeviceState, key: HandleKey) -> Option<HandleEntry> {
    let entry = state.handles.get_mut(key)?;
    if entry.status != Status::Playing || !entry.eos {
        // A caller revived the handle between callback and transition.
        return None;
    }

    if entry.keep {
        entry.status = Status::Stopped;
        let voice = entry.voice;
        state.sink.pause(voice);
        state.playing.retain(|k| *k != key);
        state.paused.push(key);
        None
    } else {
        let entry = state.handles.remove(key)?;
        state.sink.stop(entry.voice);
        state.sink.destroy_voice(entry.voice);
        state.playing.retain(|k| *k != key);
        Some(entry)
    }
}

/// Fills the handle's buffer ring from its reader; short or empty reads
/// queue a single silent frame so the ring stays non-empty.
pub(crate) fn preload_buffers(
    sink: &mut dyn Sink,
    scratch: &mut SampleBuffer,
    bytes: &mut Vec<u8>,
    entry: &mut HandleEntry,
    specs: DeviceSpecs,
    buffer_frames: usize,
) -> Result<()> {
    let channels = specs.layout.channel_count();
    scratch.ensure_size(buffer_frames * channels);

    for _ in 0..CYCLE_BUFFERS {
        let result = entry
            .reader
            .read(&mut scratch.as_mut_slice()[..buffer_frames * channels]);
        entry.eos = result.eos;

        let mut frames = result.frames;
        if frames == 0 {
            frames = 1;
            scratch.as_mut_slice()[..channels].fill(0.0);
        }

        bytes.clear();
        pack_samples(specs.format, &scratch.as_slice()[..frames * channels], bytes);
        sink.queue(entry.voice, frames, bytes)?;
    }
    Ok(())
}
