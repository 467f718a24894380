//! Category-keyed bulk control over live handles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sonance_core::{Result, Sound};

use crate::device::{Device, Handle, Status};

struct Category {
    volume: f32,
    handles: Vec<Handle>,
}

impl Category {
    fn new() -> Self {
        Self {
            volume: 1.0,
            handles: Vec::new(),
        }
    }
}

/// Groups handles into integer-keyed categories for bulk volume and
/// transport control. Dead handles are reaped by [`clean`](Self::clean).
///
/// The category map has its own lock; the device lock is only taken inside
/// individual handle operations.
pub struct PlaybackManager {
    device: Arc<Device>,
    categories: Mutex<HashMap<u32, Category>>,
}

impl PlaybackManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            categories: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u32, Category>> {
        self.categories.lock().expect("category mutex poisoned")
    }

    /// Plays `sound` into the category `key`, creating the category on
    /// first use and applying its volume to the new handle.
    pub fn play(&self, sound: &dyn Sound, key: u32) -> Result<()> {
        let handle = self.device.play_sound(sound, false)?;
        let mut categories = self.lock();
        let category = categories.entry(key).or_insert_with(Category::new);
        handle.set_volume(category.volume);
        category.handles.push(handle);
        Ok(())
    }

    /// Pauses every live handle in the category. False for unknown keys.
    pub fn pause(&self, key: u32) -> bool {
        let categories = self.lock();
        let Some(category) = categories.get(&key) else {
            return false;
        };
        for handle in &category.handles {
            handle.pause();
        }
        true
    }

    /// Resumes every paused handle in the category. False for unknown
    /// keys.
    pub fn resume(&self, key: u32) -> bool {
        let categories = self.lock();
        let Some(category) = categories.get(&key) else {
            return false;
        };
        for handle in &category.handles {
            handle.resume();
        }
        true
    }

    /// Stops every handle in the category. False for unknown keys.
    pub fn stop(&self, key: u32) -> bool {
        let categories = self.lock();
        let Some(category) = categories.get(&key) else {
            return false;
        };
        for handle in &category.handles {
            handle.stop();
        }
        true
    }

    /// The category's volume scalar; `None` for unknown keys.
    pub fn volume(&self, key: u32) -> Option<f32> {
        self.lock().get(&key).map(|category| category.volume)
    }

    /// Sets the category volume and applies it to every live handle.
    /// False for unknown keys.
    pub fn set_volume(&self, key: u32, volume: f32) -> bool {
        let mut categories = self.lock();
        let Some(category) = categories.get_mut(&key) else {
            return false;
        };
        category.volume = volume;
        for handle in &category.handles {
            handle.set_volume(volume);
        }
        true
    }

    /// Number of handles tracked in a category, dead ones included until
    /// the next [`clean`](Self::clean).
    pub fn handle_count(&self, key: u32) -> usize {
        self.lock()
            .get(&key)
            .map(|category| category.handles.len())
            .unwrap_or(0)
    }

    /// Drops invalid handles from every category.
    pub fn clean(&self) {
        let mut categories = self.lock();
        for category in categories.values_mut() {
            category
                .handles
                .retain(|handle| handle.status() != Status::Invalid);
        }
    }
}
