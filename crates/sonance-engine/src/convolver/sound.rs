//! The convolved sound factory.

use std::sync::{Arc, Mutex};

use sonance_core::{Reader, Result, Sound};

use crate::config::DEFAULT_CONVOLVER_THREADS;
use crate::convolver::{ConvolverReader, ImpulseResponse};

/// A sound convolved with an impulse response.
///
/// Swapping the impulse response affects only readers created afterwards;
/// live readers keep the response they were built with.
pub struct ConvolverSound {
    sound: Arc<dyn Sound>,
    ir: Mutex<Arc<ImpulseResponse>>,
    threads: usize,
}

impl ConvolverSound {
    pub fn new(sound: Arc<dyn Sound>, ir: Arc<ImpulseResponse>) -> Self {
        Self::with_threads(sound, ir, DEFAULT_CONVOLVER_THREADS)
    }

    /// `threads` is the total parallelism hint handed to each reader.
    pub fn with_threads(sound: Arc<dyn Sound>, ir: Arc<ImpulseResponse>, threads: usize) -> Self {
        Self {
            sound,
            ir: Mutex::new(ir),
            threads: threads.max(1),
        }
    }

    pub fn impulse_response(&self) -> Arc<ImpulseResponse> {
        Arc::clone(&self.ir.lock().expect("impulse response mutex poisoned"))
    }

    pub fn set_impulse_response(&self, ir: Arc<ImpulseResponse>) {
        *self.ir.lock().expect("impulse response mutex poisoned") = ir;
    }
}

impl Sound for ConvolverSound {
    fn create_reader(&self) -> Result<Box<dyn Reader>> {
        let reader = self.sound.create_reader()?;
        Ok(Box::new(ConvolverReader::new(
            reader,
            self.impulse_response(),
            self.threads,
        )?))
    }
}
