//! A small shared worker pool for spectral jobs.

use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use sonance_core::{Error, Result};

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed worker threads draining a shared job queue. Dropping the pool
/// closes the queue and joins every worker.
pub(crate) struct WorkerPool {
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub(crate) fn new(threads: usize) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let rx = rx.clone();
            let worker = std::thread::Builder::new()
                .name(format!("sonance-convolver-{index}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        job();
                    }
                })
                .map_err(|e| Error::memory(format!("failed to spawn convolver worker: {e}")))?;
            workers.push(worker);
        }
        Ok(Self {
            tx: Some(tx),
            workers,
        })
    }

    pub(crate) fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Queues a job; returns false if the pool already shut down.
    pub(crate) fn execute(&self, job: Job) -> bool {
        match &self.tx {
            Some(tx) => tx.send(job).is_ok(),
            None => false,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.tx.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("convolver worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WorkerPool;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn executes_jobs_and_joins_on_drop() {
        let pool = WorkerPool::new(2).expect("spawnable");
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..16 {
            let counter = Arc::clone(&counter);
            assert!(pool.execute(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })));
        }
        drop(pool);
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }
}
