use std::{
    collections::VecDeque,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
};

use crate::error::GenerationError;

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Queue {
    jobs: VecDeque<Job>,
    stopping: bool,
}

#[derive(Default)]
struct Shared {
    queue: Mutex<Queue>,
    available: Condvar,
    active: AtomicUsize,
    running: AtomicUsize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fixed set of worker threads fed from a shared job queue.
///
/// Jobs run in no particular order. Jobs still queued at shutdown are dropped
/// without running.
pub(crate) struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    pub(crate) fn new(size: usize, name: &str) -> Result<Self, GenerationError> {
        let mut pool = Self {
            shared: Arc::new(Shared::default()),
            workers: Vec::with_capacity(size.max(1)),
        };
        for index in 0..size.max(1) {
            let shared = Arc::clone(&pool.shared);
            let spawned = thread::Builder::new()
                .name(format!("{name}-{index}"))
                .spawn(move || work(&shared));
            match spawned {
                Ok(handle) => pool.workers.push(handle),
                Err(error) => {
                    pool.shutdown();
                    return Err(GenerationError::Spawn(error));
                }
            }
        }
        log::debug!("{name} pool started with {} workers", pool.workers.len());
        Ok(pool)
    }

    pub(crate) fn execute(&self, job: Job) -> Result<(), GenerationError> {
        {
            let mut queue = self.shared.lock();
            if queue.stopping {
                return Err(GenerationError::PoolStopped);
            }
            queue.jobs.push_back(job);
        }
        self.shared.available.notify_one();
        Ok(())
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.shared.lock().stopping && !self.workers.is_empty()
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub(crate) fn running_workers(&self) -> usize {
        self.shared.running.load(Ordering::Acquire)
    }

    pub(crate) fn active_workers(&self) -> usize {
        self.shared.active.load(Ordering::Acquire)
    }

    pub(crate) fn shutdown(&mut self) {
        let dropped = {
            let mut queue = self.shared.lock();
            queue.stopping = true;
            std::mem::take(&mut queue.jobs)
        };
        self.shared.available.notify_all();
        if !dropped.is_empty() {
            log::debug!("dropping {} queued generation jobs", dropped.len());
        }
        drop(dropped);

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("generator worker thread could not be joined");
                debug_assert!(false, "generator worker thread could not be joined");
            }
        }
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("workers", &self.workers.len())
            .field("active", &self.active_workers())
            .finish()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn work(shared: &Shared) {
    let _ = shared.running.fetch_add(1, Ordering::AcqRel);
    loop {
        let job = {
            let queue = shared.lock();
            let mut queue = shared
                .available
                .wait_while(queue, |queue| queue.jobs.is_empty() && !queue.stopping)
                .unwrap_or_else(PoisonError::into_inner);
            if queue.stopping {
                break;
            }
            queue.jobs.pop_front()
        };

        let Some(job) = job else {
            continue;
        };
        let _ = shared.active.fetch_add(1, Ordering::AcqRel);
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            log::error!("generation job panicked");
        }
        let _ = shared.active.fetch_sub(1, Ordering::AcqRel);
    }
    let _ = shared.running.fetch_sub(1, Ordering::AcqRel);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{mpsc, Barrier},
        time::Duration,
    };

    #[test]
    fn runs_submitted_jobs() {
        let pool = ThreadPool::new(2, "test").expect("pool starts");
        let (sender, receiver) = mpsc::channel();
        for value in 0..10 {
            let sender = sender.clone();
            pool.execute(Box::new(move || {
                let _ = sender.send(value);
            }))
            .expect("pool accepts jobs");
        }
        drop(sender);
        let mut received: Vec<i32> = receiver.iter().take(10).collect();
        received.sort_unstable();
        assert_eq!(received, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn zero_size_still_gets_one_worker() {
        let pool = ThreadPool::new(0, "test").expect("pool starts");
        assert_eq!(pool.worker_count(), 1);
    }

    #[test]
    fn rejects_jobs_after_shutdown() {
        let mut pool = ThreadPool::new(1, "test").expect("pool starts");
        assert!(pool.is_running());
        pool.shutdown();
        assert!(!pool.is_running());
        assert_eq!(pool.running_workers(), 0);
        assert!(matches!(
            pool.execute(Box::new(|| {})),
            Err(GenerationError::PoolStopped)
        ));
    }

    #[test]
    fn shutdown_drops_queued_jobs() {
        let mut pool = ThreadPool::new(1, "test").expect("pool starts");
        let gate = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        {
            let gate = Arc::clone(&gate);
            let release = Arc::clone(&release);
            pool.execute(Box::new(move || {
                let _ = gate.wait();
                let _ = release.wait();
            }))
            .expect("pool accepts jobs");
        }
        let _ = gate.wait();

        let (sender, receiver) = mpsc::channel::<()>();
        pool.execute(Box::new(move || {
            let _ = sender.send(());
        }))
        .expect("pool accepts jobs");

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let _ = release.wait();
        });
        pool.shutdown();
        releaser.join().expect("releaser finished");
        assert!(receiver.recv().is_err(), "queued job should have been dropped");
    }

    #[test]
    fn panicking_job_keeps_worker_alive() {
        let pool = ThreadPool::new(1, "test").expect("pool starts");
        pool.execute(Box::new(|| panic!("job failure")))
            .expect("pool accepts jobs");
        let (sender, receiver) = mpsc::channel();
        pool.execute(Box::new(move || {
            let _ = sender.send(7);
        }))
        .expect("pool accepts jobs");
        assert_eq!(receiver.recv_timeout(Duration::from_secs(5)), Ok(7));
    }
}
