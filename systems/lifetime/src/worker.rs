use std::{
    io,
    sync::{Arc, Condvar, Mutex, PoisonError, RwLock},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use snake_hazards_world::Population;

use crate::{config::LifetimeWorkerConfig, metrics::LockMetrics, sweep::SweepTask};

#[derive(Debug, Default)]
struct Signal {
    shutdown: Mutex<bool>,
    wake: Condvar,
}

/// Background thread that decays lifetimes and schedules sweeps.
#[derive(Debug)]
pub(crate) struct LifetimeWorker {
    signal: Arc<Signal>,
    handle: Option<JoinHandle<()>>,
}

impl LifetimeWorker {
    pub(crate) fn spawn(
        population: Arc<RwLock<Population>>,
        config: LifetimeWorkerConfig,
        metrics: Arc<LockMetrics>,
    ) -> io::Result<Self> {
        let signal = Arc::new(Signal::default());
        let worker_signal = Arc::clone(&signal);
        let handle = thread::Builder::new()
            .name("obstacle-lifetime".into())
            .spawn(move || run(&population, &worker_signal, config, &metrics))?;
        log::info!(
            "lifetime worker started (decay every {}ms, sweep every {}ms)",
            config.decay_interval().as_millis(),
            config.sweep_interval().as_millis()
        );
        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    /// Signals shutdown and joins the thread.
    pub(crate) fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        {
            let mut shutdown = self
                .signal
                .shutdown
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *shutdown = true;
        }
        self.signal.wake.notify_all();

        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.join().is_err() {
            log::error!("lifetime worker thread panicked before shutdown");
            debug_assert!(false, "lifetime worker thread could not be joined");
        } else {
            log::info!("lifetime worker stopped");
        }
    }
}

impl Drop for LifetimeWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(
    population: &Arc<RwLock<Population>>,
    signal: &Signal,
    config: LifetimeWorkerConfig,
    metrics: &Arc<LockMetrics>,
) {
    let mut last_wake = Instant::now();
    let mut since_sweep = Duration::ZERO;
    let mut sweep: Option<SweepTask> = None;

    loop {
        let shutdown = signal
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (shutdown, _) = signal
            .wake
            .wait_timeout_while(shutdown, config.decay_interval(), |stop| !*stop)
            .unwrap_or_else(PoisonError::into_inner);
        if *shutdown {
            break;
        }
        drop(shutdown);

        let now = Instant::now();
        let elapsed = now.saturating_duration_since(last_wake);
        last_wake = now;

        let requested = Instant::now();
        let guard = population.read().unwrap_or_else(PoisonError::into_inner);
        metrics.record_read_wait("decay", requested.elapsed());
        guard.decay(elapsed);
        drop(guard);
        metrics.record_decay();

        since_sweep = since_sweep.saturating_add(elapsed);
        if since_sweep < config.sweep_interval() {
            continue;
        }
        since_sweep = Duration::ZERO;

        if sweep.as_ref().is_some_and(|task| !task.is_finished()) {
            log::debug!("previous sweep still running, skipping this cycle");
            continue;
        }
        if let Some(finished) = sweep.take() {
            let _ = finished.wait();
        }
        sweep = Some(SweepTask::spawn(
            Arc::clone(population),
            config.sweep_lock_timeout(),
            Arc::clone(metrics),
        ));
    }

    if let Some(pending) = sweep {
        let _ = pending.wait();
    }
}
