//! Scan engine: owns the scan thread and its lifecycle.
//!
//! The loop runs on a dedicated OS thread named `plc-scan`. Each iteration
//! executes one cycle under the image locks, releases them, then sleeps the
//! remainder of the period. A cycle that overruns is counted as a timing
//! violation and the next one starts a full period later.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use plc_common::image::ProcessImage;
use tracing::{debug, error, info, warn};

use crate::cycle::{CycleStats, ScanReport, execute_scan};
use crate::error::{EngineError, ScanError};
use crate::process::seed_initial_conditions;
use crate::state::{EngineCommand, EngineState, Lifecycle};

/// Cycles between debug summaries.
const SUMMARY_INTERVAL: u64 = 100;

/// Timing violations and faults logged individually before switching to
/// sampling.
const VIOLATION_LOG_BURST: u64 = 10;

/// Whether the `n`th occurrence of a repeating event gets a log line: the
/// first burst, then every 1000th.
fn sampled(n: u64) -> bool {
    n <= VIOLATION_LOG_BURST || n % 1000 == 0
}

/// Periodic scan engine over a shared process image.
pub struct ScanEngine {
    image: Arc<ProcessImage>,
    period: Duration,
    running: Arc<AtomicBool>,
    stats: Arc<Mutex<CycleStats>>,
    lifecycle: Mutex<Lifecycle>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ScanEngine {
    /// Create a stopped engine and seed the initial process conditions.
    pub fn new(image: Arc<ProcessImage>, period: Duration) -> Result<Self, EngineError> {
        seed_initial_conditions(&image)?;
        info!(
            "Scan engine created (period={}ms, image={:?})",
            period.as_millis(),
            image.sizes()
        );
        Ok(Self {
            image,
            period,
            running: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(Mutex::new(CycleStats::new())),
            lifecycle: Mutex::new(Lifecycle::new()),
            handle: Mutex::new(None),
        })
    }

    /// Shared image this engine scans.
    pub fn image(&self) -> &Arc<ProcessImage> {
        &self.image
    }

    /// Configured scan period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.lifecycle.lock().state()
    }

    /// Copy of the cycle statistics.
    pub fn stats(&self) -> CycleStats {
        *self.stats.lock()
    }

    /// Spawn the scan thread.
    pub fn start(&self) -> Result<(), EngineError> {
        let mut lifecycle = self.lifecycle.lock();
        // Validate first so a refused start changes nothing.
        let mut next = *lifecycle;
        next.transition(EngineCommand::Start)?;

        self.running.store(true, Ordering::SeqCst);
        let worker = ScanWorker {
            image: Arc::clone(&self.image),
            period: self.period,
            running: Arc::clone(&self.running),
            stats: Arc::clone(&self.stats),
        };
        let handle = thread::Builder::new()
            .name("plc-scan".to_string())
            .spawn(move || worker.run())
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                EngineError::Spawn(e.to_string())
            })?;

        *self.handle.lock() = Some(handle);
        *lifecycle = next;
        info!("Scan engine started");
        Ok(())
    }

    /// Stop scheduling ticks and join the scan thread.
    ///
    /// A tick in progress completes; the call returns within one period.
    /// The lifecycle lock is released before joining, so [`ScanEngine::state`]
    /// answers `Stopped` while the join is pending.
    pub fn stop(&self) -> Result<(), EngineError> {
        let handle = {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle.transition(EngineCommand::Stop)?;
            self.running.store(false, Ordering::SeqCst);
            self.handle.lock().take()
        };

        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Scan thread terminated abnormally");
            }
        }

        let stats = self.stats();
        info!(
            "Scan engine stopped: {} cycles, avg={}us, max={}us, violations={}, faulted={}",
            stats.cycle_count,
            stats.avg_cycle().as_micros(),
            stats.max_cycle.as_micros(),
            stats.timing_violations,
            stats.faulted_cycles
        );
        Ok(())
    }

    /// Run one cycle synchronously on the caller's thread.
    ///
    /// Statistics are updated the same way as for a threaded cycle. Meant for
    /// tests and tools; calling it while the thread runs is safe but
    /// interleaves extra ticks.
    pub fn scan_once(&self) -> Result<ScanReport, ScanError> {
        let started = Instant::now();
        let result = guarded_scan(&self.image);
        let mut stats = self.stats.lock();
        stats.record(started.elapsed());
        if result.is_err() {
            stats.record_fault();
        }
        result
    }
}

impl Drop for ScanEngine {
    fn drop(&mut self) {
        if self.state() == EngineState::Running {
            let _ = self.stop();
        }
    }
}

impl std::fmt::Debug for ScanEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanEngine")
            .field("period", &self.period)
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Execute one cycle, converting a panic into [`ScanError::Panicked`].
fn guarded_scan(image: &ProcessImage) -> Result<ScanReport, ScanError> {
    catch_cycle(|| execute_scan(image))
}

fn catch_cycle<T>(body: impl FnOnce() -> Result<T, ScanError>) -> Result<T, ScanError> {
    panic::catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Err(ScanError::Panicked(message))
    })
}

/// State moved onto the scan thread.
struct ScanWorker {
    image: Arc<ProcessImage>,
    period: Duration,
    running: Arc<AtomicBool>,
    stats: Arc<Mutex<CycleStats>>,
}

impl ScanWorker {
    fn run(self) {
        debug!("Scan thread entered");
        while self.running.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();
            let result = guarded_scan(&self.image);
            let elapsed = cycle_start.elapsed();

            let snapshot = {
                let mut stats = self.stats.lock();
                stats.record(elapsed);
                if let Err(e) = &result {
                    stats.record_fault();
                    if sampled(stats.faulted_cycles) {
                        error!(
                            "Scan cycle #{} faulted: {} (faulted={})",
                            stats.cycle_count, e, stats.faulted_cycles
                        );
                    }
                }
                if elapsed > self.period {
                    stats.record_violation();
                }
                *stats
            };

            if elapsed > self.period {
                let n = snapshot.timing_violations;
                if sampled(n) {
                    warn!(
                        "Timing violation #{}: cycle took {}us (period {}us)",
                        n,
                        elapsed.as_micros(),
                        self.period.as_micros()
                    );
                }
                // Overrun: never queue a catch-up tick.
                thread::sleep(self.period);
            } else {
                thread::sleep(self.period - elapsed);
            }

            if snapshot.cycle_count % SUMMARY_INTERVAL == 0 {
                debug!(
                    "Scan loop: {} cycles, avg={}us, max={}us, violations={}, faulted={}",
                    snapshot.cycle_count,
                    snapshot.avg_cycle().as_micros(),
                    snapshot.max_cycle.as_micros(),
                    snapshot.timing_violations,
                    snapshot.faulted_cycles
                );
            }
        }
        debug!("Scan thread exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plc_common::image::{Bank, BankSizes};

    fn engine(period_ms: u64) -> ScanEngine {
        ScanEngine::new(Arc::new(ProcessImage::default()), Duration::from_millis(period_ms))
            .unwrap()
    }

    #[test]
    fn new_seeds_initial_conditions() {
        let e = engine(100);
        assert_eq!(e.image().read_word(Bank::IntegerOutputs, 0).unwrap(), 800);
        assert_eq!(e.image().read_word(Bank::IntegerOutputs, 4).unwrap(), 800);
        assert_eq!(e.state(), EngineState::Stopped);
    }

    #[test]
    fn new_rejects_image_without_setpoint_register() {
        let image = ProcessImage::new(BankSizes::uniform(4));
        assert!(matches!(
            ScanEngine::new(Arc::new(image), Duration::from_millis(10)),
            Err(EngineError::Seed(_))
        ));
    }

    #[test]
    fn scan_once_counts_cycles() {
        let e = engine(100);
        e.scan_once().unwrap();
        e.scan_once().unwrap();
        let stats = e.stats();
        assert_eq!(stats.cycle_count, 2);
        assert_eq!(stats.faulted_cycles, 0);
    }

    #[test]
    fn panicking_cycle_becomes_error() {
        let result = catch_cycle(|| -> Result<(), ScanError> { panic!("boom") });
        assert_eq!(result, Err(ScanError::Panicked("boom".into())));

        let result = catch_cycle(|| -> Result<(), ScanError> { panic!("cycle {}", 7) });
        assert_eq!(result, Err(ScanError::Panicked("cycle 7".into())));
    }

    #[test]
    fn threaded_engine_ticks_and_stops() {
        let e = engine(5);
        e.start().unwrap();
        std::thread::sleep(Duration::from_millis(60));
        e.stop().unwrap();
        let cycles = e.stats().cycle_count;
        assert!(cycles >= 2, "only {cycles} cycles");
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(e.stats().cycle_count, cycles);
    }

    #[test]
    fn repeated_events_are_sampled_after_burst() {
        assert!((1..=VIOLATION_LOG_BURST).all(sampled));
        assert!(!sampled(VIOLATION_LOG_BURST + 1));
        assert!(!sampled(999));
        assert!(sampled(1000));
        assert!(!sampled(1001));
        assert!(sampled(5000));
    }

    #[test]
    fn state_answers_while_stop_joins() {
        let e = Arc::new(engine(300));
        e.start().unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let stopper = {
            let e = Arc::clone(&e);
            std::thread::spawn(move || e.stop())
        };
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(e.state(), EngineState::Stopped);
        assert!(!stopper.is_finished());

        stopper.join().unwrap().unwrap();
        assert!(matches!(e.stop(), Err(EngineError::NotRunning)));
    }
}
