//! Fixed-rate control loop around [`DriveSystem::update`].
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` to the configured core.
//! 4. `sched_setscheduler(SCHED_FIFO, priority)`.
//!
//! All four are no-ops without the `rt` feature.
//!
//! ## Cycle
//! Absolute-deadline sleep (`clock_nanosleep(TIMER_ABSTIME)` under `rt`,
//! `std::thread::sleep` otherwise). Each cycle updates the IMU, runs one
//! drive tick and, every `status_interval` cycles, logs a JSON status line.
//! Overruns are counted and logged; the drive's own fault handling keeps
//! the hardware safe.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use quad_common::bus::{ActuatorBus, OrientationSensor};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CycleConfig;
use crate::drive::DriveSystem;

/// Cycle loop failure.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT setup or clock access failed.
    #[error("RT setup failed: {0}")]
    RtSetup(String),
}

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    sum_cycle_ns: i64,
    /// Cycles whose body exceeded the period.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record one cycle. No allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns;
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns], 0 before the first cycle.
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 256 KiB of stack so the loop does not page-fault on first use.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Full RT setup sequence. Call before [`CycleRunner::run`].
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns the drive and paces its ticks.
pub struct CycleRunner<B: ActuatorBus, S: OrientationSensor> {
    pub drive: DriveSystem<B, S>,
    pub stats: CycleStats,
    period_ns: i64,
    status_interval: u64,
    max_ticks: Option<u64>,
    running: Arc<AtomicBool>,
}

impl<B: ActuatorBus, S: OrientationSensor> CycleRunner<B, S> {
    pub fn new(mut drive: DriveSystem<B, S>, config: &CycleConfig) -> Self {
        drive.setup_imu(config.imu_filter_frequency);
        Self {
            drive,
            stats: CycleStats::new(),
            period_ns: 1_000_000_000 / i64::from(config.rate_hz.max(1)),
            status_interval: config.status_interval,
            max_ticks: None,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Stop after `ticks` cycles.
    pub fn with_tick_budget(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Flag that ends the loop when cleared (e.g. from a signal handler).
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    #[inline]
    pub const fn period_ns(&self) -> i64 {
        self.period_ns
    }

    fn should_continue(&self) -> bool {
        self.running.load(Ordering::Relaxed)
            && self.max_ticks.is_none_or(|max| self.stats.cycle_count < max)
    }

    /// Run until the tick budget is spent or the running flag is cleared.
    pub fn run(&mut self) -> Result<(), CycleError> {
        info!(
            "Cycle loop starting: period={}µs, budget={:?}",
            self.period_ns / 1000,
            self.max_ticks
        );

        #[cfg(feature = "rt")]
        let result = self.run_rt_loop();
        #[cfg(not(feature = "rt"))]
        let result = self.run_sim_loop();

        info!(
            "Cycle loop stopped: cycles={}, avg={}ns, max={}ns, overruns={}",
            self.stats.cycle_count,
            self.stats.avg_cycle_ns(),
            self.stats.max_cycle_ns,
            self.stats.overruns
        );
        result
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = || clock_gettime(clock).map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")));
        let epoch = now()?;
        let mut next_wake = epoch;

        while self.should_continue() {
            next_wake = timespec_add_ns(next_wake, self.period_ns);

            let cycle_start = now()?;
            let latency_ns = timespec_diff_ns(&cycle_start, &next_wake).abs();
            let now_ms = (timespec_diff_ns(&cycle_start, &epoch) / 1_000_000).max(0) as u64;

            self.cycle_body(now_ms);

            let duration_ns = timespec_diff_ns(&now()?, &cycle_start);
            self.record(duration_ns, latency_ns);

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self) -> Result<(), CycleError> {
        use std::time::{Duration, Instant};

        let epoch = Instant::now();
        let period = Duration::from_nanos(self.period_ns as u64);
        let mut next_wake = epoch;

        while self.should_continue() {
            next_wake += period;

            let cycle_start = Instant::now();
            let now_ms = cycle_start.duration_since(epoch).as_millis() as u64;

            self.cycle_body(now_ms);

            let duration_ns = cycle_start.elapsed().as_nanos() as i64;
            self.record(duration_ns, 0);

            if let Some(remaining) = next_wake.checked_duration_since(Instant::now()) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }

    fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.stats.record(duration_ns, latency_ns);
        if duration_ns > self.period_ns {
            self.stats.overruns += 1;
            warn!(
                "Cycle overrun #{}: {duration_ns}ns > {}ns",
                self.stats.overruns, self.period_ns
            );
        }
    }

    /// IMU update, drive tick, periodic status line.
    pub fn cycle_body(&mut self, now_ms: u64) {
        self.drive.update_imu();
        self.drive.update(now_ms);

        let cycle = self.stats.cycle_count;
        if self.status_interval > 0 && cycle % self.status_interval == 0 {
            match serde_json::to_string(&self.drive.status(now_ms)) {
                Ok(line) => debug!(target: "quad::status", "{line}"),
                Err(e) => warn!("Status serialization failed: {e}"),
            }
        }
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// `a − b` in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
