//! Host port: runs an rtk kernel on a desktop OS.
//!
//! A background thread plays the clock interrupt, the idle hook sleeps
//! instead of waiting for an interrupt, and Ctrl-C ends the run loop.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use rtk_core::Priority;
use rtk_kernel::{Kernel, KernelHooks};

/// Idle hook yielding the CPU for `period` whenever nothing is ready.
#[derive(Debug, Clone, Copy)]
pub struct SleepingIdle {
    period: Duration,
}

impl SleepingIdle {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

impl Default for SleepingIdle {
    fn default() -> Self {
        Self::new(Duration::from_millis(1))
    }
}

impl KernelHooks for SleepingIdle {
    fn on_startup(&self) {
        log::info!("rtk posix port started");
    }

    fn on_idle(&self) {
        thread::sleep(self.period);
    }

    fn on_context_switch(&self, prev: Priority, next: Priority) {
        log::trace!("switch {prev} -> {next}");
    }

    fn on_cleanup(&self) {
        log::info!("rtk posix port stopped");
    }
}

struct TickThread {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Owns a kernel and the threads that feed it.
pub struct PosixRuntime {
    kernel: Arc<Kernel>,
    stopping: Arc<AtomicBool>,
    ticker: Mutex<Option<TickThread>>,
}

impl PosixRuntime {
    pub fn new(kernel: Arc<Kernel>) -> Self {
        Self {
            kernel,
            stopping: Arc::new(AtomicBool::new(false)),
            ticker: Mutex::new(None),
        }
    }

    pub fn kernel(&self) -> Arc<Kernel> {
        Arc::clone(&self.kernel)
    }

    /// Starts a thread calling `tick(0)` every `period`. Replaces a ticker
    /// started earlier.
    pub fn spawn_ticker(&self, period: Duration) -> io::Result<()> {
        self.stop_ticker();

        let stop = Arc::new(AtomicBool::new(false));
        let kernel = Arc::clone(&self.kernel);
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("rtk-tick".into())
            .spawn(move || {
                while !thread_stop.load(Ordering::Relaxed) {
                    thread::sleep(period);
                    kernel.tick(0);
                }
            })?;

        log::debug!("tick thread started, period {period:?}");
        *self.ticker.lock() = Some(TickThread { stop, handle });
        Ok(())
    }

    /// Makes Ctrl-C end [`run`](Self::run). Only one handler can be installed
    /// per process.
    pub fn install_ctrlc_handler(&self) -> Result<(), ctrlc::Error> {
        let stopping = Arc::clone(&self.stopping);
        let kernel = Arc::clone(&self.kernel);
        ctrlc::set_handler(move || {
            log::info!("interrupted, stopping");
            stopping.store(true, Ordering::SeqCst);
            kernel.stop();
        })
    }

    /// Runs the kernel on the calling thread until [`stop`](Self::stop) or
    /// Ctrl-C, then stops the tick thread. Returns at once if stop was
    /// already requested.
    pub fn run(&self) {
        let stopping = Arc::clone(&self.stopping);
        self.kernel.run_until(move || stopping.load(Ordering::SeqCst));
        self.stop_ticker();
    }

    pub fn stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.kernel.stop();
    }

    fn stop_ticker(&self) {
        let Some(ticker) = self.ticker.lock().take() else {
            return;
        };
        ticker.stop.store(true, Ordering::Relaxed);
        if ticker.handle.join().is_err() {
            log::error!("tick thread panicked");
        }
    }
}

impl Drop for PosixRuntime {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
