//! # Scan Driver
//!
//! Runs a [`ScanSession`] on tokio: a fixed-cadence ticker, decode jobs on
//! the blocking pool, and a control channel for cancel/abandon.
//!
//! ## Driver Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Scan Driver Loop                                │
//! │                                                                         │
//! │   spawn_blocking(session.start())        camera open, once              │
//! │            │                                                            │
//! │            ▼                                                            │
//! │   ┌──────────────── select! (biased) ─────────────────┐                 │
//! │   │ 1. control_rx     cancel / abandon / handle drop  │ ◄── always wins │
//! │   │ 2. job_rx         decode result, frees the slot   │                 │
//! │   │ 3. deadline       decode job running long → noted │                 │
//! │   │ 4. ticker         begin_cycle() → spawn_blocking  │                 │
//! │   └───────────────────────┬───────────────────────────┘                 │
//! │                           │ until terminal                              │
//! │                           ▼                                             │
//! │   outcome_tx.send(ScanResolution)       exactly once                    │
//! │                                                                         │
//! │  TIMING:                                                               │
//! │  • Tick interval: 500 ms (configurable), missed ticks are skipped      │
//! │  • One decode job at a time; ticks during a job are counted as skipped │
//! │  • Decode timeout: 2 s (configurable), overruns are counted but the    │
//! │    slot stays busy until the job returns                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,ignore
//! let handle = spawn_scan(camera, QrLocator::new(), &ScanConfig::default());
//! let canceller = handle.control();   // give this to the screen's close button
//!
//! match handle.outcome().await?.outcome {
//!     ScanOutcome::Succeeded(record) => show(record),
//!     ScanOutcome::Failed(e) => report(e),
//!     ScanOutcome::Cancelled => {}
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, OwnedSemaphorePermit};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::ScanConfig;
use crate::error::{ScanError, ScanResult};
use crate::events::{NoOpEmitter, ScanEventEmitter};
use crate::frame::FrameSource;
use crate::locator::Locator;
use crate::session::{CycleStart, JobResult, ScanOutcome, ScanReport, ScanSession};

// =============================================================================
// Control and Handles
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Control {
    Cancel,
    Abandon,
}

/// Cloneable remote for a running scan.
#[derive(Clone)]
pub struct ScanControl {
    tx: mpsc::Sender<Control>,
}

impl ScanControl {
    /// Requests cancellation. Takes effect before the next tick.
    pub fn cancel(&self) {
        self.send(Control::Cancel);
    }

    /// Ends the scan as `Failed(Abandoned)`.
    pub fn abandon(&self) {
        self.send(Control::Abandon);
    }

    /// Returns true once the scan has resolved.
    pub fn is_finished(&self) -> bool {
        self.tx.is_closed()
    }

    pub(crate) fn downgrade(&self) -> WeakScanControl {
        WeakScanControl {
            tx: self.tx.downgrade(),
        }
    }

    fn send(&self, control: Control) {
        // Full means a request is already queued; closed means resolved.
        if let Err(e) = self.tx.try_send(control) {
            debug!(?control, error = %e, "Scan control not delivered");
        }
    }
}

/// A [`ScanControl`] that does not keep the scan alive.
pub(crate) struct WeakScanControl {
    tx: mpsc::WeakSender<Control>,
}

impl WeakScanControl {
    pub(crate) fn upgrade(&self) -> Option<ScanControl> {
        self.tx.upgrade().map(|tx| ScanControl { tx })
    }
}

/// The terminal outcome plus the session counters.
#[derive(Debug, Clone)]
pub struct ScanResolution {
    pub outcome: ScanOutcome,
    pub report: ScanReport,
}

/// Handle to a running scan.
///
/// Dropping the handle (and every [`ScanControl`] cloned from it) cancels
/// the scan.
pub struct ScanHandle {
    session_id: Uuid,
    control: ScanControl,
    outcome_rx: oneshot::Receiver<ScanResolution>,
}

impl ScanHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Returns a remote that can cancel the scan while `outcome()` is awaited.
    pub fn control(&self) -> ScanControl {
        self.control.clone()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// Ends the scan as `Failed(Abandoned)`.
    pub fn abandon(&self) {
        self.control.abandon();
    }

    /// Waits for the scan to resolve.
    pub async fn outcome(self) -> ScanResult<ScanResolution> {
        let ScanHandle {
            control,
            outcome_rx,
            ..
        } = self;

        let resolution = outcome_rx
            .await
            .map_err(|_| ScanError::Internal("scan task ended without an outcome".into()));

        // Held until here so that awaiting does not look like a dropped handle.
        drop(control);
        resolution
    }
}

// =============================================================================
// Spawning
// =============================================================================

/// Spawns a scan on the current tokio runtime.
///
/// ## Panics
/// Panics if called outside a tokio runtime.
pub fn spawn_scan<S, L>(source: S, locator: L, config: &ScanConfig) -> ScanHandle
where
    S: FrameSource,
    L: Locator,
{
    spawn_scan_with_emitter(source, locator, config, Arc::new(NoOpEmitter))
}

/// Spawns a scan with a custom event emitter.
pub fn spawn_scan_with_emitter<S, L>(
    source: S,
    locator: L,
    config: &ScanConfig,
    emitter: Arc<dyn ScanEventEmitter>,
) -> ScanHandle
where
    S: FrameSource,
    L: Locator,
{
    spawn_with_permit(source, locator, config, emitter, None)
}

/// Spawns a scan that holds `permit` until the camera is released.
pub(crate) fn spawn_with_permit<S, L>(
    source: S,
    locator: L,
    config: &ScanConfig,
    emitter: Arc<dyn ScanEventEmitter>,
    permit: Option<OwnedSemaphorePermit>,
) -> ScanHandle
where
    S: FrameSource,
    L: Locator,
{
    let session = ScanSession::with_emitter(source, locator, config.policy(), emitter);
    let session_id = session.id();

    let (control_tx, control_rx) = mpsc::channel(4);
    let (outcome_tx, outcome_rx) = oneshot::channel();

    let driver = Driver {
        interval: config.interval(),
        decode_timeout: config.decode_timeout(),
        control_rx,
    };

    tokio::spawn(async move {
        let resolution = driver.run(session).await;
        if outcome_tx.send(resolution).is_err() {
            debug!(%session_id, "Scan outcome had no receiver");
        }
        drop(permit);
    });

    ScanHandle {
        session_id,
        control: ScanControl { tx: control_tx },
        outcome_rx,
    }
}

// =============================================================================
// Driver
// =============================================================================

struct Driver {
    interval: Duration,
    decode_timeout: Duration,
    control_rx: mpsc::Receiver<Control>,
}

impl Driver {
    async fn run<S, L>(mut self, session: ScanSession<S, L>) -> ScanResolution
    where
        S: FrameSource,
        L: Locator,
    {
        let session_id = session.id();
        info!(%session_id, interval_ms = self.interval.as_millis() as u64, "Scan starting");

        // Opening a camera can block for a while.
        let opened = tokio::task::spawn_blocking(move || {
            let mut session = session;
            session.start();
            session
        })
        .await;

        let mut session = match opened {
            Ok(session) => session,
            Err(e) => {
                error!(%session_id, error = %e, "Camera open task failed");
                return ScanResolution {
                    outcome: ScanOutcome::Failed(ScanError::Internal(e.to_string())),
                    report: ScanReport::new(session_id),
                };
            }
        };

        let (job_tx, mut job_rx) = mpsc::unbounded_channel::<JobResult>();
        // Set while the in-flight job has not yet run past its time budget.
        let mut deadline: Option<Instant> = None;

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !session.state().is_terminal() {
            tokio::select! {
                biased;

                control = self.control_rx.recv() => match control {
                    Some(Control::Cancel) => {
                        session.cancel();
                    }
                    Some(Control::Abandon) => {
                        info!(%session_id, "Scan abandoned by caller");
                        session.abandon();
                    }
                    None => {
                        debug!(%session_id, "All scan handles dropped, cancelling");
                        session.cancel();
                    }
                },

                Some(result) = job_rx.recv() => {
                    deadline = None;
                    session.complete_cycle(result);
                }

                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    session.note_slow_job();
                }

                _ = ticker.tick() => {
                    if let CycleStart::Job(job) = session.begin_cycle() {
                        let tx = job_tx.clone();
                        deadline = Some(Instant::now() + self.decode_timeout);

                        tokio::task::spawn_blocking(move || {
                            // The receiver is gone once the scan has resolved.
                            let _ = tx.send(job.run());
                        });
                    }
                }
            }
        }

        let report = session.report().clone();
        let outcome = session.take_outcome().unwrap_or_else(|| {
            ScanOutcome::Failed(ScanError::Internal("session resolved without an outcome".into()))
        });

        ScanResolution { outcome, report }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
