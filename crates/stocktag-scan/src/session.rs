//! # Scan Session
//!
//! A single-purpose state machine that owns one camera for its lifetime and
//! resolves to exactly one outcome.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ScanSession States                               │
//! │                                                                         │
//! │   ┌──────┐  start()   ┌───────────┐  frame read   ┌──────────┐          │
//! │   │ Idle │ ─────────► │ Acquiring │ ────────────► │ Decoding │          │
//! │   └──────┘            └───────────┘ ◄──────────── └──────────┘          │
//! │                          │   │      no code / malformed   │             │
//! │            open failed   │   │ device lost                │ decoded     │
//! │            or abandon()  │   │ or limit hit               │             │
//! │                          ▼   ▼                            ▼             │
//! │                      ┌────────┐                    ┌───────────┐        │
//! │                      │ Failed │                    │ Succeeded │        │
//! │                      └────────┘                    └───────────┘        │
//! │                                                                         │
//! │   cancel() from any non-terminal state ──► Cancelled                    │
//! │                                                                         │
//! │   The first terminal transition wins. Every terminal transition         │
//! │   closes the camera before the new state is visible.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Driving a Session
//! The session does no scheduling of its own. Something external calls it
//! on a cadence:
//!
//! ```text
//!   tick ──► begin_cycle() ──► CycleStart::Job(job) ──► job.run() ──► complete_cycle()
//!                │                                      (any thread)
//!                ├──► CycleStart::Busy     previous job still running, tick skipped
//!                ├──► CycleStart::NoFrame  camera had nothing ready
//!                └──► CycleStart::Resolved session is finished
//! ```
//!
//! [`ScanSession::tick`] does all of that inline for synchronous callers;
//! `driver::spawn_scan` runs jobs on tokio's blocking pool instead.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use stocktag_core::{MalformedPayloadError, PayloadCodec, ProductRecord};

use crate::error::ScanError;
use crate::events::{NoOpEmitter, ScanEventEmitter};
use crate::frame::{CameraDevice, Frame, FrameSource};
use crate::locator::Locator;

// =============================================================================
// States and Outcomes
// =============================================================================

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    /// Constructed, camera not touched yet.
    Idle,
    /// Camera open, waiting for a frame with a readable code.
    Acquiring,
    /// A frame is being located and decoded.
    Decoding,
    /// A product was read. Terminal.
    Succeeded,
    /// An unrecoverable condition ended the session. Terminal.
    Failed(ScanError),
    /// The caller cancelled. Terminal.
    Cancelled,
}

impl ScanState {
    /// Returns true for `Succeeded`, `Failed` and `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanState::Succeeded | ScanState::Failed(_) | ScanState::Cancelled
        )
    }

    /// Short lowercase name, for logs and events.
    pub fn name(&self) -> &'static str {
        match self {
            ScanState::Idle => "idle",
            ScanState::Acquiring => "acquiring",
            ScanState::Decoding => "decoding",
            ScanState::Succeeded => "succeeded",
            ScanState::Failed(_) => "failed",
            ScanState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanState::Failed(e) => write!(f, "failed: {}", e),
            other => f.write_str(other.name()),
        }
    }
}

/// The single result a session delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The first product successfully read.
    Succeeded(ProductRecord),
    /// Why the session gave up.
    Failed(ScanError),
    /// The caller cancelled; no product is delivered.
    Cancelled,
}

// =============================================================================
// Policy and Report
// =============================================================================

/// Session limits.
///
/// The default retries forever and accepts legacy labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPolicy {
    /// Decode with `PayloadCodec::decode_lenient` instead of `decode`.
    pub accept_legacy_labels: bool,
    /// Fail after this many unreadable payloads.
    pub max_rejected: Option<u32>,
    /// Fail when no product is read within this time.
    pub timeout: Option<Duration>,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        ScanPolicy {
            accept_legacy_labels: true,
            max_rejected: None,
            timeout: None,
        }
    }
}

/// Counters for one session, for logs and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub session_id: Uuid,
    /// Ticks handled before resolution.
    pub ticks: u64,
    /// Frames taken from the camera.
    pub frames_read: u64,
    /// Ticks skipped because a decode job was still running.
    pub skipped_ticks: u64,
    /// Codes seen that did not decode as a product.
    pub rejected_payloads: u32,
    /// Decode jobs that ran past the decode timeout.
    pub slow_jobs: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ScanReport {
    pub(crate) fn new(session_id: Uuid) -> Self {
        ScanReport {
            session_id,
            ticks: 0,
            frames_read: 0,
            skipped_ticks: 0,
            rejected_payloads: 0,
            slow_jobs: 0,
            started_at: None,
            resolved_at: None,
        }
    }

    /// Time from start to resolution, once resolved.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.resolved_at? - self.started_at?)
    }
}

// =============================================================================
// Decode Jobs
// =============================================================================

/// Result of running one [`DecodeJob`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    /// No code found in the frame.
    NoCode,
    /// A code was found but its text is not a product payload.
    Rejected(MalformedPayloadError),
    /// A product was read.
    Decoded(ProductRecord),
}

/// Locate + decode work for one frame. Owns everything it needs, so it can
/// run on any thread.
pub struct DecodeJob<L> {
    frame: Frame,
    locator: Arc<L>,
    lenient: bool,
}

impl<L: Locator> DecodeJob<L> {
    /// Runs the locator and, on a hit, the payload codec.
    pub fn run(self) -> JobResult {
        let Some(text) = self.locator.locate(&self.frame) else {
            return JobResult::NoCode;
        };

        let decoded = if self.lenient {
            PayloadCodec::decode_lenient(&text)
        } else {
            PayloadCodec::decode(&text)
        };

        match decoded {
            Ok(record) => JobResult::Decoded(record),
            Err(e) => JobResult::Rejected(e),
        }
    }
}

/// What [`ScanSession::begin_cycle`] produced.
pub enum CycleStart<L> {
    /// A frame is ready; run the job and pass its result to `complete_cycle`.
    Job(DecodeJob<L>),
    /// The camera had no frame ready.
    NoFrame,
    /// A job is already in flight; this tick was skipped.
    Busy,
    /// The session is in a terminal state.
    Resolved,
}

// =============================================================================
// Scan Session
// =============================================================================

/// Owns a camera from `start()` until resolution.
pub struct ScanSession<S: FrameSource, L: Locator> {
    id: Uuid,
    source: S,
    device: Option<S::Device>,
    locator: Arc<L>,
    policy: ScanPolicy,
    emitter: Arc<dyn ScanEventEmitter>,
    state: ScanState,
    /// Set while a decode job is out; cleared by `complete_cycle`.
    busy: bool,
    record: Option<ProductRecord>,
    delivered: bool,
    started: Option<Instant>,
    report: ScanReport,
}

impl<S: FrameSource, L: Locator> ScanSession<S, L> {
    /// Creates an idle session. The camera is not opened until `start()`.
    pub fn new(source: S, locator: L, policy: ScanPolicy) -> Self {
        Self::with_emitter(source, locator, policy, Arc::new(NoOpEmitter))
    }

    /// Creates an idle session with a custom event emitter.
    pub fn with_emitter(
        source: S,
        locator: L,
        policy: ScanPolicy,
        emitter: Arc<dyn ScanEventEmitter>,
    ) -> Self {
        let id = Uuid::new_v4();
        ScanSession {
            id,
            source,
            device: None,
            locator: Arc::new(locator),
            policy,
            emitter,
            state: ScanState::Idle,
            busy: false,
            record: None,
            delivered: false,
            started: None,
            report: ScanReport::new(id),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    /// Whether a decode job is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Opens the camera. `Idle → Acquiring`, or `Failed` if the camera is
    /// unavailable. Has no effect outside `Idle`.
    pub fn start(&mut self) -> &ScanState {
        if self.state != ScanState::Idle {
            return &self.state;
        }

        self.started = Some(Instant::now());
        self.report.started_at = Some(Utc::now());
        self.set_state(ScanState::Acquiring);

        match self.source.open() {
            Ok(device) => {
                info!(session_id = %self.id, "Camera opened, scanning");
                self.device = Some(device);
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Camera could not be opened");
                self.resolve(ScanState::Failed(ScanError::DeviceUnavailable(e)));
            }
        }

        &self.state
    }

    /// Reads one frame and hands out a decode job for it.
    ///
    /// Starts the session first if it is still idle. Returns `Busy` without
    /// touching the camera while a previous job is outstanding.
    pub fn begin_cycle(&mut self) -> CycleStart<L> {
        if self.state == ScanState::Idle {
            self.start();
        }
        if self.state.is_terminal() {
            return CycleStart::Resolved;
        }

        self.report.ticks += 1;

        if let (Some(limit), Some(started)) = (self.policy.timeout, self.started) {
            if started.elapsed() >= limit {
                self.resolve(ScanState::Failed(ScanError::TimedOut(limit.as_millis() as u64)));
                return CycleStart::Resolved;
            }
        }

        if self.busy {
            self.report.skipped_ticks += 1;
            debug!(session_id = %self.id, tick = self.report.ticks, "Decode in flight, skipping tick");
            return CycleStart::Busy;
        }

        let Some(device) = self.device.as_mut() else {
            self.resolve(ScanState::Failed(ScanError::Internal(
                "session has no open camera".into(),
            )));
            return CycleStart::Resolved;
        };

        match device.current_frame() {
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Camera lost mid-scan");
                self.resolve(ScanState::Failed(ScanError::DeviceUnavailable(e)));
                CycleStart::Resolved
            }
            Ok(None) => CycleStart::NoFrame,
            Ok(Some(frame)) => {
                self.report.frames_read += 1;

                if let Err(e) = frame.validate() {
                    debug!(session_id = %self.id, error = %e, "Dropping malformed frame");
                    return CycleStart::NoFrame;
                }

                self.busy = true;
                self.set_state(ScanState::Decoding);

                CycleStart::Job(DecodeJob {
                    frame,
                    locator: Arc::clone(&self.locator),
                    lenient: self.policy.accept_legacy_labels,
                })
            }
        }
    }

    /// Applies the result of the outstanding job and clears the busy flag.
    ///
    /// Results arriving after resolution are discarded.
    pub fn complete_cycle(&mut self, result: JobResult) -> &ScanState {
        self.busy = false;

        if self.state.is_terminal() {
            debug!(session_id = %self.id, "Discarding decode result after resolution");
            return &self.state;
        }

        match result {
            JobResult::Decoded(record) => {
                info!(
                    session_id = %self.id,
                    id = %record.id,
                    code = %record.code,
                    tick = self.report.ticks,
                    "Product read"
                );
                self.record = Some(record);
                self.resolve(ScanState::Succeeded);
            }
            JobResult::Rejected(e) => {
                self.report.rejected_payloads += 1;
                debug!(
                    session_id = %self.id,
                    reason = %e,
                    rejected = self.report.rejected_payloads,
                    "Code found but not a product payload"
                );
                self.emitter.emit_rejected(self.id, &e);

                match self.policy.max_rejected {
                    Some(limit) if self.report.rejected_payloads >= limit => {
                        self.resolve(ScanState::Failed(ScanError::RejectLimitReached(limit)));
                    }
                    _ => self.set_state(ScanState::Acquiring),
                }
            }
            JobResult::NoCode => self.set_state(ScanState::Acquiring),
        }

        &self.state
    }

    /// Records that the outstanding job has run past its time budget.
    ///
    /// The job keeps the slot: ticks are skipped until its result reaches
    /// `complete_cycle`.
    pub fn note_slow_job(&mut self) {
        if !self.busy || self.state.is_terminal() {
            return;
        }
        self.report.slow_jobs += 1;
        warn!(session_id = %self.id, tick = self.report.ticks, "Decode job is running long");
    }

    /// Runs one full cycle inline.
    pub fn tick(&mut self) -> &ScanState {
        if let CycleStart::Job(job) = self.begin_cycle() {
            let result = job.run();
            self.complete_cycle(result);
        }
        &self.state
    }

    /// Cancels the session. No product will be delivered.
    pub fn cancel(&mut self) -> &ScanState {
        self.resolve(ScanState::Cancelled);
        &self.state
    }

    /// Gives up on the session as a failure.
    pub fn abandon(&mut self) -> &ScanState {
        self.resolve(ScanState::Failed(ScanError::Abandoned));
        &self.state
    }

    /// Returns the outcome once the session is terminal. Only the first call
    /// returns `Some`.
    pub fn take_outcome(&mut self) -> Option<ScanOutcome> {
        if !self.state.is_terminal() || self.delivered {
            return None;
        }
        self.delivered = true;

        match &self.state {
            ScanState::Succeeded => self.record.take().map(ScanOutcome::Succeeded),
            ScanState::Failed(e) => Some(ScanOutcome::Failed(e.clone())),
            _ => Some(ScanOutcome::Cancelled),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn set_state(&mut self, state: ScanState) {
        if self.state != state {
            self.state = state;
            self.emitter.emit_state(self.id, &self.state);
        }
    }

    fn resolve(&mut self, state: ScanState) {
        if self.state.is_terminal() {
            return;
        }

        self.release_device();
        self.report.resolved_at = Some(Utc::now());

        info!(
            session_id = %self.id,
            outcome = %state,
            ticks = self.report.ticks,
            frames = self.report.frames_read,
            rejected = self.report.rejected_payloads,
            "Scan session resolved"
        );

        self.set_state(state);
    }

    fn release_device(&mut self) {
        if let Some(device) = self.device.take() {
            device.close();
            debug!(session_id = %self.id, "Camera released");
        }
    }
}

impl<S: FrameSource, L: Locator> Drop for ScanSession<S, L> {
    fn drop(&mut self) {
        self.release_device();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
