//! # stocktag-scan: Camera Scan Sessions
//!
//! Reads product labels from a live camera. A session samples frames at a
//! fixed interval, looks for an optical code in each one, decodes the code
//! text with `stocktag-core`, and resolves exactly once.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        stocktag-scan                                    │
//! │                                                                         │
//! │   Scanner ── one camera slot (Semaphore(1)) ── preempt / wait           │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │   driver (tokio task)                                                   │
//! │      │  ticker ─► session.begin_cycle() ─► spawn_blocking(job.run())    │
//! │      │  control ─► cancel / abandon                                     │
//! │      ▼                                                                  │
//! │   ScanSession (sync state machine)                                      │
//! │      Idle ─► Acquiring ⇄ Decoding ─► Succeeded | Failed | Cancelled     │
//! │      │                                                                  │
//! │      ├── FrameSource / CameraDevice   (platform camera seam)            │
//! │      └── Locator                      (QrLocator via rqrr)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`session`] - Scan state machine, decode jobs and reports
//! - [`driver`] - Tokio task that drives a session
//! - [`scanner`] - Exclusive camera access across sessions
//! - [`frame`] - Frames and the camera traits
//! - [`locator`] - Finds code text in a frame
//! - [`config`] - `scan.toml` settings and env overrides
//! - [`events`] - Cosmetic progress notifications
//! - [`error`] - Scan error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod frame;
pub mod locator;
pub mod scanner;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{LabelSettings, ScanConfig, ScanSettings};
pub use driver::{spawn_scan, spawn_scan_with_emitter, ScanControl, ScanHandle, ScanResolution};
pub use error::{DeviceError, ScanError, ScanResult};
pub use events::{NoOpEmitter, ScanEventEmitter};
pub use frame::{CameraDevice, Frame, FrameSizeError, FrameSource, PixelFormat};
pub use locator::{Locator, QrLocator};
pub use scanner::Scanner;
pub use session::{
    CycleStart, DecodeJob, JobResult, ScanOutcome, ScanPolicy, ScanReport, ScanSession, ScanState,
};
