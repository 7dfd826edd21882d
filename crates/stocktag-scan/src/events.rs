//! # Scan Events
//!
//! Cosmetic notifications for a "still scanning" indicator. They are not part
//! of the outcome contract: a consumer that ignores them loses nothing.

use uuid::Uuid;

use stocktag_core::MalformedPayloadError;

use crate::session::ScanState;

/// Trait for emitting scan events (implemented by the consuming screen).
pub trait ScanEventEmitter: Send + Sync {
    /// Emits a state transition.
    fn emit_state(&self, session_id: Uuid, state: &ScanState);

    /// Emits a code that was seen but did not decode as a product.
    fn emit_rejected(&self, session_id: Uuid, error: &MalformedPayloadError);
}

/// No-op event emitter.
pub struct NoOpEmitter;

impl ScanEventEmitter for NoOpEmitter {
    fn emit_state(&self, _session_id: Uuid, _state: &ScanState) {}
    fn emit_rejected(&self, _session_id: Uuid, _error: &MalformedPayloadError) {}
}
