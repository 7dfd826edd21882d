//! # Scanner
//!
//! Entry point for screens that scan. Guarantees that at most one session
//! holds the camera at any time: a new scan waits for the previous session to
//! release the device, or preempts it.
//!
//! ```text
//!   scan()            ──► acquire camera slot ──► spawn driver ──► ScanHandle
//!   scan_preempting() ──► cancel current ─────┘
//!
//!   slot released only after the session has closed its device
//! ```

use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::driver::{spawn_with_permit, ScanHandle, WeakScanControl};
use crate::error::{ScanError, ScanResult};
use crate::events::{NoOpEmitter, ScanEventEmitter};
use crate::frame::FrameSource;
use crate::locator::Locator;

/// Serializes access to the camera across scan sessions.
pub struct Scanner {
    config: ScanConfig,
    emitter: Arc<dyn ScanEventEmitter>,
    slot: Arc<Semaphore>,
    // Weak so that dropping the caller's handle still cancels the session.
    current: Mutex<Option<WeakScanControl>>,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self::with_emitter(config, Arc::new(NoOpEmitter))
    }

    pub fn with_emitter(config: ScanConfig, emitter: Arc<dyn ScanEventEmitter>) -> Self {
        Scanner {
            config,
            emitter,
            slot: Arc::new(Semaphore::new(1)),
            current: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// True when no session holds the camera.
    pub fn is_idle(&self) -> bool {
        self.slot.available_permits() == 1
    }

    /// Starts a scan once the camera is free.
    pub async fn scan<S, L>(&self, source: S, locator: L) -> ScanResult<ScanHandle>
    where
        S: FrameSource,
        L: Locator,
    {
        let permit = Arc::clone(&self.slot)
            .acquire_owned()
            .await
            .map_err(|e| ScanError::Internal(format!("camera slot closed: {}", e)))?;

        let handle = spawn_with_permit(
            source,
            locator,
            &self.config,
            Arc::clone(&self.emitter),
            Some(permit),
        );
        info!(session_id = %handle.session_id(), "Scan session acquired camera");

        *self.current.lock().await = Some(handle.control().downgrade());
        Ok(handle)
    }

    /// Cancels the running session, if any, then starts a new one.
    pub async fn scan_preempting<S, L>(&self, source: S, locator: L) -> ScanResult<ScanHandle>
    where
        S: FrameSource,
        L: Locator,
    {
        let previous = self.current.lock().await.take();
        if let Some(control) = previous.and_then(|weak| weak.upgrade()) {
            debug!("Preempting running scan session");
            control.cancel();
        }
        self.scan(source, locator).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session::ScanOutcome;
    use crate::testing::{sample_record, valid_payload, Probe, ScriptedSource, Step, TextLocator};

    const LIMIT: Duration = Duration::from_secs(5);

    fn scanner() -> Scanner {
        let mut config = ScanConfig::default();
        config.scan.interval_ms = 10;
        Scanner::new(config)
    }

    #[tokio::test]
    async fn test_second_scan_waits_for_camera() {
        let scanner = scanner();
        let probe = Arc::new(Probe::default());

        let first = scanner
            .scan(ScriptedSource::sharing(vec![Step::Blank], &probe), TextLocator)
            .await
            .unwrap();
        assert!(!scanner.is_idle());

        let waiting = tokio::time::timeout(
            Duration::from_millis(50),
            scanner.scan(ScriptedSource::sharing(vec![Step::Blank], &probe), TextLocator),
        )
        .await;
        assert!(waiting.is_err(), "second scan must wait for the camera");

        first.cancel();
        let resolution = tokio::time::timeout(LIMIT, first.outcome()).await.unwrap().unwrap();
        assert_eq!(resolution.outcome, ScanOutcome::Cancelled);

        let second = tokio::time::timeout(
            LIMIT,
            scanner.scan(
                ScriptedSource::sharing(vec![Step::code(&valid_payload())], &probe),
                TextLocator,
            ),
        )
        .await
        .unwrap()
        .unwrap();
        let resolution = tokio::time::timeout(LIMIT, second.outcome()).await.unwrap().unwrap();
        assert_eq!(resolution.outcome, ScanOutcome::Succeeded(sample_record()));

        assert_eq!(probe.peak(), 1);
        assert_eq!(probe.opens(), 2);
    }

    #[tokio::test]
    async fn test_preempting_cancels_previous_session() {
        let scanner = scanner();
        let probe = Arc::new(Probe::default());

        let first = scanner
            .scan(ScriptedSource::sharing(vec![Step::Blank], &probe), TextLocator)
            .await
            .unwrap();
        let first_outcome = tokio::spawn(first.outcome());

        let second = tokio::time::timeout(
            LIMIT,
            scanner.scan_preempting(
                ScriptedSource::sharing(vec![Step::code(&valid_payload())], &probe),
                TextLocator,
            ),
        )
        .await
        .unwrap()
        .unwrap();

        let first = first_outcome.await.unwrap().unwrap();
        assert_eq!(first.outcome, ScanOutcome::Cancelled);

        let second = tokio::time::timeout(LIMIT, second.outcome()).await.unwrap().unwrap();
        assert_eq!(second.outcome, ScanOutcome::Succeeded(sample_record()));
        assert_eq!(probe.peak(), 1);
    }

    #[tokio::test]
    async fn test_idle_after_resolution() {
        let scanner = scanner();
        let (source, _probe) = ScriptedSource::new(vec![Step::code(&valid_payload())]);

        let handle = scanner.scan(source, TextLocator).await.unwrap();
        tokio::time::timeout(LIMIT, handle.outcome()).await.unwrap().unwrap();

        tokio::time::timeout(LIMIT, async {
            while !scanner.is_idle() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("camera slot released");
    }
}
