//! # Locators
//!
//! A [`Locator`] finds an optical code in a frame and returns the text it
//! carries. It knows nothing about product payloads; the session hands the
//! text to `PayloadCodec`.

use tracing::debug;

use crate::frame::Frame;

/// Finds an optical code in a frame.
///
/// Runs on a blocking worker thread, so implementations may be CPU heavy.
pub trait Locator: Send + Sync + 'static {
    /// Returns the text of the first readable code in `frame`, or `None`.
    fn locate(&self, frame: &Frame) -> Option<String>;
}

// =============================================================================
// QR Locator
// =============================================================================

/// QR code locator backed by `rqrr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrLocator;

impl QrLocator {
    pub fn new() -> Self {
        QrLocator
    }
}

impl Locator for QrLocator {
    fn locate(&self, frame: &Frame) -> Option<String> {
        if let Err(e) = frame.validate() {
            debug!(error = %e, "Skipping malformed frame");
            return None;
        }

        let width = frame.width as usize;
        let height = frame.height as usize;
        let luma = frame.luma();

        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| luma[y * width + x]);

        let grids = prepared.detect_grids();
        if grids.is_empty() {
            return None;
        }

        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => return Some(content),
                // A partially visible or blurred symbol; try the next one.
                Err(e) => debug!(error = ?e, "QR grid found but unreadable"),
            }
        }

        None
    }
}
