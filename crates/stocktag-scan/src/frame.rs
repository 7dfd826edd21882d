//! # Frames and Frame Sources
//!
//! The camera seam. A [`FrameSource`] opens a [`CameraDevice`]; the device
//! hands out the most recent [`Frame`] on demand.
//!
//! ## Device Lifecycle
//! ```text
//!   FrameSource::open() ──► CameraDevice ──► current_frame() ... ──► close()
//!          │                                      │
//!          ▼                                      ▼
//!   DeviceError::Unavailable            Ok(None)  = no frame ready yet
//!                                       Err(Lost) = device gone
//! ```
//!
//! A device is owned by exactly one `ScanSession` and is closed on every
//! exit path.

use thiserror::Error;

use crate::error::DeviceError;

// =============================================================================
// Pixel Format
// =============================================================================

/// Layout of a frame's pixel buffer. Rows are tightly packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit grayscale, one byte per pixel.
    Luma8,
    /// 8-bit RGB, three bytes per pixel.
    Rgb8,
    /// 8-bit RGBA, four bytes per pixel. Alpha is ignored.
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub const fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Luma8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

// =============================================================================
// Frame
// =============================================================================

/// A frame whose buffer does not match its dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{width}x{height} {format:?} frame needs {expected} bytes, got {actual}")]
pub struct FrameSizeError {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub expected: usize,
    pub actual: usize,
}

/// One captured image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

/// Luma weights, Y = (76 R + 150 G + 29 B) >> 8.
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

impl Frame {
    /// Creates a frame, checking the buffer length.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, FrameSizeError> {
        let frame = Frame {
            width,
            height,
            format,
            data,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Checks that the buffer holds exactly `width * height` pixels.
    pub fn validate(&self) -> Result<(), FrameSizeError> {
        let expected = self.pixel_count() * self.format.bytes_per_pixel();
        if self.data.len() == expected {
            Ok(())
        } else {
            Err(FrameSizeError {
                width: self.width,
                height: self.height,
                format: self.format,
                expected,
                actual: self.data.len(),
            })
        }
    }

    /// Returns the frame as 8-bit grayscale, one byte per pixel.
    ///
    /// ## Example
    /// ```rust
    /// use stocktag_scan::frame::{Frame, PixelFormat};
    ///
    /// let frame = Frame::new(2, 1, PixelFormat::Rgb8, vec![255, 255, 255, 0, 0, 0]).unwrap();
    /// assert_eq!(frame.luma(), vec![254, 0]);
    /// ```
    pub fn luma(&self) -> Vec<u8> {
        match self.format {
            PixelFormat::Luma8 => self.data.clone(),
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => self
                .data
                .chunks_exact(self.format.bytes_per_pixel())
                .map(|px| {
                    let y = COEF_R * px[0] as u32 + COEF_G * px[1] as u32 + COEF_B * px[2] as u32;
                    // Weights sum to 255, so the shifted sum fits in a byte.
                    (y >> 8) as u8
                })
                .collect(),
        }
    }
}

// =============================================================================
// Camera Traits
// =============================================================================

/// Something that can open a camera.
///
/// Implemented by the platform camera integration; the scan crate ships no
/// real camera backend.
pub trait FrameSource: Send + 'static {
    /// The opened device.
    type Device: CameraDevice;

    /// Opens the camera. Called once per session.
    fn open(&mut self) -> Result<Self::Device, DeviceError>;
}

/// An opened camera, exclusively owned by one session.
pub trait CameraDevice: Send + 'static {
    /// Returns the most recent frame without waiting for a new one.
    ///
    /// `Ok(None)` means no frame is ready yet and is not an error.
    fn current_frame(&mut self) -> Result<Option<Frame>, DeviceError>;

    /// Releases the camera.
    fn close(self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_checks_buffer_length() {
        assert!(Frame::new(2, 2, PixelFormat::Luma8, vec![0; 4]).is_ok());
        assert!(Frame::new(2, 2, PixelFormat::Rgba8, vec![0; 16]).is_ok());

        let err = Frame::new(2, 2, PixelFormat::Rgb8, vec![0; 4]).unwrap_err();
        assert_eq!(err.expected, 12);
        assert_eq!(err.actual, 4);
    }

    #[test]
    fn test_luma_conversion() {
        let frame = Frame::new(
            3,
            1,
            PixelFormat::Rgba8,
            vec![255, 0, 0, 9, 0, 255, 0, 9, 0, 0, 255, 9],
        )
        .unwrap();
        assert_eq!(frame.luma(), vec![75, 149, 28]);

        let gray = Frame::new(2, 1, PixelFormat::Luma8, vec![7, 8]).unwrap();
        assert_eq!(gray.luma(), vec![7, 8]);
    }
}
