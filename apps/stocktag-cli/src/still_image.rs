//! Still images as a camera.
//!
//! Each image file is one frame, served in order. Once every image has been
//! read the device reports itself lost, which ends the session.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use stocktag_scan::{CameraDevice, DeviceError, Frame, FrameSource, PixelFormat};
use tracing::debug;

pub struct StillImageSource {
    paths: Vec<PathBuf>,
}

impl StillImageSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        StillImageSource { paths }
    }
}

impl FrameSource for StillImageSource {
    type Device = StillImageDevice;

    /// Loads every image up front; a missing or unreadable file makes the
    /// whole "camera" unavailable.
    fn open(&mut self) -> Result<StillImageDevice, DeviceError> {
        if self.paths.is_empty() {
            return Err(DeviceError::Unavailable("no images given".into()));
        }

        let frames = self
            .paths
            .iter()
            .map(|path| load_frame(path))
            .collect::<Result<VecDeque<_>, _>>()?;

        Ok(StillImageDevice { frames })
    }
}

pub struct StillImageDevice {
    frames: VecDeque<Frame>,
}

impl CameraDevice for StillImageDevice {
    fn current_frame(&mut self) -> Result<Option<Frame>, DeviceError> {
        self.frames
            .pop_front()
            .map(Some)
            .ok_or_else(|| DeviceError::Lost("all images read".into()))
    }

    fn close(self) {
        debug!(unread = self.frames.len(), "Still image device closed");
    }
}

fn load_frame(path: &Path) -> Result<Frame, DeviceError> {
    let luma = image::open(path)
        .map_err(|e| DeviceError::Unavailable(format!("{}: {}", path.display(), e)))?
        .to_luma8();

    let (width, height) = luma.dimensions();
    Frame::new(width, height, PixelFormat::Luma8, luma.into_raw())
        .map_err(|e| DeviceError::Unavailable(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_frames_served_in_order_then_lost() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.png");
        let second = dir.path().join("b.png");
        GrayImage::from_pixel(4, 3, Luma([10])).save(&first).unwrap();
        GrayImage::from_pixel(2, 2, Luma([200])).save(&second).unwrap();

        let mut source = StillImageSource::new(vec![first, second]);
        let mut device = source.open().unwrap();

        let frame = device.current_frame().unwrap().unwrap();
        assert_eq!((frame.width, frame.height), (4, 3));
        assert_eq!(frame.format, PixelFormat::Luma8);
        assert!(frame.data.iter().all(|&p| p == 10));

        let frame = device.current_frame().unwrap().unwrap();
        assert_eq!((frame.width, frame.height), (2, 2));

        assert!(matches!(device.current_frame(), Err(DeviceError::Lost(_))));
        device.close();
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let mut source = StillImageSource::new(vec![PathBuf::from("/nonexistent/label.png")]);
        assert!(matches!(source.open(), Err(DeviceError::Unavailable(_))));
    }

    #[test]
    fn test_no_images_is_unavailable() {
        let mut source = StillImageSource::new(Vec::new());
        assert!(matches!(source.open(), Err(DeviceError::Unavailable(_))));
    }
}
