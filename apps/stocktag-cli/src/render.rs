//! # Label Rendering
//!
//! [`CodeImageProducer`] backed by the `qrcode` crate. Modules are drawn
//! straight into an `image::GrayImage` so the CLI can save a PNG.
//!
//! ```text
//!   Payload ──► Symbology::check ──► QrCode ──► GrayImage (scale × modules)
//! ```

use image::{GrayImage, Luma};
use qrcode::{Color, QrCode};
use stocktag_core::{CodeImageProducer, EcLevel, Payload, Symbology};
use thiserror::Error;

/// Modules of white border around the symbol.
const QUIET_ZONE: u32 = 4;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("QR encoding failed: {0}")]
    Encode(String),

    #[error("Scale must be at least 1 pixel per module")]
    ZeroScale,
}

/// Renders QR labels, `scale` pixels per module.
#[derive(Debug, Clone, Copy)]
pub struct QrImageProducer {
    scale: u32,
}

impl QrImageProducer {
    pub fn new(scale: u32) -> Self {
        QrImageProducer { scale }
    }
}

impl Default for QrImageProducer {
    fn default() -> Self {
        Self::new(8)
    }
}

impl CodeImageProducer for QrImageProducer {
    type Image = GrayImage;
    type Error = RenderError;

    fn produce(&self, payload: &Payload, symbology: Symbology) -> Result<GrayImage, RenderError> {
        if self.scale == 0 {
            return Err(RenderError::ZeroScale);
        }

        let Symbology::Qr(level) = symbology;
        let code = QrCode::with_error_correction_level(payload.as_str().as_bytes(), qr_level(level))
            .map_err(|e| RenderError::Encode(e.to_string()))?;

        let modules = code.width() as u32;
        let colors = code.to_colors();
        let side = (modules + 2 * QUIET_ZONE) * self.scale;

        let image = GrayImage::from_fn(side, side, |x, y| {
            let (mx, my) = (x / self.scale, y / self.scale);
            let inside = (QUIET_ZONE..QUIET_ZONE + modules).contains(&mx)
                && (QUIET_ZONE..QUIET_ZONE + modules).contains(&my);
            if inside {
                let index = ((my - QUIET_ZONE) * modules + (mx - QUIET_ZONE)) as usize;
                if colors[index] == Color::Dark {
                    return Luma([0]);
                }
            }
            Luma([255])
        });

        Ok(image)
    }
}

fn qr_level(level: EcLevel) -> qrcode::EcLevel {
    match level {
        EcLevel::L => qrcode::EcLevel::L,
        EcLevel::M => qrcode::EcLevel::M,
        EcLevel::Q => qrcode::EcLevel::Q,
        EcLevel::H => qrcode::EcLevel::H,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stocktag_core::{PayloadCodec, ProductRecord};

    fn payload() -> Payload {
        PayloadCodec::encode(&ProductRecord::new("m16x50", "M16X50 Akb Civata", "M16X50AKB")).unwrap()
    }

    #[test]
    fn test_image_has_quiet_zone_and_dark_modules() {
        let image = QrImageProducer::new(2).produce(&payload(), Symbology::default()).unwrap();

        assert_eq!(image.width(), image.height());
        assert_eq!(image.width() % 2, 0);
        assert_eq!(image.get_pixel(0, 0), &Luma([255]));
        // Top-left finder pattern starts right after the quiet zone.
        assert_eq!(image.get_pixel(QUIET_ZONE * 2, QUIET_ZONE * 2), &Luma([0]));
    }

    #[test]
    fn test_higher_ec_level_is_not_smaller() {
        let producer = QrImageProducer::new(1);
        let low = producer.produce(&payload(), Symbology::Qr(EcLevel::L)).unwrap();
        let high = producer.produce(&payload(), Symbology::Qr(EcLevel::H)).unwrap();
        assert!(high.width() >= low.width());
    }

    #[test]
    fn test_zero_scale_rejected() {
        let result = QrImageProducer::new(0).produce(&payload(), Symbology::default());
        assert!(matches!(result, Err(RenderError::ZeroScale)));
    }
}
