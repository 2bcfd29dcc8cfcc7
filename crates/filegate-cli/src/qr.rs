//! QR rendering of artifact references.

use filegate_core::{CodeImage, CodeImageEncoder};
use qrcode::QrCode;
use qrcode::render::{svg, unicode};
use qrcode::types::QrError;

/// Media type of the exported image
pub const SVG_MEDIA_TYPE: &str = "image/svg+xml";

/// Encodes references as terminal QR codes with an SVG export
#[derive(Debug, Clone, Copy)]
pub struct TerminalQrEncoder {
    /// Minimum edge length of the SVG export in pixels
    pub svg_size: u32,
}

impl TerminalQrEncoder {
    /// Create an encoder exporting images of at least `svg_size` pixels
    #[must_use]
    pub fn new(svg_size: u32) -> Self {
        Self { svg_size }
    }
}

impl CodeImageEncoder for TerminalQrEncoder {
    type Error = QrError;

    fn encode(&self, reference: &str) -> Result<CodeImage, QrError> {
        let code = QrCode::new(reference.as_bytes())?;

        let preview = code
            .render::<unicode::Dense1x2>()
            .dark_color(unicode::Dense1x2::Light)
            .light_color(unicode::Dense1x2::Dark)
            .quiet_zone(true)
            .build();

        let export = code
            .render::<svg::Color>()
            .min_dimensions(self.svg_size, self.svg_size)
            .build();

        Ok(CodeImage {
            preview,
            export: export.into_bytes(),
            export_media_type: SVG_MEDIA_TYPE,
        })
    }
}
