//! QR code decoding through `rqrr`.

use image::GrayImage;
use tracing::debug;

use super::Decoder;
use crate::camera::Frame;

/// Finds and decodes every QR symbol in a frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl QrDecoder {
    /// New decoder.
    pub fn new() -> Self {
        Self
    }

    /// Decode QR symbols in a grayscale image.
    pub fn decode_luma(&self, luma: &GrayImage) -> Vec<String> {
        let (width, height) = luma.dimensions();
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
                luma.get_pixel(x as u32, y as u32)[0]
            });

        prepared
            .detect_grids()
            .into_iter()
            .filter_map(|grid| match grid.decode() {
                Ok((_, content)) => Some(content),
                Err(e) => {
                    debug!("QR grid found but not decodable: {:?}", e);
                    None
                }
            })
            .collect()
    }
}

impl Decoder for QrDecoder {
    fn name(&self) -> &str {
        "qr"
    }

    fn decode(&self, frame: &Frame) -> Vec<String> {
        self.decode_luma(&frame.to_luma8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use qrcode::{Color, QrCode};

    /// Render `text` as a QR symbol with a four-module quiet zone.
    fn render_qr(text: &str, module_px: u32) -> GrayImage {
        let code = QrCode::new(text.as_bytes()).unwrap();
        let modules = code.width() as u32;
        let colors = code.to_colors();
        let size = (modules + 8) * module_px;
        GrayImage::from_fn(size, size, |x, y| {
            let (mx, my) = (x / module_px, y / module_px);
            let inside = (4..modules + 4).contains(&mx) && (4..modules + 4).contains(&my);
            let dark = inside && colors[((my - 4) * modules + (mx - 4)) as usize] == Color::Dark;
            Luma([if dark { 0 } else { 255 }])
        })
    }

    #[test]
    fn test_decodes_qr_frame() {
        let frame = Frame::ImageLuma8(render_qr("0001234567890", 4));
        assert_eq!(QrDecoder::new().decode(&frame), vec!["0001234567890"]);
    }

    #[test]
    fn test_blank_frame_has_no_qr() {
        let frame = Frame::ImageLuma8(GrayImage::from_pixel(120, 120, Luma([255])));
        assert!(QrDecoder::new().decode(&frame).is_empty());
    }

    #[test]
    fn test_code128_frame_is_not_qr() {
        let frame = crate::testing::barcode_frame("4410023");
        assert!(QrDecoder::new().decode(&frame).is_empty());
    }
}
