use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma};
use qrcode::{Color, QrCode};

use crate::error::{GalleryError, Result};

/// Output edge length in pixels.
pub const QR_SIZE: u32 = 200;
/// Quiet zone, in modules, on every side.
pub const QR_MARGIN: u32 = 2;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

pub fn artwork_url(public_base_url: &str, artwork_id: i64) -> String {
    format!("{}/artwork/{artwork_id}", public_base_url.trim_end_matches('/'))
}

/// Encodes `target` as a black-on-white PNG QR code and returns it as a
/// `data:image/png;base64,...` URL.
pub fn qr_data_url(target: &str) -> Result<String> {
    let png = render_png(target)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

pub fn render_png(target: &str) -> Result<Vec<u8>> {
    let code = QrCode::new(target.as_bytes())
        .map_err(|e| GalleryError::Media(format!("QR encoding failed: {e}")))?;
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = modules + 2 * QR_MARGIN;

    // One pixel per module first; scaling with nearest-neighbour keeps edges crisp.
    let grid = ImageBuffer::from_fn(side, side, |x, y| {
        let inside = (QR_MARGIN..QR_MARGIN + modules).contains(&x)
            && (QR_MARGIN..QR_MARGIN + modules).contains(&y);
        if !inside {
            return LIGHT;
        }
        let idx = ((y - QR_MARGIN) * modules + (x - QR_MARGIN)) as usize;
        match colors[idx] {
            Color::Dark => DARK,
            Color::Light => LIGHT,
        }
    });
    let scaled = image::imageops::resize(&grid, QR_SIZE, QR_SIZE, FilterType::Nearest);

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(scaled).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}
