//! Frame compositor: burns an optional decorative overlay into a result.
//!
//! The canvas always takes the result image's native dimensions. The frame
//! is stretched to the same size and alpha-blended on top, so borders and
//! watermarks with transparency behave as full-bleed overlays.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::CoreError;

/// MIME type of composited output.
pub const COMPOSITE_MIME_TYPE: &str = "image/png";

/// Produce the exportable bytes for a result image.
///
/// Without a frame the result bytes are returned untouched, whatever their
/// format. With a frame both images are decoded and the composite is
/// re-encoded losslessly as PNG. A decode failure is an error, never an
/// empty image.
pub fn compose(result: &[u8], frame: Option<&[u8]>) -> Result<Vec<u8>, CoreError> {
    let Some(frame) = frame else {
        return Ok(result.to_vec());
    };

    let base = decode(result, "result")?;
    let overlay = decode(frame, "frame")?;

    let composite = overlay_frame(base.to_rgba8(), &overlay);
    encode_png(&composite)
}

/// Draw `frame` over `canvas`, scaled to the canvas dimensions.
pub fn overlay_frame(mut canvas: RgbaImage, frame: &DynamicImage) -> RgbaImage {
    let (width, height) = canvas.dimensions();
    let frame = if frame.width() == width && frame.height() == height {
        frame.to_rgba8()
    } else {
        imageops::resize(&frame.to_rgba8(), width, height, FilterType::Triangle)
    };
    imageops::overlay(&mut canvas, &frame, 0, 0);
    canvas
}

fn decode(bytes: &[u8], what: &str) -> Result<DynamicImage, CoreError> {
    image::load_from_memory(bytes).map_err(|e| CoreError::Decode(format!("{what}: {e}")))
}

fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, CoreError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| CoreError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        encode_png(&img).unwrap()
    }

    fn dimensions(bytes: &[u8]) -> (u32, u32) {
        let img = decode(bytes, "image").unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn no_frame_returns_identical_bytes() {
        let source = png(8, 6, [10, 20, 30, 255]);
        assert_eq!(compose(&source, None).unwrap(), source);
    }

    #[test]
    fn no_frame_passes_through_undecodable_bytes() {
        let source = b"not an image but still the result".to_vec();
        assert_eq!(compose(&source, None).unwrap(), source);
    }

    #[test]
    fn output_takes_result_dimensions_not_frame() {
        let result = png(40, 30, [0, 0, 255, 255]);
        let frame = png(7, 11, [255, 0, 0, 128]);
        let out = compose(&result, Some(&frame)).unwrap();
        assert_eq!(dimensions(&out), (40, 30));
    }

    #[test]
    fn transparent_frame_pixels_leave_result_visible() {
        let result = png(4, 4, [0, 200, 0, 255]);
        let mut frame = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        frame.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let frame = encode_png(&frame).unwrap();

        let out = compose(&result, Some(&frame)).unwrap();
        let out = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(out.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(3, 3), &Rgba([0, 200, 0, 255]));
    }

    #[test]
    fn undecodable_frame_is_an_error() {
        let result = png(4, 4, [0, 0, 0, 255]);
        let err = compose(&result, Some(b"garbage")).unwrap_err();
        assert!(matches!(err, CoreError::Decode(_)));
    }

    #[test]
    fn undecodable_result_with_frame_is_an_error() {
        let frame = png(4, 4, [0, 0, 0, 0]);
        assert!(matches!(
            compose(b"garbage", Some(&frame)),
            Err(CoreError::Decode(_))
        ));
    }
}
