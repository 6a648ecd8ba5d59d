//! Rasterizes the planner grid mockup into a single JPEG.
//!
//! Layout is expressed in CSS pixels and multiplied by `pixel_ratio` so the
//! export is crisper than the on-screen grid. The canvas is filled with an
//! opaque background first; slot images are cover-cropped into square cells
//! and blended over it, so no transparency survives into the JPEG.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::CoreError;
use crate::planner::{GRID_COLUMNS, SLOT_COUNT};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Download name of the grid export.
pub const GRID_EXPORT_FILE_NAME: &str = "kana-grid-planner.jpeg";

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Fixed JPEG quality of the export.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Fixed density multiplier over CSS pixels.
pub const DEFAULT_PIXEL_RATIO: u32 = 2;

/// Cell edge in CSS pixels.
pub const DEFAULT_CELL_SIZE: u32 = 148;

/// Gap between cells in CSS pixels.
pub const DEFAULT_GAP: u32 = 2;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Placeholder fill for empty slots.
const EMPTY_SLOT: Rgba<u8> = Rgba([244, 244, 245, 255]);

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRenderOptions {
    pub cell_size: u32,
    pub gap: u32,
    pub pixel_ratio: u32,
    pub quality: u8,
    pub background: Rgba<u8>,
}

impl Default for GridRenderOptions {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            gap: DEFAULT_GAP,
            pixel_ratio: DEFAULT_PIXEL_RATIO,
            quality: DEFAULT_JPEG_QUALITY,
            background: WHITE,
        }
    }
}

impl GridRenderOptions {
    fn rows(&self) -> u32 {
        SLOT_COUNT.div_ceil(GRID_COLUMNS) as u32
    }

    /// Output size in device pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        let cell = self.cell_size * self.pixel_ratio;
        let gap = self.gap * self.pixel_ratio;
        let cols = GRID_COLUMNS as u32;
        let rows = self.rows();
        (cols * cell + (cols - 1) * gap, rows * cell + (rows - 1) * gap)
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the grid. `cells` holds the encoded image of each slot in grid
/// order, `None` for empty slots.
pub fn rasterize_grid(
    cells: &[Option<Vec<u8>>],
    options: &GridRenderOptions,
) -> Result<Vec<u8>, CoreError> {
    if cells.len() != SLOT_COUNT {
        return Err(CoreError::Validation(format!(
            "Grid render expects {SLOT_COUNT} cells, got {}",
            cells.len()
        )));
    }
    if options.pixel_ratio == 0 || options.cell_size == 0 {
        return Err(CoreError::Validation(
            "Cell size and pixel ratio must be positive".into(),
        ));
    }

    let (width, height) = options.canvas_size();
    let mut canvas = RgbaImage::from_pixel(width, height, options.background);

    let cell = options.cell_size * options.pixel_ratio;
    let stride = cell + options.gap * options.pixel_ratio;

    for (index, encoded) in cells.iter().enumerate() {
        let x = (index % GRID_COLUMNS) as u32 * stride;
        let y = (index / GRID_COLUMNS) as u32 * stride;

        let tile = match encoded {
            Some(bytes) => image::load_from_memory(bytes)
                .map_err(|e| CoreError::Decode(format!("slot {index}: {e}")))?
                .resize_to_fill(cell, cell, FilterType::Lanczos3)
                .to_rgba8(),
            None => RgbaImage::from_pixel(cell, cell, EMPTY_SLOT),
        };
        imageops::overlay(&mut canvas, &tile, i64::from(x), i64::from(y));
    }

    encode_jpeg(&DynamicImage::ImageRgba8(canvas), options.quality)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CoreError> {
    let rgb = img.to_rgb8();
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&rgb)
        .map_err(|e| CoreError::Encode(format!("jpeg encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    fn png(color: [u8; 4]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        RgbaImage::from_pixel(20, 10, Rgba(color))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn small() -> GridRenderOptions {
        GridRenderOptions {
            cell_size: 10,
            gap: 1,
            ..Default::default()
        }
    }

    #[test]
    fn canvas_size_scales_with_pixel_ratio() {
        let opts = small();
        // 3 cols * 20px + 2 gaps * 2px; 4 rows * 20px + 3 gaps * 2px
        assert_eq!(opts.canvas_size(), (64, 86));
    }

    #[test]
    fn default_gap_is_two_css_pixels() {
        let opts = GridRenderOptions::default();
        assert_eq!(opts.gap, 2);
        // 3 * 296 + 2 * 4; 4 * 296 + 3 * 4
        assert_eq!(opts.canvas_size(), (896, 1196));
    }

    #[test]
    fn output_is_jpeg_with_expected_size() {
        let mut cells = vec![None; SLOT_COUNT];
        cells[0] = Some(png([255, 0, 0, 255]));
        let out = rasterize_grid(&cells, &small()).unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 86));
    }

    #[test]
    fn transparent_images_render_on_white() {
        let mut cells = vec![None; SLOT_COUNT];
        cells[4] = Some(png([0, 0, 0, 0]));
        let out = rasterize_grid(&cells, &small()).unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgb8();

        // Centre of slot 4 (row 1, col 1).
        let px = decoded.get_pixel(32, 32);
        assert!(px.0.iter().all(|&c| c > 240), "expected white, got {px:?}");
    }

    #[test]
    fn wrong_cell_count_is_rejected() {
        assert!(rasterize_grid(&[None, None], &small()).is_err());
    }

    #[test]
    fn undecodable_slot_is_a_decode_error() {
        let mut cells = vec![None; SLOT_COUNT];
        cells[2] = Some(b"nope".to_vec());
        assert!(matches!(
            rasterize_grid(&cells, &small()),
            Err(CoreError::Decode(_))
        ));
    }
}
