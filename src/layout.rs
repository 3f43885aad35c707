//! Grid geometry for one contact sheet page.
//!
//! Everything here is pure arithmetic over [`LayoutParams`] and the number of
//! images on the page; nothing touches pixels.

use image::Rgb;
use std::path::Path;
use thiserror::Error;

/// Space around every thumbnail, on each side
pub const PADDING: u32 = 10;
/// Vertical band under each thumbnail reserved for its caption
pub const CAPTION_BAND_HEIGHT: u32 = 40;
/// Extra band at the bottom of multi-page sheets for the page label
pub const FOOTER_HEIGHT: u32 = 40;
/// Caption baseline distance below the thumbnail's bottom edge
pub const CAPTION_BASELINE_OFFSET: u32 = 25;
/// Page label baseline distance above the canvas bottom edge
pub const FOOTER_BASELINE_OFFSET: u32 = 15;
pub const FRAME_OUTSET: u32 = 1;
/// Margin between caption text and its background box
pub const CAPTION_BOX_MARGIN: u32 = 5;

const MAX_CAPTION_CHARS: usize = 25;
const TRUNCATED_CAPTION_CHARS: usize = 22;
const ELLIPSIS: &str = "...";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LayoutError {
    #[error("{0} must be at least 1")]
    ZeroValue(&'static str),
    #[error("Sheet {0} of {1} pixels exceeds the supported maximum")]
    TooLarge(&'static str, u64),
}

/// Sheet configuration, fixed for a whole run
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    pub thumbnails_per_row: u32,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub max_thumbnails_per_page: usize,
    pub background: Rgb<u8>,
    pub padding: u32,
    pub caption_band_height: u32,
}

impl LayoutParams {
    pub fn new(
        thumbnails_per_row: u32,
        thumbnail_width: u32,
        thumbnail_height: u32,
        max_thumbnails_per_page: usize,
        background: Rgb<u8>,
    ) -> Result<Self, LayoutError> {
        if thumbnails_per_row == 0 {
            return Err(LayoutError::ZeroValue("thumbnails per row"));
        }
        if thumbnail_width == 0 {
            return Err(LayoutError::ZeroValue("thumbnail width"));
        }
        if thumbnail_height == 0 {
            return Err(LayoutError::ZeroValue("thumbnail height"));
        }
        if max_thumbnails_per_page == 0 {
            return Err(LayoutError::ZeroValue("max thumbnails per page"));
        }

        let params = Self {
            thumbnails_per_row,
            thumbnail_width,
            thumbnail_height,
            max_thumbnails_per_page,
            background,
            padding: PADDING,
            caption_band_height: CAPTION_BAND_HEIGHT,
        };
        params.check_largest_canvas()?;
        Ok(params)
    }

    /// Rejects settings whose fullest page would not fit `u32` canvas sizes
    fn check_largest_canvas(&self) -> Result<(), LayoutError> {
        let per_row = u64::from(self.thumbnails_per_row);
        let max_images = u64::try_from(self.max_thumbnails_per_page).unwrap_or(u64::MAX);
        let cols = max_images.min(per_row);
        let rows = max_images.div_ceil(per_row);

        let stride_x = u64::from(self.thumbnail_width) + 2 * u64::from(self.padding);
        let stride_y = u64::from(self.thumbnail_height)
            + u64::from(self.caption_band_height)
            + 2 * u64::from(self.padding);

        let width = cols.saturating_mul(stride_x);
        if width > u64::from(u32::MAX) {
            return Err(LayoutError::TooLarge("width", width));
        }
        let height = rows
            .saturating_mul(stride_y)
            .saturating_add(u64::from(FOOTER_HEIGHT));
        if height > u64::from(u32::MAX) {
            return Err(LayoutError::TooLarge("height", height));
        }
        Ok(())
    }

    /// Horizontal distance between neighbouring cells
    pub fn cell_stride_x(&self) -> u32 {
        self.thumbnail_width
            .saturating_add(self.padding.saturating_mul(2))
    }

    /// Vertical distance between neighbouring rows
    pub fn cell_stride_y(&self) -> u32 {
        self.thumbnail_height
            .saturating_add(self.caption_band_height)
            .saturating_add(self.padding.saturating_mul(2))
    }
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            thumbnails_per_row: 10,
            thumbnail_width: 150,
            thumbnail_height: 150,
            max_thumbnails_per_page: 200,
            background: Rgb([255, 255, 255]),
            padding: PADDING,
            caption_band_height: CAPTION_BAND_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }
}

/// Measured size of a rendered string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextExtent {
    pub width: u32,
    pub height: u32,
}

/// Placement of one thumbnail slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellGeometry {
    pub index: usize,
    pub row: u32,
    pub col: u32,
    /// Top-left corner of the thumbnail box
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Caption anchor: horizontal centre and text baseline
    pub caption_x: u32,
    pub caption_y: u32,
}

impl CellGeometry {
    /// Frame around the thumbnail box, one unit outside it on every side
    pub fn frame(&self) -> Rect {
        Rect {
            x: self.x as i64 - FRAME_OUTSET as i64,
            y: self.y as i64 - FRAME_OUTSET as i64,
            width: self.width.saturating_add(2 * FRAME_OUTSET),
            height: self.height.saturating_add(2 * FRAME_OUTSET),
        }
    }

    pub fn caption_anchor(&self) -> Point {
        Point {
            x: self.caption_x as i64,
            y: self.caption_y as i64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridGeometry {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub rows: u32,
    pub cols: u32,
    pub cells: Vec<CellGeometry>,
    /// Page label anchor (centre, baseline) when the sheet has a footer
    pub footer: Option<Point>,
}

/// Computes canvas size and per-cell placement for a page of `image_count` images.
///
/// Cells fill row-major, left to right then top to bottom.
pub fn compute_geometry(
    image_count: usize,
    params: &LayoutParams,
    is_multi_page: bool,
) -> GridGeometry {
    let per_row = params.thumbnails_per_row.max(1);
    let count = u32::try_from(image_count).unwrap_or(u32::MAX);

    let cols = count.min(per_row);
    let rows = count.div_ceil(per_row);

    // Saturates for params built by hand; `LayoutParams::new` keeps real pages in range
    let canvas_width = cols.saturating_mul(params.cell_stride_x());
    let mut canvas_height = rows.saturating_mul(params.cell_stride_y());
    if is_multi_page {
        canvas_height = canvas_height.saturating_add(FOOTER_HEIGHT);
    }

    let cells = (0..count)
        .map(|i| {
            let row = i / per_row;
            let col = i % per_row;
            let x = col.saturating_mul(params.cell_stride_x()).saturating_add(params.padding);
            let y = row.saturating_mul(params.cell_stride_y()).saturating_add(params.padding);

            CellGeometry {
                index: i as usize,
                row,
                col,
                x,
                y,
                width: params.thumbnail_width,
                height: params.thumbnail_height,
                caption_x: x.saturating_add(params.thumbnail_width / 2),
                caption_y: y
                    .saturating_add(params.thumbnail_height)
                    .saturating_add(CAPTION_BASELINE_OFFSET),
            }
        })
        .collect();

    let footer = is_multi_page.then(|| Point {
        x: (canvas_width / 2) as i64,
        y: canvas_height as i64 - FOOTER_BASELINE_OFFSET as i64,
    });

    GridGeometry {
        canvas_width,
        canvas_height,
        rows,
        cols,
        cells,
        footer,
    }
}

/// Background box behind a caption whose baseline-centre is `anchor`
pub fn caption_box(anchor: Point, text: TextExtent) -> Rect {
    let margin = CAPTION_BOX_MARGIN as i64;
    let half_width = (text.width / 2) as i64;
    let left = anchor.x - half_width - margin;
    let top = anchor.y - text.height as i64 - margin;
    let right = anchor.x + half_width + margin;
    let bottom = anchor.y + margin;

    Rect {
        x: left,
        y: top,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    }
}

/// Shortens names longer than 25 characters to 22 characters plus `...`
pub fn truncate_caption(name: &str) -> String {
    if name.chars().count() > MAX_CAPTION_CHARS {
        let mut short: String = name.chars().take(TRUNCATED_CAPTION_CHARS).collect();
        short.push_str(ELLIPSIS);
        short
    } else {
        name.to_string()
    }
}

/// Caption for an image: its file name, truncated
pub fn caption_for(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    truncate_caption(&name)
}

/// Footer text for multi-page sheets
pub fn page_label(page_number: usize, total_pages: usize) -> String {
    format!("Page {} of {}", page_number, total_pages)
}
