use image::{Rgb, Rgba};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::layout::{
    caption_box, caption_for, compute_geometry, page_label, CellGeometry, LayoutParams, Point,
    Rect, TextExtent,
};
use crate::month_key::MonthKey;
use crate::pagination::Page;
use crate::raw_processor::RawError;
use crate::reporter::Reporter;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to load image {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },
    #[error("Failed to decode RAW image: {0}")]
    Raw(#[from] RawError),
    #[error("Failed to composite image: {0}")]
    Composite(String),
    #[error("Failed to save {}: {reason}", path.display())]
    Save { path: PathBuf, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stroke and fill for a rectangle. Fill alpha is the fill opacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectStyle {
    pub stroke: Option<Rgba<u8>>,
    pub fill: Option<Rgba<u8>>,
}

impl RectStyle {
    /// Black 1-unit outline, no fill
    pub const FRAME: RectStyle = RectStyle {
        stroke: Some(Rgba([0, 0, 0, 255])),
        fill: None,
    };

    /// White at 0.7 opacity, no outline
    pub const CAPTION_BACKGROUND: RectStyle = RectStyle {
        stroke: None,
        fill: Some(Rgba([255, 255, 255, 178])),
    };
}

/// Drawing primitives the page renderer needs from a graphics engine.
///
/// Canvas and thumbnail values own their pixel buffers, so dropping them on
/// any exit path releases the memory.
pub trait RenderBackend: Sync {
    type Canvas;
    type Thumbnail;

    fn new_canvas(&self, width: u32, height: u32, background: Rgb<u8>) -> Self::Canvas;

    /// Decodes `path` and scales it to fit within `max_width` x `max_height`,
    /// preserving the aspect ratio
    fn load_thumbnail(
        &self,
        path: &Path,
        max_width: u32,
        max_height: u32,
    ) -> Result<Self::Thumbnail, RenderError>;

    /// Places `thumbnail` with its top-left corner at (`x`, `y`)
    fn composite(
        &self,
        canvas: &mut Self::Canvas,
        thumbnail: &Self::Thumbnail,
        x: i64,
        y: i64,
    ) -> Result<(), RenderError>;

    fn draw_rect(&self, canvas: &mut Self::Canvas, rect: Rect, style: RectStyle);

    fn measure_text(&self, text: &str) -> TextExtent;

    /// Draws `text` horizontally centred on `anchor.x` with its baseline at `anchor.y`
    fn draw_text(&self, canvas: &mut Self::Canvas, anchor: Point, text: &str);

    fn save(&self, canvas: &Self::Canvas, path: &Path) -> Result<(), RenderError>;
}

/// What happened to one grid cell
#[derive(Debug)]
pub enum CellOutcome {
    Rendered,
    /// The image could not be loaded or placed; the cell keeps only its frame
    Skipped(RenderError),
}

impl CellOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, CellOutcome::Rendered)
    }
}

/// Result of a saved page
#[derive(Debug)]
pub struct PageReport {
    pub output: PathBuf,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub outcomes: Vec<CellOutcome>,
}

impl PageReport {
    pub fn rendered_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_rendered()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.rendered_count()
    }
}

/// Renders one page of a month into `output`.
///
/// A failing image only blanks its own cell. An error is returned only
/// when the finished sheet cannot be saved.
pub fn render_page<B: RenderBackend + ?Sized>(
    backend: &B,
    params: &LayoutParams,
    month: &MonthKey,
    page: &Page<'_>,
    output: &Path,
    reporter: &dyn Reporter,
) -> Result<PageReport, RenderError> {
    let geometry = compute_geometry(page.images.len(), params, page.is_multi_page());
    let mut canvas = backend.new_canvas(
        geometry.canvas_width,
        geometry.canvas_height,
        params.background,
    );

    let mut outcomes = Vec::with_capacity(page.images.len());
    for (cell, path) in geometry.cells.iter().zip(page.images) {
        reporter.image_started(page.start + cell.index + 1, page.total_images, path);

        let outcome = render_cell(backend, &mut canvas, cell, path);
        if let CellOutcome::Skipped(reason) = &outcome {
            reporter.cell_skipped(month, page.number, path, reason);
        }
        outcomes.push(outcome);
    }

    if let Some(anchor) = geometry.footer {
        backend.draw_text(&mut canvas, anchor, &page_label(page.number, page.total_pages));
    }

    backend.save(&canvas, output)?;

    Ok(PageReport {
        output: output.to_path_buf(),
        canvas_width: geometry.canvas_width,
        canvas_height: geometry.canvas_height,
        outcomes,
    })
}

fn render_cell<B: RenderBackend + ?Sized>(
    backend: &B,
    canvas: &mut B::Canvas,
    cell: &CellGeometry,
    path: &Path,
) -> CellOutcome {
    let placed = backend
        .load_thumbnail(path, cell.width, cell.height)
        .and_then(|thumbnail| backend.composite(canvas, &thumbnail, cell.x as i64, cell.y as i64));

    if let Err(reason) = placed {
        backend.draw_rect(canvas, cell.frame(), RectStyle::FRAME);
        return CellOutcome::Skipped(reason);
    }

    let caption = caption_for(path);
    let anchor = cell.caption_anchor();
    let extent = backend.measure_text(&caption);
    backend.draw_rect(
        canvas,
        caption_box(anchor, extent),
        RectStyle::CAPTION_BACKGROUND,
    );
    backend.draw_text(canvas, anchor, &caption);
    backend.draw_rect(canvas, cell.frame(), RectStyle::FRAME);

    CellOutcome::Rendered
}
