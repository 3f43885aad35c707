use log::{debug, error, info, warn};
use std::path::Path;

use crate::index_generator::RunSummary;
use crate::month_key::MonthKey;
use crate::sheet_renderer::RenderError;

/// Receives run events from the scanner, page renderer and orchestrator.
///
/// Passed explicitly to every component instead of logging from a global,
/// so tests can observe skips and failures directly.
pub trait Reporter: Sync {
    fn scan_started(&self, _root: &Path) {}

    fn directory_skipped(&self, _dir: &Path, _reason: &std::io::Error) {}

    fn month_started(&self, _month: &MonthKey, _image_count: usize, _total_pages: usize) {}

    /// `index` is 1-based within the whole month
    fn image_started(&self, _index: usize, _total: usize, _path: &Path) {}

    fn cell_skipped(&self, _month: &MonthKey, _page: usize, _path: &Path, _reason: &RenderError) {}

    fn page_saved(&self, _month: &MonthKey, _page: usize, _output: &Path) {}

    fn page_failed(&self, _month: &MonthKey, _page: usize, _output: &Path, _reason: &RenderError) {}

    fn run_finished(&self, _summary: &RunSummary) {}
}

/// Default reporter writing through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn scan_started(&self, root: &Path) {
        info!("Scanning directory: {}", root.display());
    }

    fn directory_skipped(&self, dir: &Path, reason: &std::io::Error) {
        debug!("Skipping unreadable directory {}: {}", dir.display(), reason);
    }

    fn month_started(&self, month: &MonthKey, image_count: usize, total_pages: usize) {
        info!(
            "Processing month: {} ({} images, {} page(s))",
            month, image_count, total_pages
        );
    }

    fn image_started(&self, index: usize, total: usize, path: &Path) {
        info!("Processing image {} of {}: {}", index, total, path.display());
    }

    fn cell_skipped(&self, month: &MonthKey, page: usize, path: &Path, reason: &RenderError) {
        error!(
            "Error processing image {} (month {}, page {}): {}",
            path.display(),
            month,
            page,
            reason
        );
    }

    fn page_saved(&self, _month: &MonthKey, _page: usize, output: &Path) {
        info!("Saved index thumbnail: {}", output.display());
    }

    fn page_failed(&self, month: &MonthKey, page: usize, output: &Path, reason: &RenderError) {
        error!(
            "Error creating index thumbnail for {}: {}",
            output.display(),
            reason
        );
        error!(
            "Failed to create index thumbnail for month: {} (page {})",
            month, page
        );
    }

    fn run_finished(&self, summary: &RunSummary) {
        info!(
            "Index generation complete: {} month(s), {} page(s) written, {} page(s) failed, {} image(s) skipped",
            summary.months_processed,
            summary.pages_written,
            summary.pages_failed,
            summary.cells_skipped
        );
        if summary.pages_failed > 0 || summary.cells_skipped > 0 {
            warn!("Some index pages or images could not be rendered, see errors above");
        }
    }
}
