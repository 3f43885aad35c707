use log::{debug, info};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::Config;
use crate::file_scanner::{FileScanner, MonthGroups};
use crate::layout::LayoutParams;
use crate::month_key::MonthKey;
use crate::pagination::paginate;
use crate::reporter::Reporter;
use crate::sheet_renderer::{render_page, RenderBackend};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Directory {} does not exist or is not a directory", .0.display())]
    InvalidRoot(PathBuf),
    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Totals for a run, merged from every month
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub months_processed: usize,
    pub pages_written: usize,
    pub pages_failed: usize,
    pub cells_skipped: usize,
    /// Written sheets in month then page order
    pub outputs: Vec<PathBuf>,
}

impl RunSummary {
    fn merge(&mut self, other: RunSummary) {
        self.months_processed += other.months_processed;
        self.pages_written += other.pages_written;
        self.pages_failed += other.pages_failed;
        self.cells_skipped += other.cells_skipped;
        self.outputs.extend(other.outputs);
    }

    pub fn has_failures(&self) -> bool {
        self.pages_failed > 0 || self.cells_skipped > 0
    }
}

/// `index_<key>.jpg` for a single page, `index_<key>_NNN.jpg` otherwise
pub fn index_file_name(month: &MonthKey, page: usize, total_pages: usize) -> String {
    if total_pages > 1 {
        format!("index_{}_{:03}.jpg", month, page)
    } else {
        format!("index_{}.jpg", month)
    }
}

/// Target directory for a month's sheets: the explicit output directory,
/// or `<root>/<YYYY>` taken from the key's first four characters
pub fn output_dir_for(root: &Path, output_dir: Option<&Path>, month: &MonthKey) -> PathBuf {
    match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => root.join(month.year()),
    }
}

/// Renders the sheets of every month through a [`RenderBackend`].
pub struct IndexGenerator<'a, B: RenderBackend + ?Sized> {
    root: &'a Path,
    output_dir: Option<&'a Path>,
    layout: &'a LayoutParams,
    jobs: usize,
    backend: &'a B,
    reporter: &'a dyn Reporter,
}

impl<'a, B: RenderBackend + ?Sized> IndexGenerator<'a, B> {
    pub fn new(config: &'a Config, backend: &'a B, reporter: &'a dyn Reporter) -> Self {
        Self {
            root: &config.root,
            output_dir: config.output_dir.as_deref(),
            layout: &config.layout,
            jobs: config.jobs.max(1),
            backend,
            reporter,
        }
    }

    /// Renders all pages of one month.
    ///
    /// The first page that fails to save abandons the rest of the month;
    /// already written pages stay on disk.
    pub fn process_month(&self, month: &MonthKey, images: &[PathBuf]) -> RunSummary {
        let mut summary = RunSummary::default();

        let Some(pages) = paginate(images, self.layout.max_thumbnails_per_page) else {
            debug!("Skipping month {} without images", month);
            return summary;
        };

        summary.months_processed = 1;
        self.reporter
            .month_started(month, images.len(), pages.total_pages());

        let dir = output_dir_for(self.root, self.output_dir, month);

        for page in pages {
            let output = dir.join(index_file_name(month, page.number, page.total_pages));

            match render_page(
                self.backend,
                self.layout,
                month,
                &page,
                &output,
                self.reporter,
            ) {
                Ok(report) => {
                    summary.pages_written += 1;
                    summary.cells_skipped += report.skipped_count();
                    summary.outputs.push(report.output);
                    self.reporter.page_saved(month, page.number, &output);
                }
                Err(e) => {
                    summary.pages_failed += 1;
                    self.reporter.page_failed(month, page.number, &output, &e);
                    break;
                }
            }

            if !page.has_more_pages {
                break;
            }
        }

        summary
    }

    /// Processes months in ascending key order. With more than one job the
    /// months are rendered concurrently and merged back in key order.
    pub fn run(&self, groups: &MonthGroups) -> Result<RunSummary, IndexError> {
        let per_month: Vec<RunSummary> = if self.jobs <= 1 || groups.len() <= 1 {
            groups
                .iter()
                .map(|(month, images)| self.process_month(month, images))
                .collect()
        } else {
            info!("Rendering months with {} worker threads", self.jobs);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()?;
            let months: Vec<(&MonthKey, &Vec<PathBuf>)> = groups.iter().collect();
            pool.install(|| {
                months
                    .par_iter()
                    .map(|(month, images)| self.process_month(month, images))
                    .collect()
            })
        };

        let mut summary = RunSummary::default();
        for month in per_month {
            summary.merge(month);
        }
        Ok(summary)
    }
}

/// Scans `config.root` and writes index sheets for every month found.
///
/// Fails only when the root is not a directory or the explicit output
/// directory cannot be created. Unreadable images and unsaved pages are
/// reported and counted in the summary.
pub fn generate<B: RenderBackend + ?Sized>(
    config: &Config,
    backend: &B,
    reporter: &dyn Reporter,
) -> Result<RunSummary, IndexError> {
    if !config.root.is_dir() {
        return Err(IndexError::InvalidRoot(config.root.clone()));
    }

    if let Some(dir) = &config.output_dir {
        fs::create_dir_all(dir).map_err(|source| IndexError::OutputDir {
            path: dir.clone(),
            source,
        })?;
    }

    let groups = FileScanner::new(&config.root, reporter).scan();
    info!("Found {} month(s) with image directories", groups.len());

    let summary = IndexGenerator::new(config, backend, reporter).run(&groups)?;
    reporter.run_finished(&summary);

    Ok(summary)
}
