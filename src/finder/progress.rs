use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use rayon::prelude::*;

/// Below this many items no bar is drawn
const MIN_ITEMS_FOR_BAR: usize = 10;

/// Progress display for scraping
#[derive(Debug, Default)]
pub struct ProgressTracker {}

impl ProgressTracker {
    /// Create a new progress tracker
    pub fn new() -> Self {
        Self {}
    }

    /// A bar for `len` units of work, or a hidden one for short jobs
    pub fn bar(&self, len: usize, unit: &str) -> ProgressBar {
        if len <= MIN_ITEMS_FOR_BAR {
            return ProgressBar::hidden();
        }

        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{eta}}) {{msg}}",
            unit
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let pb = ProgressBar::new(len as u64);
        pb.set_style(style);
        pb
    }

    /// Run `operation` over `items` in parallel, keeping input order
    pub fn track_parallel_progress<T, F, R>(&self, items: &[T], operation: F) -> Vec<R>
    where
        T: Sync,
        F: Fn(&T) -> Option<R> + Sync + Send,
        R: Send,
    {
        let progress_bar = self.bar(items.len(), "pages");
        let processed_count = AtomicUsize::new(0);

        let results: Vec<_> = items
            .par_iter()
            .filter_map(|item| {
                let current = processed_count.fetch_add(1, Ordering::SeqCst) + 1;
                progress_bar.set_position(current as u64);
                operation(item)
            })
            .collect();

        progress_bar.finish_with_message("parsed");
        results
    }
}

/// Size rayon's global pool used for parsing pages.
///
/// The global pool can only be built once per process and must be set up
/// before any parallel work runs. `None` keeps rayon's default.
pub fn configure_parse_threads(threads: Option<usize>) -> Result<()> {
    let Some(threads) = threads else {
        return Ok(());
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .with_context(|| format!("Failed to set up {} parse threads", threads))?;
    debug!("Parsing with {} threads", threads);
    Ok(())
}
