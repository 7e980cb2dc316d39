use std::time::Duration;

use indicatif::ProgressBar;
use log::info;

use crate::data::import::{RegionImport, RunSummary};
use crate::data::repo::addresses::StoreStats;
use crate::utils::megabytes;

/// Receives every user facing event of an import run.
pub trait Progress {
    fn run_started(&mut self, regions: &[String]);
    fn downloading(&mut self, region: &str, url: &str);
    fn downloaded(&mut self, region: &str, compressed_bytes: usize, decompressed_bytes: usize);
    fn batch_committed(&mut self, region: &str, imported: usize);
    fn region_imported(&mut self, import: &RegionImport);
    fn centres_added(&mut self, count: usize);
    fn optimizing(&mut self);
    fn optimized(&mut self);
    fn finished(&mut self, summary: &RunSummary);
}

/// Logs through `log` and shows a spinner while rows are being imported.
#[derive(Default)]
pub struct ConsoleProgress {
    bar: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        ConsoleProgress::default()
    }

    fn finish_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Progress for ConsoleProgress {
    fn run_started(&mut self, regions: &[String]) {
        info!("Downloading the Base Adresse Nationale for regions: {}", regions.join(", "));
    }

    fn downloading(&mut self, region: &str, url: &str) {
        info!("Downloading region {} from {}", region, url);
    }

    fn downloaded(&mut self, region: &str, compressed_bytes: usize, decompressed_bytes: usize) {
        info!("Downloaded region {}: {:.1} MB compressed", region, megabytes(compressed_bytes as u64));
        info!("Decompressed: {:.1} MB", megabytes(decompressed_bytes as u64));

        let bar = ProgressBar::new_spinner();
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_message(format!("Importing addresses of region {}", region));
        self.bar = Some(bar);
    }

    fn batch_committed(&mut self, region: &str, imported: usize) {
        let message = format!("{} addresses imported for region {}...", imported, region);
        if logs_batches(self.bar.as_ref()) {
            info!("{}", message);
        }
        if let Some(bar) = &self.bar {
            bar.set_message(message);
        }
    }

    fn region_imported(&mut self, import: &RegionImport) {
        self.finish_bar();
        info!(
            "{} addresses imported for region {}, {}",
            import.imported, import.region, import.skipped
        );
    }

    fn centres_added(&mut self, count: usize) {
        info!("{} city centres added", count);
    }

    fn optimizing(&mut self) {
        info!("Optimizing address store");
    }

    fn optimized(&mut self) {
        info!("Address store optimized");
    }

    fn finished(&mut self, summary: &RunSummary) {
        self.finish_bar();
        print_stats(&summary.stats);
        info!("Address store created: {}", summary.output_path.display());
        info!("Size: {:.1} MB", megabytes(summary.size_bytes));
        info!("Total: {} addresses imported, {}", summary.imported, summary.skipped);
    }
}

/// The spinner is not drawn when stderr is not a terminal, batches go to the log then.
fn logs_batches(bar: Option<&ProgressBar>) -> bool {
    bar.map_or(true, |bar| bar.is_hidden())
}

fn print_stats(stats: &StoreStats) {
    info!("Store statistics:");
    info!("  Total addresses: {}", stats.total);
    info!("  Cities: {}", stats.cities);
    info!("  Top {} cities:", stats.top_cities.len());
    for (city, count) in &stats.top_cities {
        info!("    - {}: {} addresses", city, count);
    }
}

/// Keeps every event in memory so tests can assert on them.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub downloads: Vec<(String, usize, usize)>,
    pub batches: Vec<(String, usize)>,
    pub regions: Vec<RegionImport>,
    pub centres: Option<usize>,
    pub optimized: bool,
    pub summary: Option<RunSummary>,
}

#[cfg(test)]
impl Progress for RecordingProgress {
    fn run_started(&mut self, _regions: &[String]) {}

    fn downloading(&mut self, _region: &str, _url: &str) {}

    fn downloaded(&mut self, region: &str, compressed_bytes: usize, decompressed_bytes: usize) {
        self.downloads.push((region.to_owned(), compressed_bytes, decompressed_bytes));
    }

    fn batch_committed(&mut self, region: &str, imported: usize) {
        self.batches.push((region.to_owned(), imported));
    }

    fn region_imported(&mut self, import: &RegionImport) {
        self.regions.push(import.clone());
    }

    fn centres_added(&mut self, count: usize) {
        self.centres = Some(count);
    }

    fn optimizing(&mut self) {}

    fn optimized(&mut self) {
        self.optimized = true;
    }

    fn finished(&mut self, summary: &RunSummary) {
        self.summary = Some(summary.clone());
    }
}

#[cfg(test)]
impl RecordingProgress {
    pub fn skipped(&self) -> crate::data::import::parser::SkipCounts {
        let mut total = crate::data::import::parser::SkipCounts::default();
        for region in &self.regions {
            total += region.skipped;
        }
        total
    }
}
