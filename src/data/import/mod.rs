use std::fs;
use std::path::PathBuf;

use diesel::SqliteConnection;
use log::debug;

use crate::config::Config;
use crate::data::import::error::ImportError;
use crate::data::import::parser::{parse_addresses, RowOutcome, SkipCounts};
use crate::data::import::source::{decompress, AddressSource};
use crate::data::models::AddressRecord;
use crate::data::repo::addresses::{add_city_centres, insert_addresses, optimize, store_stats, StoreStats};
use crate::db::create_store;
use crate::progress::Progress;

pub mod error;
pub mod parser;
pub mod source;

/// Outcome of loading a single region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionImport {
    pub region: String,
    pub imported: usize,
    pub skipped: SkipCounts,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub size_bytes: u64,
    pub imported: usize,
    pub skipped: SkipCounts,
    pub centres: usize,
    pub stats: StoreStats,
}

/// Builds a fresh store from every configured region, then adds city
/// centres, optimizes the file and reports its statistics.
///
/// Regions are processed one after the other. The first download failure
/// aborts the run; batches committed before it stay on disk.
pub fn run<S, P>(config: &Config, source: &S, progress: &mut P) -> Result<RunSummary, ImportError>
where
    S: AddressSource,
    P: Progress,
{
    progress.run_started(&config.regions);

    let conn = create_store(&config.output_path)?;

    let mut imported = 0;
    let mut skipped = SkipCounts::default();
    for region in &config.regions {
        let text = download_region(source, region, progress)?;
        let rows = parse_addresses(text.as_bytes());
        let import = import_addresses(&conn, region, rows, config.batch_size, progress)?;
        progress.region_imported(&import);

        imported += import.imported;
        skipped += import.skipped;
    }

    let centres = add_city_centres(&conn)?;
    progress.centres_added(centres);

    progress.optimizing();
    optimize(&conn)?;
    progress.optimized();

    let stats = store_stats(&conn)?;
    drop(conn);

    let size_bytes = fs::metadata(&config.output_path)
        .map_err(|err| ImportError::Store(config.output_path.clone(), err))?
        .len();

    let summary = RunSummary {
        output_path: config.output_path.clone(),
        size_bytes,
        imported,
        skipped,
        centres,
        stats,
    };
    progress.finished(&summary);

    Ok(summary)
}

pub fn download_region<S, P>(source: &S, region: &str, progress: &mut P) -> Result<String, ImportError>
where
    S: AddressSource,
    P: Progress,
{
    progress.downloading(region, &source.url(region));
    let bytes = source.fetch(region)?;
    let text = decompress(region, &bytes)?;
    progress.downloaded(region, bytes.len(), text.len());

    Ok(text)
}

/// Persists parsed rows in transactions of `batch_size` records. The last,
/// possibly partial, batch is committed as soon as the rows run out.
pub fn import_addresses<I, P>(
    conn: &SqliteConnection,
    region: &str,
    rows: I,
    batch_size: usize,
    progress: &mut P
) -> Result<RegionImport, ImportError>
where
    I: Iterator<Item = RowOutcome>,
    P: Progress,
{
    let mut batch = Vec::<AddressRecord>::with_capacity(batch_size);
    let mut imported = 0;
    let mut skipped = SkipCounts::default();

    for row in rows {
        match row {
            RowOutcome::Record(record) => batch.push(record),
            RowOutcome::Skipped(reason) => skipped.record(reason),
        }
        if batch.len() >= batch_size {
            imported += process_batch(conn, &mut batch)?;
            progress.batch_committed(region, imported);
        }
    }
    if !batch.is_empty() {
        imported += process_batch(conn, &mut batch)?;
        progress.batch_committed(region, imported);
    }

    Ok(RegionImport { region: region.to_owned(), imported, skipped })
}

fn process_batch(conn: &SqliteConnection, batch: &mut Vec<AddressRecord>) -> Result<usize, ImportError> {
    let inserted = insert_addresses(conn, batch)?;
    debug!("Committed batch of {} addresses", inserted);
    batch.clear();

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::repo::addresses::count_addresses;
    use crate::progress::RecordingProgress;

    fn rows(count: usize) -> Vec<RowOutcome> {
        (0..count)
            .map(|i| {
                RowOutcome::Record(AddressRecord::new(
                    48.0 + i as f64 / 1000.0,
                    7.5,
                    &i.to_string(),
                    "Grand Rue",
                    "67000",
                    "Strasbourg"
                ))
            })
            .collect()
    }

    #[test]
    fn test_import_commits_full_and_partial_batches() {
        let dir = tempfile::tempdir().unwrap();
        let conn = create_store(&dir.path().join("addresses.db")).unwrap();
        let mut progress = RecordingProgress::default();

        let import = import_addresses(&conn, "67", rows(25).into_iter(), 10, &mut progress).unwrap();

        assert_eq!(import.imported, 25);
        assert_eq!(count_addresses(&conn).unwrap(), 25);
        assert_eq!(
            progress.batches,
            vec![("67".to_string(), 10), ("67".to_string(), 20), ("67".to_string(), 25)]
        );
    }

    #[test]
    fn test_import_counts_skipped_rows() {
        let dir = tempfile::tempdir().unwrap();
        let conn = create_store(&dir.path().join("addresses.db")).unwrap();
        let mut progress = RecordingProgress::default();

        let mut outcomes = rows(3);
        outcomes.push(RowOutcome::Skipped(parser::SkipReason::ZeroCoordinate));
        outcomes.push(RowOutcome::Skipped(parser::SkipReason::InvalidCoordinate));

        let import = import_addresses(&conn, "68", outcomes.into_iter(), 10, &mut progress).unwrap();

        assert_eq!(import.imported, 3);
        assert_eq!(import.skipped.zero_coordinate, 1);
        assert_eq!(import.skipped.invalid_coordinate, 1);
        assert_eq!(count_addresses(&conn).unwrap(), 3);
    }

    #[test]
    fn test_import_without_rows() {
        let dir = tempfile::tempdir().unwrap();
        let conn = create_store(&dir.path().join("addresses.db")).unwrap();
        let mut progress = RecordingProgress::default();

        let import = import_addresses(&conn, "67", Vec::new().into_iter(), 10, &mut progress).unwrap();

        assert_eq!(import.imported, 0);
        assert!(progress.batches.is_empty());
    }
}
