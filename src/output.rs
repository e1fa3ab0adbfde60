use crate::error::Result;
use crate::models::AnnotationRecord;
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Write a finished session's records to `<results_dir>/annotations_<user>_<timestamp>.csv`.
///
/// An existing file is never overwritten: a second session finishing in the
/// same second for the same user gets a `_2`, `_3`, ... suffix instead.
pub fn write_annotations(
    records: &[AnnotationRecord],
    results_dir: &Path,
    user_id: &str,
    finished_at: DateTime<Local>,
) -> Result<PathBuf> {
    ensure_directory_exists(results_dir)?;

    let stem = annotation_file_stem(user_id, finished_at);
    let (path, file) = create_unique_file(results_dir, &stem)?;
    write_csv(file, records)?;
    info!("Stored {} annotation(s) to: {}", records.len(), path.display());

    Ok(path)
}

/// File name for a user's results, without the extension
pub fn annotation_file_stem(user_id: &str, finished_at: DateTime<Local>) -> String {
    format!(
        "annotations_{}_{}",
        sanitize_file_component(user_id),
        finished_at.format("%Y%m%d_%H%M%S")
    )
}

/// Keep `[A-Za-z0-9._-]`, replace everything else with `_`
fn sanitize_file_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn ensure_directory_exists(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Atomically claim `<stem>.csv`, or the first free `<stem>_<n>.csv`
fn create_unique_file(dir: &Path, stem: &str) -> Result<(PathBuf, File)> {
    let mut attempt = 1u32;
    loop {
        let name = if attempt == 1 {
            format!("{stem}.csv")
        } else {
            format!("{stem}_{attempt}.csv")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("{} already exists", path.display());
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Header row comes from the record's field names
fn write_csv(file: File, records: &[AnnotationRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(file);
    if records.is_empty() {
        writer.write_record(["user_id", "sample_index", "model", "edit_score"])?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
