//! CSV ingestion from a data directory
//!
//! Layout: one sub-directory per service (`rds/`, `ec2/`, `ebs/`,
//! `snapshots/`, `advisor/`), each holding any number of `*.csv` exports.
//! Files are read in name order so repeated runs see the same batches.

use anyhow::{bail, Context, Result};
use finops_lib::{RawBatch, Service};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read every service directory under `data_dir`
pub fn load_batches(data_dir: &Path) -> Result<Vec<RawBatch>> {
    if !data_dir.is_dir() {
        bail!("Data directory {} does not exist", data_dir.display());
    }

    let mut batches = Vec::new();
    for service in Service::ALL {
        let dir = data_dir.join(service.as_str());
        if !dir.is_dir() {
            debug!(service = %service, dir = %dir.display(), "No export directory");
            continue;
        }
        for file in csv_files(&dir)? {
            batches.push(read_csv(service, &file)?);
        }
    }
    Ok(batches)
}

fn csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Read one export; row width is checked later by the normalizer
pub fn read_csv(service: Service, path: &Path) -> Result<RawBatch> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut batch = RawBatch::new(service, headers);

    for (idx, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("{}: malformed row {}", path.display(), idx + 1))?;
        batch.push_row(row.iter().map(str::to_string).collect());
    }
    debug!(service = %service, file = %path.display(), rows = batch.len(), "Loaded export");
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_loads_service_directories_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("ec2")).unwrap();
        fs::create_dir(dir.path().join("ebs")).unwrap();
        fs::write(
            dir.path().join("ec2").join("b.csv"),
            "instance_id,instance_type\ni-2,m5.large\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("ec2").join("a.csv"),
            "instance_id,instance_type\ni-1,m5.large\ni-3,m5.xlarge\n",
        )
        .unwrap();
        fs::write(dir.path().join("ebs").join("notes.txt"), "ignored").unwrap();

        let batches = load_batches(dir.path()).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].service, Service::Ec2);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[0].rows[0][0], "i-1");
    }

    #[test]
    fn test_missing_data_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_batches(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_cells_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rds.csv");
        fs::write(&path, "db_id , instance_class\n db-1 , db.r5.large \n").unwrap();
        let batch = read_csv(Service::Rds, &path).unwrap();
        assert_eq!(batch.headers, vec!["db_id", "instance_class"]);
        assert_eq!(batch.rows[0], vec!["db-1", "db.r5.large"]);
    }
}
