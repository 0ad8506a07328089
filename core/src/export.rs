//! CSV export of a scan record: `Subdomain,Status`, one row per subdomain.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use forge_common::Domain;
use forge_common::error::ForgeError;
use forge_common::record::ScanRecord;

pub fn csv_file_name(domain: &Domain) -> String {
    format!("{domain}_subdomains.csv")
}

/// Unreachable subdomains get an empty status cell.
pub fn write_csv<W: io::Write>(record: &ScanRecord, writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["Subdomain", "Status"])?;
    for (subdomain, status) in &record.subdomain_statuses {
        let status: String = status.map(|code| code.to_string()).unwrap_or_default();
        out.write_record([subdomain.as_str(), status.as_str()])?;
    }
    out.flush()?;
    Ok(())
}

/// Writes `{dir}/{domain}_subdomains.csv`, replacing an older export.
pub fn export_to(dir: &Path, record: &ScanRecord) -> Result<PathBuf, ForgeError> {
    std::fs::create_dir_all(dir).map_err(|e| ForgeError::io(dir, e))?;

    let path: PathBuf = dir.join(csv_file_name(&record.domain));
    let file = File::create(&path).map_err(|e| ForgeError::io(&path, e))?;
    write_csv(record, file).map_err(|e| ForgeError::io(&path, e.into()))?;
    Ok(path)
}
