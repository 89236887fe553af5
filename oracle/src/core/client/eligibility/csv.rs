use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr as _;

use alloy::primitives::Address;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, warn};

use super::{EligibilityError, EligibilitySource};
use crate::types::constant::{ELIGIBLE_INDEXERS_FILE_NAME, INDEXER_COLUMN};

/// Reads `<root>/<YYYY-MM-DD>/eligible_indexers.csv` written by the eligibility pipeline
#[derive(Debug, Clone)]
pub struct CsvEligibilitySource {
    root: PathBuf,
}

impl CsvEligibilitySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, run_date: NaiveDate) -> PathBuf {
        self.root.join(run_date.format("%Y-%m-%d").to_string()).join(ELIGIBLE_INDEXERS_FILE_NAME)
    }
}

fn malformed(path: &Path, reason: impl Into<String>) -> EligibilityError {
    EligibilityError::Malformed { path: path.to_path_buf(), reason: reason.into() }
}

/// Splits one CSV record. Quoted fields may hold commas and `""` escapes; a
/// record spanning several lines is rejected.
fn split_row(line: &str) -> Result<Vec<String>, String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                cell.push('"');
            }
            ('"', true) => quoted = false,
            ('"', false) if cell.trim().is_empty() => {
                cell.clear();
                quoted = true;
            }
            (',', false) => cells.push(std::mem::take(&mut cell)),
            _ => cell.push(c),
        }
    }
    if quoted {
        return Err("unterminated quoted field".to_string());
    }
    cells.push(cell);
    Ok(cells)
}

/// Extracts the `indexer` column, preserving row order and dropping repeated addresses
fn parse_export(path: &Path, contents: &str) -> Result<Vec<Address>, EligibilityError> {
    let mut lines = contents.lines().enumerate().filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header)) = lines.next() else {
        return Ok(Vec::new());
    };
    let column = split_row(header)
        .map_err(|reason| malformed(path, format!("header: {reason}")))?
        .iter()
        .position(|name| name.trim().eq_ignore_ascii_case(INDEXER_COLUMN))
        .ok_or_else(|| malformed(path, format!("missing `{}` column", INDEXER_COLUMN)))?;

    let mut addresses: Vec<Address> = Vec::new();
    for (index, line) in lines {
        let cells = split_row(line).map_err(|reason| malformed(path, format!("line {}: {reason}", index + 1)))?;
        let cell = cells
            .get(column)
            .map(|cell| cell.trim())
            .ok_or_else(|| malformed(path, format!("line {} has no `{}` value", index + 1, INDEXER_COLUMN)))?;
        let address = Address::from_str(cell)
            .map_err(|e| malformed(path, format!("line {}: invalid address {:?}: {}", index + 1, cell, e)))?;
        if addresses.contains(&address) {
            warn!(address = %address, line = index + 1, "Duplicate indexer in eligibility export, skipping");
            continue;
        }
        addresses.push(address);
    }
    Ok(addresses)
}

#[async_trait]
impl EligibilitySource for CsvEligibilitySource {
    async fn fetch_eligible_indexers(&self, run_date: NaiveDate) -> Result<Vec<Address>, EligibilityError> {
        let path = self.path_for(run_date);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(EligibilityError::NotFound(path)),
            Err(source) => return Err(EligibilityError::Io { path, source }),
        };

        let addresses = parse_export(&path, &contents)?;
        if addresses.is_empty() {
            warn!(path = %path.display(), "Eligibility export contains no indexers");
        }
        info!(
            log_type = "completed",
            category = "data_acquisition",
            run_date = %run_date,
            eligible = addresses.len(),
            "Loaded eligible indexers"
        );
        Ok(addresses)
    }
}
