// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::{debug, warn};

use crate::modules::error::{code::ErrorCode, BulkMailerResult};
use crate::{raise_error, validate_email};

const ADDRESS_HEADER: &str = "email";

/// Reads the ordered recipient list from an uploaded workbook.
///
/// Only the first sheet is consulted. Its first row is the header row and the
/// address column is the one headed `email`. Blank cells are skipped, cells
/// that are not a valid address are skipped with a warning, duplicates are kept.
pub fn extract_recipients(bytes: &[u8]) -> BulkMailerResult<Vec<String>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
        raise_error!(
            format!("Unable to read spreadsheet: {}", e),
            ErrorCode::SpreadsheetParseError
        )
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            raise_error!(
                "Spreadsheet does not contain any sheet".into(),
                ErrorCode::SpreadsheetParseError
            )
        })?
        .map_err(|e| {
            raise_error!(
                format!("Unable to read first sheet: {}", e),
                ErrorCode::SpreadsheetParseError
            )
        })?;

    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| {
        raise_error!(
            "Spreadsheet is empty".into(),
            ErrorCode::SpreadsheetParseError
        )
    })?;

    let column = header
        .iter()
        .position(|cell| cell_text(cell).eq_ignore_ascii_case(ADDRESS_HEADER))
        .ok_or_else(|| {
            raise_error!(
                format!("Spreadsheet has no '{}' column", ADDRESS_HEADER),
                ErrorCode::SpreadsheetParseError
            )
        })?;

    let mut recipients = Vec::new();
    for (index, row) in rows.enumerate() {
        let Some(cell) = row.get(column) else {
            continue;
        };
        let value = cell_text(cell);
        if value.is_empty() {
            continue;
        }
        if let Err(e) = validate_email!(&value) {
            // +2: one for the header, one for 1-based row numbers.
            warn!("Skipping row {}: {}", index + 2, e);
            continue;
        }
        recipients.push(value);
    }

    debug!("Extracted {} recipients from spreadsheet", recipients.len());
    Ok(recipients)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}
