use pdf_table_engine::{PdfSource, Table, extract_table, write_table_csv_to_string};

use crate::error::ApiError;
use crate::filenames::{allowed_file, spreadsheet_name, unique_upload_name};
use crate::models::{STORED_FILE_TTL_SECONDS, UploadResponse};
use crate::storage;

/// Rejects uploads that are not named like a PDF.
pub fn validate_upload_name(filename: &str) -> Result<(), ApiError> {
    if filename.is_empty() {
        return Err(ApiError::BadRequest("No selected file".to_string()));
    }
    if !allowed_file(filename) {
        return Err(ApiError::BadRequest("Invalid file type".to_string()));
    }
    Ok(())
}

/// Selects the largest table and renders its spreadsheet.
pub fn extract_selected_table(
    pdf_bytes: &[u8],
    password: Option<&str>,
) -> Result<(Table, String), ApiError> {
    let table = extract_table(PdfSource::Bytes(pdf_bytes), password)?;
    let spreadsheet = write_table_csv_to_string(&table, b',')?;
    Ok((table, spreadsheet))
}

pub async fn process_upload(
    storage_root: &str,
    filename: &str,
    pdf_bytes: &[u8],
    password: Option<&str>,
) -> Result<UploadResponse, ApiError> {
    validate_upload_name(filename)?;

    let stored_name = unique_upload_name(filename);
    storage::put_bytes(
        storage_root,
        &stored_name,
        pdf_bytes,
        STORED_FILE_TTL_SECONDS,
        "application/pdf",
    )
    .await?;

    let (table, spreadsheet) = extract_selected_table(pdf_bytes, password)?;
    worker::console_log!(
        "table extracted from {}: page={}, rows={}, columns={}",
        stored_name,
        table.page,
        table.row_count(),
        table.column_count()
    );

    let spreadsheet_filename = spreadsheet_name();
    storage::put_bytes(
        storage_root,
        &spreadsheet_filename,
        spreadsheet.as_bytes(),
        STORED_FILE_TTL_SECONDS,
        "text/csv; charset=utf-8",
    )
    .await?;

    Ok(UploadResponse {
        table_data: table,
        spreadsheet_filename,
    })
}
