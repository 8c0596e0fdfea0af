use pdf_table_engine::Table;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STORAGE_ROOT: &str = "uploads";
pub const ALLOWED_EXTENSIONS: [&str; 1] = ["pdf"];
pub const STORED_FILE_TTL_SECONDS: u32 = 24 * 60 * 60;
pub const SPREADSHEET_SUFFIX: &str = "extracted_table.csv";

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub table_data: Table,
    pub spreadsheet_filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
