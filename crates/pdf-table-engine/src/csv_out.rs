use std::io::{self, Write};
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::ExtractError;
use crate::model::Table;

fn write_records<W: Write>(writer: &mut Writer<W>, table: &Table) -> Result<(), ExtractError> {
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the table as a spreadsheet: header row of column names, then the
/// rows in extraction order.
///
/// # Errors
/// Fails when the file cannot be created or written.
pub fn write_table_csv(path: &Path, table: &Table, delimiter: u8) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    write_records(&mut writer, table)
}

/// # Errors
/// Fails only if the encoded output is not valid UTF-8.
pub fn write_table_csv_to_string(table: &Table, delimiter: u8) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    write_records(&mut writer, table)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::Io(io::Error::new(io::ErrorKind::InvalidData, error)))
}
