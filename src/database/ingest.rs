use std::io::Read;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Line {line}: {message}")]
    Malformed { line: u64, message: String },
}

/// Reads header-less `name,measurement_unit` rows.
pub fn read_ingredients_csv<R: Read>(reader: R) -> Result<Vec<(String, String)>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = vec![];
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|position| position.line())
            .unwrap_or(index as u64 + 1);

        let (Some(name), Some(unit), None) = (record.get(0), record.get(1), record.get(2)) else {
            return Err(IngestError::Malformed {
                line,
                message: format!("expected 2 fields, found {}", record.len()),
            });
        };
        if name.is_empty() || unit.is_empty() {
            return Err(IngestError::Malformed {
                line,
                message: String::from("name and measurement unit must not be empty"),
            });
        }

        rows.push((name.to_string(), unit.to_string()));
    }

    Ok(rows)
}
