//! Catalog file I/O: the raw CSV comes in, the cleaned CSV goes out.
//! Unreadable files are the one fatal error in the crate; everything
//! cell-level is absorbed by the cleaning pipeline.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};

use crate::normalization::pipeline;
use crate::table::{Table, Value};

/// Read a raw catalog CSV into a table of `Null`/`Text` cells. Short rows
/// are padded, so files with partially missing fields load fine.
pub fn load_raw(path: &Path) -> Result<Table> {
    let file = File::open(path)
        .with_context(|| format!("failed to open catalog file {}", path.display()))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("failed to read header row of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = Table::new(headers);
    for record in reader.records() {
        let record =
            record.with_context(|| format!("failed to read record from {}", path.display()))?;
        let row = record
            .iter()
            .map(|cell| {
                if cell.is_empty() {
                    Value::Null
                } else {
                    Value::text(cell)
                }
            })
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

/// Load a stored cleaned catalog and re-run the cleaning pass over it. The
/// pass is idempotent, so this restores the `List`/`Number` cells from their
/// flat text encoding without touching anything already canonical.
pub fn load_cleaned(path: &Path) -> Result<Table> {
    Ok(pipeline::clean(&load_raw(path)?))
}

/// Serialize list cells to their flat text form and write the table as CSV.
/// Nulls become empty fields; integral numbers are written without a
/// trailing `.0`.
pub fn save_cleaned(table: &Table, path: &Path) -> Result<()> {
    let flat = pipeline::serialize(table);
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;

    writer.write_record(flat.headers())?;
    for row in flat.rows() {
        writer.write_record(row.iter().map(Value::render))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush output file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("moviemind-{}-{name}", std::process::id()))
    }

    #[test]
    fn loads_raw_csv_with_sparse_rows() {
        let path = temp_path("raw.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "id,title,release_year,genres").unwrap();
        writeln!(file, "1,Heat,1995,\"['Crime', 'Drama']\"").unwrap();
        writeln!(file, "2,Short Row").unwrap();
        drop(file);

        let table = load_raw(&path).unwrap();
        assert_eq!(table.headers(), ["id", "title", "release_year", "genres"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.cell(0, "genres"),
            Some(&Value::text("['Crime', 'Drama']"))
        );
        assert_eq!(table.cell(1, "release_year"), Some(&Value::Null));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn cleaned_round_trip_preserves_every_column() {
        let path = temp_path("cleaned.csv");
        let raw = Table::from_rows(
            vec![
                "id".into(),
                "title".into(),
                "type".into(),
                "release_year".into(),
                "genres".into(),
            ],
            vec![vec![
                Value::text("1"),
                Value::text(" Heat "),
                Value::text("movie"),
                Value::text("1995"),
                Value::text("['Crime', 'Drama']"),
            ]],
        );
        let cleaned = pipeline::clean(&raw);
        save_cleaned(&cleaned, &path).unwrap();
        let reloaded = load_cleaned(&path).unwrap();
        assert_eq!(reloaded, cleaned);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_a_fatal_error() {
        let err = load_raw(Path::new("data/definitely-not-here.csv")).unwrap_err();
        assert!(err.to_string().contains("definitely-not-here.csv"));
    }
}
