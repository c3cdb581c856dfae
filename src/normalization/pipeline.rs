use std::collections::HashSet;

use tracing::debug;

use crate::normalization::list_field::{parse_list, render_list};
use crate::table::{Table, Value};

/// Columns stored as bracketed-list text in the raw file.
pub const LIST_COLUMNS: [&str; 2] = ["genres", "production_countries"];

/// Columns coerced to numbers; anything unparseable becomes null.
pub const NUMERIC_COLUMNS: [&str; 7] = [
    "release_year",
    "runtime",
    "seasons",
    "imdb_votes",
    "imdb_score",
    "tmdb_popularity",
    "tmdb_score",
];

/// Run the full cleaning pass over a raw catalog table.
///
/// Steps, in order: trim/upper-case the text columns, parse the list
/// columns, coerce the numeric columns, recompute the derived
/// `primary_genre` and `decade` columns, then drop duplicate `id` rows
/// keeping the first occurrence. A column the table does not have skips its
/// step. Running the pass on its own output changes nothing.
pub fn clean(table: &Table) -> Table {
    let mut out = table.clone();

    out.map_column("title", |value| match value {
        Value::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::text(trimmed)
            }
        }
        other => other.clone(),
    });

    out.map_column("type", |value| match value {
        Value::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::text(trimmed.to_uppercase())
            }
        }
        other => other.clone(),
    });

    for column in LIST_COLUMNS {
        out.map_column(column, |value| match parse_list(value) {
            Some(items) => Value::List(items),
            None => Value::Null,
        });
    }

    for column in NUMERIC_COLUMNS {
        out.map_column(column, coerce_numeric);
    }

    if let Some(genres_idx) = out.column_index("genres") {
        let primary: Vec<Value> = out
            .rows()
            .iter()
            .map(|row| match &row[genres_idx] {
                Value::List(items) if !items.is_empty() => Value::text(items[0].clone()),
                _ => Value::Null,
            })
            .collect();
        out.set_column("primary_genre", primary);
    }

    if let Some(year_idx) = out.column_index("release_year") {
        let decades: Vec<Value> = out
            .rows()
            .iter()
            .map(|row| match &row[year_idx] {
                Value::Number(year) => Value::text(decade_label(*year)),
                _ => Value::Null,
            })
            .collect();
        out.set_column("decade", decades);
    }

    if let Some(id_idx) = out.column_index("id") {
        let before = out.len();
        let mut seen = HashSet::new();
        out.retain_rows(|row| seen.insert(row[id_idx].render()));
        let dropped = before - out.len();
        if dropped > 0 {
            debug!(dropped, "dropped duplicate ids");
        }
    }

    out
}

/// Flatten list cells back into bracketed text so the table can be written
/// to CSV. Everything else passes through untouched.
pub fn serialize(table: &Table) -> Table {
    let mut out = table.clone();
    for column in LIST_COLUMNS {
        out.map_column(column, |value| match value {
            Value::List(items) => Value::text(render_list(items)),
            other => other.clone(),
        });
    }
    out
}

/// `1994 -> "1990s"`. Fractional years truncate before bucketing.
fn decade_label(year: f64) -> String {
    let decade = (year.trunc() as i64).div_euclid(10) * 10;
    format!("{decade}s")
}

fn coerce_numeric(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Null,
        },
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_catalog() -> Table {
        Table::from_rows(
            vec![
                "id".into(),
                "title".into(),
                "type".into(),
                "release_year".into(),
                "genres".into(),
                "imdb_score".into(),
            ],
            vec![
                vec![
                    Value::text("1"),
                    Value::text("  Pulp Fiction "),
                    Value::text(" movie"),
                    Value::text("1994"),
                    Value::text("['Drama', 'Crime']"),
                    Value::text("8.9"),
                ],
                vec![
                    Value::text("2"),
                    Value::text("Seinfeld"),
                    Value::text("Show"),
                    Value::text("1989"),
                    Value::text("Comedy"),
                    Value::text("n/a"),
                ],
            ],
        )
    }

    #[test]
    fn cleans_text_lists_numbers_and_derived_columns() {
        let cleaned = clean(&raw_catalog());

        assert_eq!(cleaned.cell(0, "title"), Some(&Value::text("Pulp Fiction")));
        assert_eq!(cleaned.cell(0, "type"), Some(&Value::text("MOVIE")));
        assert_eq!(
            cleaned.cell(0, "genres"),
            Some(&Value::List(vec!["Drama".into(), "Crime".into()]))
        );
        assert_eq!(cleaned.cell(0, "release_year"), Some(&Value::Number(1994.0)));
        assert_eq!(cleaned.cell(0, "primary_genre"), Some(&Value::text("Drama")));
        assert_eq!(cleaned.cell(0, "decade"), Some(&Value::text("1990s")));

        // the malformed cells coerce instead of failing
        assert_eq!(
            cleaned.cell(1, "genres"),
            Some(&Value::List(vec!["Comedy".into()]))
        );
        assert_eq!(cleaned.cell(1, "imdb_score"), Some(&Value::Null));
        assert_eq!(cleaned.cell(1, "decade"), Some(&Value::text("1980s")));
    }

    #[test]
    fn cleaning_is_idempotent() {
        let once = clean(&raw_catalog());
        let twice = clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let table = Table::from_rows(
            vec!["id".into(), "title".into()],
            vec![
                vec![Value::text("5"), Value::text("first")],
                vec![Value::text("6"), Value::text("other")],
                vec![Value::text("5"), Value::text("second")],
            ],
        );
        let cleaned = clean(&table);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned.cell(0, "title"), Some(&Value::text("first")));
        assert_eq!(cleaned.cell(1, "title"), Some(&Value::text("other")));
    }

    #[test]
    fn missing_columns_are_skipped_silently() {
        let table = Table::from_rows(
            vec!["headline".into()],
            vec![vec![Value::text("no known columns here")]],
        );
        let cleaned = clean(&table);
        assert_eq!(cleaned, table);
    }

    #[test]
    fn derived_columns_are_recomputed_not_duplicated() {
        let cleaned = clean(&raw_catalog());
        let again = clean(&cleaned);
        let primary_count = again
            .headers()
            .iter()
            .filter(|h| h.as_str() == "primary_genre")
            .count();
        assert_eq!(primary_count, 1);
    }

    #[test]
    fn serialize_flattens_list_cells_only() {
        let cleaned = clean(&raw_catalog());
        let flat = serialize(&cleaned);
        assert_eq!(
            flat.cell(0, "genres"),
            Some(&Value::text("['Drama', 'Crime']"))
        );
        assert_eq!(flat.cell(0, "release_year"), Some(&Value::Number(1994.0)));
    }

    #[test]
    fn decade_labels_bucket_by_ten() {
        assert_eq!(decade_label(1994.0), "1990s");
        assert_eq!(decade_label(2000.0), "2000s");
        assert_eq!(decade_label(1999.9), "1990s");
    }
}
