use crate::table::Table;

/// User-selected predicates over a cleaned catalog. Every field is optional
/// and unset predicates place no restriction; set predicates combine with
/// AND.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    /// Case-insensitive match against the `type` column.
    pub title_type: Option<String>,
    /// Inclusive window of decade labels, e.g. `("1990s", "2010s")`.
    pub decade_range: Option<(String, String)>,
    /// Keep rows whose `genres` list contains at least one of these tokens.
    pub genres: Vec<String>,
}

impl FilterSpec {
    pub fn is_unrestricted(&self) -> bool {
        self.title_type.is_none() && self.decade_range.is_none() && self.genres.is_empty()
    }
}

/// Apply the spec to a table, returning a fresh subset table. The input is
/// never mutated, and re-applying the same spec to the output is a no-op.
pub fn apply(table: &Table, spec: &FilterSpec) -> Table {
    let type_idx = table.column_index("type");
    let decade_idx = table.column_index("decade");
    let genres_idx = table.column_index("genres");

    // A window with an unparseable bound is dropped rather than erroring.
    let decade_window = spec.decade_range.as_ref().and_then(|(start, end)| {
        let start = leading_year(start)?;
        let end = leading_year(end)?;
        decade_idx.map(|idx| (idx, start, end))
    });

    let rows = table
        .rows()
        .iter()
        .filter(|row| {
            if let Some(wanted) = spec.title_type.as_deref() {
                let matched = type_idx
                    .and_then(|idx| row[idx].as_text())
                    .is_some_and(|t| t.eq_ignore_ascii_case(wanted));
                if !matched {
                    return false;
                }
            }

            if let Some((idx, start, end)) = decade_window {
                let matched = row[idx]
                    .as_text()
                    .and_then(leading_year)
                    .is_some_and(|year| (start..=end).contains(&year));
                if !matched {
                    return false;
                }
            }

            if !spec.genres.is_empty() {
                if let Some(idx) = genres_idx {
                    let matched = row[idx]
                        .as_list()
                        .is_some_and(|items| spec.genres.iter().any(|g| items.contains(g)));
                    if !matched {
                        return false;
                    }
                }
            }

            true
        })
        .cloned()
        .collect();

    Table::from_rows(table.headers().to_vec(), rows)
}

/// Leading four-digit year of a decade label: `"1990s" -> 1990`. Anything
/// shorter or non-numeric is `None`.
fn leading_year(label: &str) -> Option<i64> {
    let prefix: String = label.chars().take(4).collect();
    if prefix.len() == 4 && prefix.chars().all(|c| c.is_ascii_digit()) {
        prefix.parse().ok()
    } else {
        None
    }
}
