use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

use crate::table::{Table, Value};

/// Dashboard KPI row: overall counts and spans for the (filtered) catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_titles: usize,
    pub avg_imdb_score: Option<f64>,
    pub year_min: Option<i64>,
    pub year_max: Option<i64>,
}

/// Row count per decade, ascending by decade label.
pub fn titles_per_decade(table: &Table) -> Table {
    let headers = vec!["decade".to_string(), "count".to_string()];
    let Some(idx) = table.column_index("decade") else {
        return Table::new(headers);
    };
    let mut counts: IndexMap<String, u64> = IndexMap::new();
    for row in table.rows() {
        if let Some(label) = row[idx].as_text() {
            *counts.entry(label.to_string()).or_insert(0) += 1;
        }
    }
    let rows = counts
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|(decade, count)| vec![Value::text(decade), Value::Number(count as f64)])
        .collect();
    Table::from_rows(headers, rows)
}

/// The `n` most frequent genre tokens across all rows, count descending.
/// Ties keep first-encountered order.
pub fn top_genres(table: &Table, n: usize) -> Table {
    ranked_tokens(table, "genres", "genre", Some(n))
}

/// Occurrence count per production country, count descending, untruncated.
pub fn country_counts(table: &Table) -> Table {
    ranked_tokens(table, "production_countries", "country", None)
}

/// The highest-scored title per release year, ascending by year. The first
/// row wins a score tie within its year.
pub fn best_imdb_each_year(table: &Table) -> Table {
    let headers = vec![
        "release_year".to_string(),
        "title".to_string(),
        "imdb_score".to_string(),
    ];
    let (Some(year_idx), Some(score_idx)) = (
        table.column_index("release_year"),
        table.column_index("imdb_score"),
    ) else {
        return Table::new(headers);
    };
    let title_idx = table.column_index("title");

    let mut best: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for (i, row) in table.rows().iter().enumerate() {
        let (Some(year), Some(score)) = (row[year_idx].as_number(), row[score_idx].as_number())
        else {
            continue;
        };
        match best.entry(year.trunc() as i64) {
            Entry::Vacant(slot) => {
                slot.insert((score, i));
            }
            Entry::Occupied(mut slot) => {
                if score > slot.get().0 {
                    slot.insert((score, i));
                }
            }
        }
    }

    let rows = best
        .into_iter()
        .map(|(year, (score, i))| {
            let title = title_idx
                .map(|idx| table.rows()[i][idx].clone())
                .unwrap_or(Value::Null);
            vec![Value::Number(year as f64), title, Value::Number(score)]
        })
        .collect();
    Table::from_rows(headers, rows)
}

/// Top `n` rows by TMDB popularity, descending. Rows without a popularity
/// value are dropped first.
pub fn top_popular(table: &Table, n: usize) -> Table {
    let headers = vec![
        "title".to_string(),
        "tmdb_popularity".to_string(),
        "release_year".to_string(),
    ];
    let Some(pop_idx) = table.column_index("tmdb_popularity") else {
        return Table::new(headers);
    };
    let title_idx = table.column_index("title");
    let year_idx = table.column_index("release_year");

    let mut scored: Vec<(f64, &Vec<Value>)> = table
        .rows()
        .iter()
        .filter_map(|row| row[pop_idx].as_number().map(|p| (p, row)))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.truncate(n);

    let rows = scored
        .into_iter()
        .map(|(popularity, row)| {
            let pick = |idx: Option<usize>| idx.map(|i| row[i].clone()).unwrap_or(Value::Null);
            vec![pick(title_idx), Value::Number(popularity), pick(year_idx)]
        })
        .collect();
    Table::from_rows(headers, rows)
}

/// The paired-comparison set: rows where both scores are present, full row
/// schema. When either column is missing entirely the result is an empty
/// table that still carries the two score headers.
pub fn imdb_vs_tmdb(table: &Table) -> Table {
    let (Some(imdb_idx), Some(tmdb_idx)) = (
        table.column_index("imdb_score"),
        table.column_index("tmdb_score"),
    ) else {
        return Table::new(vec!["imdb_score".to_string(), "tmdb_score".to_string()]);
    };
    let rows = table
        .rows()
        .iter()
        .filter(|row| row[imdb_idx].as_number().is_some() && row[tmdb_idx].as_number().is_some())
        .cloned()
        .collect();
    Table::from_rows(table.headers().to_vec(), rows)
}

/// Non-null values of one score column, the histogram source for the
/// ratings chart.
pub fn score_distribution(table: &Table, score_col: &str) -> Table {
    let headers = vec![score_col.to_string()];
    let Some(idx) = table.column_index(score_col) else {
        return Table::new(headers);
    };
    let rows = table
        .rows()
        .iter()
        .filter(|row| !row[idx].is_null())
        .map(|row| vec![row[idx].clone()])
        .collect();
    Table::from_rows(headers, rows)
}

pub fn kpi_summary(table: &Table) -> KpiSummary {
    let scores = numeric_column(table, "imdb_score");
    let avg_imdb_score =
        (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64);
    let years = numeric_column(table, "release_year");
    let year_min = years
        .iter()
        .copied()
        .reduce(f64::min)
        .map(|y| y.trunc() as i64);
    let year_max = years
        .iter()
        .copied()
        .reduce(f64::max)
        .map(|y| y.trunc() as i64);
    KpiSummary {
        total_titles: table.len(),
        avg_imdb_score,
        year_min,
        year_max,
    }
}

/// Sorted unique decade labels, the option list for the decade filter.
pub fn distinct_decades(table: &Table) -> Vec<String> {
    let Some(idx) = table.column_index("decade") else {
        return Vec::new();
    };
    table
        .rows()
        .iter()
        .filter_map(|row| row[idx].as_text())
        .map(str::to_string)
        .unique()
        .sorted()
        .collect()
}

/// Sorted unique genre tokens, the option list for the genre filter.
pub fn distinct_genres(table: &Table) -> Vec<String> {
    token_counts(table, "genres").into_keys().sorted().collect()
}

fn ranked_tokens(table: &Table, column: &str, label: &str, limit: Option<usize>) -> Table {
    let headers = vec![label.to_string(), "count".to_string()];
    if table.column_index(column).is_none() {
        return Table::new(headers);
    }
    let mut entries: Vec<(String, u64)> = token_counts(table, column).into_iter().collect();
    // stable sort keeps first-encountered order among equal counts
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    if let Some(n) = limit {
        entries.truncate(n);
    }
    let rows = entries
        .into_iter()
        .map(|(token, count)| vec![Value::text(token), Value::Number(count as f64)])
        .collect();
    Table::from_rows(headers, rows)
}

/// Flattened multiset of one list column, counted in first-encountered
/// order.
fn token_counts(table: &Table, column: &str) -> IndexMap<String, u64> {
    let mut counts = IndexMap::new();
    if let Some(idx) = table.column_index(column) {
        for row in table.rows() {
            if let Some(items) = row[idx].as_list() {
                for item in items {
                    *counts.entry(item.clone()).or_insert(0) += 1;
                }
            }
        }
    }
    counts
}

fn numeric_column(table: &Table, name: &str) -> Vec<f64> {
    table
        .column_index(name)
        .map(|idx| {
            table
                .rows()
                .iter()
                .filter_map(|row| row[idx].as_number())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Table {
        Table::from_rows(
            vec![
                "title".into(),
                "release_year".into(),
                "decade".into(),
                "genres".into(),
                "production_countries".into(),
                "imdb_score".into(),
                "tmdb_score".into(),
                "tmdb_popularity".into(),
            ],
            vec![
                vec![
                    Value::text("Heat"),
                    Value::Number(1995.0),
                    Value::text("1990s"),
                    Value::List(vec!["Crime".into(), "Drama".into()]),
                    Value::List(vec!["US".into()]),
                    Value::Number(8.3),
                    Value::Number(7.9),
                    Value::Number(55.0),
                ],
                vec![
                    Value::text("Casino"),
                    Value::Number(1995.0),
                    Value::text("1990s"),
                    Value::List(vec!["Crime".into(), "Drama".into()]),
                    Value::List(vec!["US".into(), "FR".into()]),
                    Value::Number(8.2),
                    Value::Number(8.0),
                    Value::Number(40.0),
                ],
                vec![
                    Value::text("Seinfeld"),
                    Value::Number(1989.0),
                    Value::text("1980s"),
                    Value::List(vec!["Comedy".into()]),
                    Value::List(vec!["US".into()]),
                    Value::Number(8.9),
                    Value::Null,
                    Value::Number(90.0),
                ],
                vec![
                    Value::text("Unknown Year"),
                    Value::Null,
                    Value::Null,
                    Value::Null,
                    Value::Null,
                    Value::Number(6.0),
                    Value::Number(5.5),
                    Value::Null,
                ],
            ],
        )
    }

    #[test]
    fn titles_per_decade_counts_and_sorts_ascending() {
        let out = titles_per_decade(&catalog());
        assert_eq!(out.headers(), ["decade", "count"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out.cell(0, "decade"), Some(&Value::text("1980s")));
        assert_eq!(out.cell(0, "count"), Some(&Value::Number(1.0)));
        assert_eq!(out.cell(1, "decade"), Some(&Value::text("1990s")));
        assert_eq!(out.cell(1, "count"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn top_genres_caps_rows_and_breaks_ties_by_first_encounter() {
        let out = top_genres(&catalog(), 2);
        assert_eq!(out.len(), 2);
        // Crime and Drama both appear twice; Crime was seen first
        assert_eq!(out.cell(0, "genre"), Some(&Value::text("Crime")));
        assert_eq!(out.cell(1, "genre"), Some(&Value::text("Drama")));

        let total_tokens = 5u64; // 2 Crime + 2 Drama + 1 Comedy
        let returned: f64 = out
            .rows()
            .iter()
            .filter_map(|row| row[1].as_number())
            .sum();
        assert!(returned as u64 <= total_tokens);
    }

    #[test]
    fn country_counts_are_untruncated_and_descending() {
        let out = country_counts(&catalog());
        assert_eq!(out.headers(), ["country", "count"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out.cell(0, "country"), Some(&Value::text("US")));
        assert_eq!(out.cell(0, "count"), Some(&Value::Number(3.0)));
        assert_eq!(out.cell(1, "country"), Some(&Value::text("FR")));
    }

    #[test]
    fn best_imdb_each_year_returns_one_row_per_year() {
        let out = best_imdb_each_year(&catalog());
        assert_eq!(out.headers(), ["release_year", "title", "imdb_score"]);
        assert_eq!(out.len(), 2); // the null-year row is dropped
        assert_eq!(out.cell(0, "release_year"), Some(&Value::Number(1989.0)));
        assert_eq!(out.cell(0, "title"), Some(&Value::text("Seinfeld")));
        assert_eq!(out.cell(1, "title"), Some(&Value::text("Heat")));
    }

    #[test]
    fn best_imdb_keeps_the_first_row_on_score_ties() {
        let table = Table::from_rows(
            vec!["title".into(), "release_year".into(), "imdb_score".into()],
            vec![
                vec![Value::text("first"), Value::Number(2001.0), Value::Number(7.0)],
                vec![Value::text("second"), Value::Number(2001.0), Value::Number(7.0)],
            ],
        );
        let out = best_imdb_each_year(&table);
        assert_eq!(out.len(), 1);
        assert_eq!(out.cell(0, "title"), Some(&Value::text("first")));
    }

    #[test]
    fn top_popular_sorts_descending_and_drops_nulls() {
        let out = top_popular(&catalog(), 2);
        assert_eq!(out.headers(), ["title", "tmdb_popularity", "release_year"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out.cell(0, "title"), Some(&Value::text("Seinfeld")));
        assert_eq!(out.cell(1, "title"), Some(&Value::text("Heat")));
    }

    #[test]
    fn imdb_vs_tmdb_keeps_only_paired_rows() {
        let out = imdb_vs_tmdb(&catalog());
        assert_eq!(out.headers(), catalog().headers());
        assert_eq!(out.len(), 3); // Seinfeld has no tmdb_score
    }

    #[test]
    fn imdb_vs_tmdb_without_a_score_column_keeps_the_pair_headers() {
        let table = Table::from_rows(
            vec!["title".into(), "imdb_score".into()],
            vec![vec![Value::text("Heat"), Value::Number(8.3)]],
        );
        let out = imdb_vs_tmdb(&table);
        assert!(out.is_empty());
        assert_eq!(out.headers(), ["imdb_score", "tmdb_score"]);
    }

    #[test]
    fn queries_on_missing_columns_return_empty_fixed_schemas() {
        let bare = Table::new(vec!["headline".into()]);
        assert_eq!(titles_per_decade(&bare).headers(), ["decade", "count"]);
        assert!(titles_per_decade(&bare).is_empty());
        assert_eq!(top_genres(&bare, 5).headers(), ["genre", "count"]);
        assert_eq!(country_counts(&bare).headers(), ["country", "count"]);
        assert_eq!(
            best_imdb_each_year(&bare).headers(),
            ["release_year", "title", "imdb_score"]
        );
        assert_eq!(
            top_popular(&bare, 5).headers(),
            ["title", "tmdb_popularity", "release_year"]
        );
        assert_eq!(
            score_distribution(&bare, "imdb_score").headers(),
            ["imdb_score"]
        );
    }

    #[test]
    fn score_distribution_drops_nulls_only() {
        let out = score_distribution(&catalog(), "tmdb_score");
        assert_eq!(out.len(), 3);
        assert!(out.rows().iter().all(|row| row[0].as_number().is_some()));
    }

    #[test]
    fn kpi_summary_reports_counts_and_spans() {
        let kpis = kpi_summary(&catalog());
        assert_eq!(kpis.total_titles, 4);
        assert_eq!(kpis.year_min, Some(1989));
        assert_eq!(kpis.year_max, Some(1995));
        let avg = kpis.avg_imdb_score.unwrap();
        assert!((avg - 7.85).abs() < 1e-9);
    }

    #[test]
    fn kpi_summary_of_an_empty_table_is_zeroed() {
        let kpis = kpi_summary(&Table::new(vec!["headline".into()]));
        assert_eq!(kpis, KpiSummary::default());
    }

    #[test]
    fn distinct_option_lists_are_sorted_and_unique() {
        assert_eq!(distinct_decades(&catalog()), ["1980s", "1990s"]);
        assert_eq!(distinct_genres(&catalog()), ["Comedy", "Crime", "Drama"]);
        assert!(distinct_decades(&Table::new(vec!["headline".into()])).is_empty());
    }
}
