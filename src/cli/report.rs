use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::analysis::aggregate;
use crate::analysis::filter::{self, FilterSpec};
use crate::catalog;
use crate::table::{Table, Value};
use crate::util::env as env_util;

#[derive(Debug, Clone, Default)]
pub struct ReportConfig {
    /// Optional override for the cleaned catalog CSV path.
    pub input: Option<PathBuf>,
    /// Restrict to one title type (case-insensitive).
    pub title_type: Option<String>,
    /// Start decade label, e.g. "1990s".
    pub decade_start: Option<String>,
    /// End decade label, e.g. "2010s".
    pub decade_end: Option<String>,
    /// Keep rows matching any of these genre tokens.
    pub genres: Vec<String>,
    /// Row cap for the top-genres table (defaults to env MM_TOP_GENRES or 10).
    pub top_genres_limit: Option<usize>,
    /// Row cap for the top-popularity table (defaults to env MM_TOP_POPULAR or 20).
    pub top_popular_limit: Option<usize>,
    /// Emit JSON instead of the text report.
    pub json: bool,
}

/// Load a cleaned catalog, apply the requested filters, and print the
/// aggregate battery.
pub fn run(cfg: ReportConfig) -> Result<()> {
    env_util::init_env();
    let input = cfg.input.clone().unwrap_or_else(env_util::cleaned_csv_path);
    let genres_limit = cfg
        .top_genres_limit
        .unwrap_or_else(|| env_util::env_parse("MM_TOP_GENRES", 10));
    let popular_limit = cfg
        .top_popular_limit
        .unwrap_or_else(|| env_util::env_parse("MM_TOP_POPULAR", 20));

    let table = catalog::load_cleaned(&input)?;
    info!(rows = table.len(), path = %input.display(), "loaded cleaned catalog");

    let spec = FilterSpec {
        title_type: cfg.title_type.clone(),
        decade_range: cfg
            .decade_start
            .clone()
            .zip(cfg.decade_end.clone()),
        genres: cfg.genres.clone(),
    };
    let filtered = filter::apply(&table, &spec);

    let kpis = aggregate::kpi_summary(&filtered);
    let per_decade = aggregate::titles_per_decade(&filtered);
    let genres = aggregate::top_genres(&filtered, genres_limit);
    let countries = aggregate::country_counts(&filtered);
    let best_per_year = aggregate::best_imdb_each_year(&filtered);
    let popular = aggregate::top_popular(&filtered, popular_limit);
    let paired = aggregate::imdb_vs_tmdb(&filtered);

    if cfg.json {
        let payload = json!({
            "source": input.display().to_string(),
            "total_rows": table.len(),
            "filtered_rows": filtered.len(),
            "kpis": kpis,
            "titles_per_decade": per_decade.to_json_records(),
            "top_genres": genres.to_json_records(),
            "country_counts": countries.to_json_records(),
            "best_imdb_each_year": best_per_year.to_json_records(),
            "top_popular": popular.to_json_records(),
            "imdb_vs_tmdb_rows": paired.len(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let mut out = String::new();
    let _ = writeln!(out, "== MovieMind report ==");
    let _ = writeln!(out, "source: {}", input.display());
    if !spec.is_unrestricted() {
        let _ = writeln!(
            out,
            "filters: type={} decades={} genres={}",
            spec.title_type.as_deref().unwrap_or("*"),
            spec.decade_range
                .as_ref()
                .map(|(s, e)| format!("{s}..{e}"))
                .unwrap_or_else(|| "*".to_string()),
            if spec.genres.is_empty() {
                "*".to_string()
            } else {
                spec.genres.join(",")
            },
        );
    }
    let _ = writeln!(out, "titles: {} (of {})", filtered.len(), table.len());
    let _ = writeln!(
        out,
        "avg imdb: {}",
        kpis.avg_imdb_score
            .map(|avg| format!("{avg:.2}"))
            .unwrap_or_else(|| "n/a".to_string())
    );
    let _ = writeln!(
        out,
        "years: {} - {}",
        kpis.year_min
            .map(|y| y.to_string())
            .unwrap_or_else(|| "n/a".to_string()),
        kpis.year_max
            .map(|y| y.to_string())
            .unwrap_or_else(|| "n/a".to_string()),
    );

    push_table(&mut out, "titles per decade", &per_decade);
    push_table(&mut out, "top genres", &genres);
    push_table(&mut out, "production countries", &countries);
    push_table(&mut out, "best imdb score each year", &best_per_year);
    push_table(&mut out, "most popular (tmdb)", &popular);
    let _ = writeln!(out, "\n-- imdb vs tmdb --");
    let _ = writeln!(out, "paired rows: {}", paired.len());

    print!("{out}");
    Ok(())
}

/// Append one aggregate table to the report, first column left-padded to its
/// widest cell.
fn push_table(out: &mut String, title: &str, table: &Table) {
    let _ = writeln!(out, "\n-- {title} --");
    if table.is_empty() {
        let _ = writeln!(out, "(none)");
        return;
    }
    let rendered: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.iter().map(Value::render).collect())
        .collect();
    let first_width = rendered
        .iter()
        .map(|row| row.first().map_or(0, String::len))
        .max()
        .unwrap_or(0);
    for row in rendered {
        if let Some((first, rest)) = row.split_first() {
            let _ = writeln!(out, "{first:<first_width$}  {}", rest.join("  "));
        }
    }
}
