use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::normalization::pipeline;
use crate::util::env as env_util;
use crate::catalog;

#[derive(Debug, Clone, Default)]
pub struct CleanConfig {
    /// Optional override for the raw catalog CSV (defaults to env MM_DATA_CSV).
    pub input: Option<PathBuf>,
    /// Optional override for the cleaned output CSV (defaults to env MM_CLEANED_CSV).
    pub output: Option<PathBuf>,
}

/// Run the cleaning pipeline over the raw catalog and write the canonical
/// cleaned file.
pub fn run(cfg: CleanConfig) -> Result<()> {
    env_util::init_env();
    let input = cfg.input.unwrap_or_else(env_util::data_csv_path);
    let output = cfg.output.unwrap_or_else(env_util::cleaned_csv_path);

    let raw = catalog::load_raw(&input)?;
    info!(rows = raw.len(), path = %input.display(), "loaded raw catalog");

    let cleaned = pipeline::clean(&raw);
    catalog::save_cleaned(&cleaned, &output)?;
    info!(
        rows = cleaned.len(),
        dropped = raw.len() - cleaned.len(),
        path = %output.display(),
        "wrote cleaned catalog"
    );
    Ok(())
}
