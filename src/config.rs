use std::path::PathBuf;

use anyhow::Context as _;
use url::Url;

use crate::cli::Cli;

/// Everything the pipeline needs, resolved once at startup. Passing this (and
/// a client) into [`crate::collect::run`] keeps the pipeline free of globals
/// and lets tests point it at a stub API and a scratch dataset.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub queries: Vec<String>,
    pub out_path: PathBuf,
    pub max_pages: usize,
    pub page_size: u32,
    pub day_offset: i64,
    pub language: String,
    pub max_duration_secs: f64,
    pub topic_filter: bool,
    pub api_base_url: String,
    pub api_key: String,
}

impl RunConfig {
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        if cli.queries.is_empty() {
            anyhow::bail!("at least one --query is required");
        }
        if cli.max_pages == 0 {
            anyhow::bail!("--max-pages must be > 0");
        }
        if cli.page_size == 0 || cli.page_size > 50 {
            anyhow::bail!("--page-size must be between 1 and 50");
        }
        if cli.day_offset < 0 {
            anyhow::bail!("--day-offset must not be negative");
        }
        if !cli.max_duration_secs.is_finite() || cli.max_duration_secs <= 0.0 {
            anyhow::bail!("--max-duration-secs must be a positive number");
        }

        let base_url = Url::parse(&cli.api_base_url).context("parse --api-base-url")?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            anyhow::bail!("--api-base-url must be http/https: {base_url}");
        }

        Ok(Self {
            queries: cli.queries,
            out_path: PathBuf::from(cli.out),
            max_pages: cli.max_pages,
            page_size: cli.page_size,
            day_offset: cli.day_offset,
            language: cli.language,
            max_duration_secs: cli.max_duration_secs,
            topic_filter: cli.topic_filter,
            api_base_url: cli.api_base_url,
            api_key: cli.api_key,
        })
    }
}
