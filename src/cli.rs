use clap::Parser;

/// Collect metadata for short-form YouTube videos into a CSV dataset.
///
/// Runs the full search → detail-fetch → filter → append pipeline once and
/// exits. All defaults reproduce the historical collection setup, so running
/// with no flags keeps extending the same dataset.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Search keyword; repeat the flag to collect several keywords in order.
    #[arg(long = "query", value_name = "KEYWORD", default_value = "food")]
    pub queries: Vec<String>,

    /// Path of the CSV dataset to append to (created on first run).
    #[arg(long, default_value = "dataSet_ML_food.csv")]
    pub out: String,

    /// Maximum search pages to request per keyword.
    #[arg(long, default_value_t = 10)]
    pub max_pages: usize,

    /// Results per search page (the API caps this at 50).
    #[arg(long, default_value_t = 50)]
    pub page_size: u32,

    /// Collect videos published this many days before today (one full UTC day).
    #[arg(long, default_value_t = 3)]
    pub day_offset: i64,

    /// ISO 639-1 code used for both the search hint and the title filter.
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Maximum accepted video duration, in seconds.
    #[arg(long, default_value_t = 60.0)]
    pub max_duration_secs: f64,

    /// Keep only videos whose topic categories mention food-related terms.
    #[arg(long, default_value_t = false)]
    pub topic_filter: bool,

    /// Base URL of the YouTube Data API.
    #[arg(long, default_value = "https://www.googleapis.com/youtube/v3")]
    pub api_base_url: String,

    /// API key for the YouTube Data API.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: String,
}
