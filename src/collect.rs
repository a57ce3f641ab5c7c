use std::collections::HashSet;

use anyhow::Context as _;
use chrono::{DateTime, Duration, NaiveTime, SecondsFormat, Utc};

use crate::config::RunConfig;
use crate::dataset;
use crate::transform::{self, TransformOptions};
use crate::youtube::{Client, SearchRequest};

#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub new_records: usize,
}

/// Run the whole pipeline once: for each keyword, page through the search
/// results of the target day, fetch details for unseen videos, filter and
/// derive features, and append accepted rows to the dataset after each page.
pub fn run(config: &RunConfig, client: &Client) -> anyhow::Result<RunSummary> {
    let options = TransformOptions::from_config(config)?;

    let (window_start, window_end) = day_window(Utc::now(), config.day_offset);
    let published_after = window_start.to_rfc3339_opts(SecondsFormat::Secs, true);
    let published_before = window_end.to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut seen = match dataset::load_existing_ids(&config.out_path) {
        Ok(ids) => ids,
        Err(err) => {
            tracing::warn!(
                path = %config.out_path.display(),
                ?err,
                "could not read existing dataset; starting with empty history"
            );
            HashSet::new()
        }
    };
    tracing::info!(
        known = seen.len(),
        window_start = %published_after,
        window_end = %published_before,
        "loaded dataset history"
    );

    let mut new_records = 0;

    for query in &config.queries {
        println!("searching: {query}...");

        let request = SearchRequest {
            query,
            language: &config.language,
            published_after: published_after.clone(),
            published_before: published_before.clone(),
            page_size: config.page_size,
        };

        let mut page_token: Option<String> = None;
        for page in 0..config.max_pages {
            let results = client
                .search_page(&request, page_token.as_deref())
                .with_context(|| format!("search page {page} for {query:?}"))?;

            let new_ids: Vec<String> = results
                .video_ids
                .iter()
                .filter(|id| !seen.contains(id.as_str()))
                .cloned()
                .collect();
            tracing::debug!(
                %query,
                page,
                found = results.video_ids.len(),
                new = new_ids.len(),
                "search page"
            );

            if new_ids.is_empty() {
                match results.next_page_token {
                    Some(token) => {
                        page_token = Some(token);
                        continue;
                    }
                    None => break,
                }
            }

            let videos = client
                .videos_list(&new_ids)
                .with_context(|| format!("fetch details for {} videos", new_ids.len()))?;

            let channel_ids: Vec<String> = videos
                .iter()
                .map(|video| video.snippet.channel_id.clone())
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            let subscriber_counts = client
                .channel_subscriber_counts(&channel_ids)
                .context("fetch channel statistics")?;

            let mut batch = Vec::new();
            for video in &videos {
                let Some(record) = transform::build_record(video, &subscriber_counts, &options)?
                else {
                    continue;
                };
                seen.insert(record.video_id.clone());
                batch.push(record);
            }

            if !batch.is_empty() {
                dataset::append_records(&config.out_path, &batch)
                    .with_context(|| format!("append to {}", config.out_path.display()))?;
                new_records += batch.len();
                tracing::info!(%query, page, appended = batch.len(), "appended page batch");
            }

            match results.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
    }

    Ok(RunSummary { new_records })
}

/// The publish window is one full UTC calendar day, `day_offset` days before
/// `now`: 00:00:00 through 23:59:59.
pub fn day_window(now: DateTime<Utc>, day_offset: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let day = (now - Duration::days(day_offset)).date_naive();
    let start = day.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::seconds(86_399);
    (start, end)
}
