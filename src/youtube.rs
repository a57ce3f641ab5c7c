use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Thin blocking client for the three YouTube Data API v3 endpoints the
/// pipeline consumes: `/search`, `/videos` and `/channels`.
///
/// Any non-success status or malformed body is an error; the pipeline has no
/// retry layer, so these propagate and end the run.
#[derive(Debug)]
pub struct Client {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

/// Search filters that stay constant across the pages of one keyword.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub language: &'a str,
    pub published_after: String,
    pub published_before: String,
    pub page_size: u32,
}

/// One page of search results: the video IDs in response order, plus the
/// continuation token when the API has more.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub video_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

impl Client {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("build http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    pub fn search_page(
        &self,
        request: &SearchRequest<'_>,
        page_token: Option<&str>,
    ) -> anyhow::Result<SearchPage> {
        let page_size = request.page_size.to_string();
        let mut params = vec![
            ("part", "id"),
            ("q", request.query),
            ("type", "video"),
            ("videoDuration", "short"),
            ("relevanceLanguage", request.language),
            ("publishedAfter", request.published_after.as_str()),
            ("publishedBefore", request.published_before.as_str()),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response: SearchResponse = self.get("search", &params)?;
        let video_ids = response
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect();

        Ok(SearchPage {
            video_ids,
            next_page_token: response.next_page_token,
        })
    }

    /// Batched detail lookup for up to one search page of IDs (≤50).
    pub fn videos_list(&self, ids: &[String]) -> anyhow::Result<Vec<Video>> {
        let joined = ids.join(",");
        let params = [
            ("part", "snippet,statistics,contentDetails,topicDetails,status"),
            ("id", joined.as_str()),
        ];
        let response: VideoListResponse = self.get("videos", &params)?;
        Ok(response.items)
    }

    /// Subscriber counts for a batch of channels. Channels missing from the
    /// response, or missing the field, are simply absent from the map.
    pub fn channel_subscriber_counts(
        &self,
        channel_ids: &[String],
    ) -> anyhow::Result<HashMap<String, u64>> {
        if channel_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let joined = channel_ids.join(",");
        let params = [("part", "statistics"), ("id", joined.as_str())];
        let response: ChannelListResponse = self.get("channels", &params)?;

        Ok(response
            .items
            .into_iter()
            .map(|channel| {
                let subs = parse_count(channel.statistics.subscriber_count.as_deref());
                (channel.id, subs)
            })
            .collect())
    }

    fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> anyhow::Result<T> {
        let endpoint = format!("{}/{path}", self.base_url);
        let response = self
            .http
            .get(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .with_context(|| format!("GET {endpoint}"))?;

        let status = response.status();
        let raw = response
            .text()
            .with_context(|| format!("read response body from {endpoint}"))?;
        if !status.is_success() {
            let message = parse_error_message(&raw).unwrap_or_else(|| raw.clone());
            anyhow::bail!("youtube api error ({status}): {message}");
        }

        serde_json::from_str(&raw).with_context(|| format!("parse response from {endpoint}"))
    }
}

/// Numeric statistics arrive as JSON strings; absent or unparseable values
/// count as zero.
pub(crate) fn parse_count(value: Option<&str>) -> u64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0)
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<Video>,
}

/// One `/videos` resource, trimmed to the parts the transformer reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub statistics: VideoStatistics,
    #[serde(default)]
    pub content_details: ContentDetails,
    #[serde(default)]
    pub topic_details: TopicDetails,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub published_at: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetails {
    pub duration: Option<String>,
    pub caption: Option<String>,
    pub definition: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDetails {
    #[serde(default)]
    pub topic_categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<Channel>,
}

#[derive(Debug, Clone, Deserialize)]
struct Channel {
    id: String,
    #[serde(default)]
    statistics: ChannelStatistics,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
}
