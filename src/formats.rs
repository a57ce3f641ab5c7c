use serde::{Deserialize, Serialize};

/// One row of the output dataset. Field order is the column order of the CSV
/// file, and field names are the header names; `video_id` is the stable join
/// key across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub video_id: String,
    pub title: String,
    pub title_len: usize,
    pub desc_len: usize,
    pub emoji_count: usize,
    pub tag_count: usize,
    pub published_hour: u32,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub view_like_ratio: f64,
    pub channel_subs: u64,
    pub has_caption: u8,
    pub definition: String,
    pub topic_categories: String,
    pub url: String,
    pub engagement_rate: f64,
}
