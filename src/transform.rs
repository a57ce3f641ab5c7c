use std::collections::HashMap;

use anyhow::Context as _;
use chrono::{DateTime, Timelike as _, Utc};
use regex::Regex;

use crate::config::RunConfig;
use crate::formats::DatasetRecord;
use crate::youtube::{Video, parse_count};

/// Raw topic-category terms of the original food-only collection. The filter
/// is off by default and only applied when explicitly toggled on.
const TOPIC_FILTER_TERMS: [&str; 4] = ["Food", "Cooking", "Cuisine", "Beverage"];

#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub target_lang: whatlang::Lang,
    pub max_duration_secs: f64,
    pub topic_filter: bool,
}

impl TransformOptions {
    pub fn from_config(config: &RunConfig) -> anyhow::Result<Self> {
        let target_lang = detection_lang(&config.language).ok_or_else(|| {
            anyhow::anyhow!("no language detector support for {:?}", config.language)
        })?;

        Ok(Self {
            target_lang,
            max_duration_secs: config.max_duration_secs,
            topic_filter: config.topic_filter,
        })
    }
}

/// Map an ISO 639-1 search-language code to the detector's language.
pub fn detection_lang(code: &str) -> Option<whatlang::Lang> {
    use whatlang::Lang;

    match code {
        "en" => Some(Lang::Eng),
        "es" => Some(Lang::Spa),
        "fr" => Some(Lang::Fra),
        "de" => Some(Lang::Deu),
        "it" => Some(Lang::Ita),
        "pt" => Some(Lang::Por),
        "nl" => Some(Lang::Nld),
        "ru" => Some(Lang::Rus),
        "ja" => Some(Lang::Jpn),
        "ko" => Some(Lang::Kor),
        "hi" => Some(Lang::Hin),
        "ar" => Some(Lang::Ara),
        "tr" => Some(Lang::Tur),
        _ => None,
    }
}

/// Run the filter chain and derive one dataset row.
///
/// `Ok(None)` means the video was dropped by a filter (wrong language,
/// missing/unparseable duration, too long, or outside the optional topic
/// filter). Only a malformed publish timestamp is an error.
pub fn build_record(
    video: &Video,
    subscriber_counts: &HashMap<String, u64>,
    options: &TransformOptions,
) -> anyhow::Result<Option<DatasetRecord>> {
    let snippet = &video.snippet;
    let title = snippet.title.as_str();

    if !is_wanted_language(title, options.target_lang) {
        tracing::debug!(video_id = %video.id, "title not in target language; skipping");
        return Ok(None);
    }

    let Some(raw_duration) = video.content_details.duration.as_deref() else {
        // Some resources come back without a duration; treat as malformed.
        tracing::debug!(video_id = %video.id, "missing duration; skipping");
        return Ok(None);
    };
    let Some(duration_secs) = parse_iso8601_duration(raw_duration) else {
        tracing::debug!(video_id = %video.id, raw_duration, "unparseable duration; skipping");
        return Ok(None);
    };
    if duration_secs > options.max_duration_secs {
        return Ok(None);
    }

    let raw_topics = &video.topic_details.topic_categories;
    if options.topic_filter && !matches_topic_filter(raw_topics) {
        return Ok(None);
    }

    let published = DateTime::parse_from_rfc3339(&snippet.published_at)
        .with_context(|| format!("parse publish timestamp for video {}", video.id))?;

    let stats = &video.statistics;
    let views = parse_count(stats.view_count.as_deref());
    let likes = parse_count(stats.like_count.as_deref());
    let comments = parse_count(stats.comment_count.as_deref());

    let view_like_ratio = if views > 0 {
        round_to(likes as f64 / views as f64, 4)
    } else {
        0.0
    };
    let engagement_rate = if views > 0 {
        round_to((likes as f64 + comments as f64 * 3.0) / views as f64 * 100.0, 2)
    } else {
        0.0
    };

    Ok(Some(DatasetRecord {
        video_id: video.id.clone(),
        title: title.to_owned(),
        title_len: title.chars().count(),
        desc_len: snippet.description.chars().count(),
        emoji_count: emoji_count(title),
        tag_count: snippet.tags.len(),
        published_hour: published.with_timezone(&Utc).hour(),
        views,
        likes,
        comments,
        view_like_ratio,
        channel_subs: subscriber_counts
            .get(&snippet.channel_id)
            .copied()
            .unwrap_or(0),
        has_caption: u8::from(video.content_details.caption.as_deref() == Some("true")),
        definition: video.content_details.definition.clone().unwrap_or_default(),
        topic_categories: clean_topic_urls(raw_topics),
        url: format!("https://www.youtube.com/shorts/{}", video.id),
        engagement_rate,
    }))
}

fn is_wanted_language(text: &str, target: whatlang::Lang) -> bool {
    match whatlang::detect(text) {
        Some(info) => info.lang() == target,
        None => false,
    }
}

/// Parse an ISO-8601 duration (the `P…T…` form YouTube emits) to seconds.
/// Year and month designators are calendar-dependent and rejected.
pub fn parse_iso8601_duration(raw: &str) -> Option<f64> {
    let rest = raw.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    if date_part.is_empty() && time_part.is_none() {
        return None;
    }

    let date_secs = accumulate(date_part, &[('W', 604_800.0), ('D', 86_400.0)])?;
    let time_secs = match time_part {
        Some("") => return None,
        Some(part) => accumulate(part, &[('H', 3_600.0), ('M', 60.0), ('S', 1.0)])?,
        None => 0.0,
    };

    Some(date_secs + time_secs)
}

fn accumulate(part: &str, units: &[(char, f64)]) -> Option<f64> {
    let mut total = 0.0;
    let mut number = String::new();
    let mut next_unit = 0;

    for c in part.chars() {
        if c.is_ascii_digit() || c == '.' || c == ',' {
            number.push(if c == ',' { '.' } else { c });
            continue;
        }

        let pos = units.iter().position(|(unit, _)| *unit == c)?;
        // Designators must appear in order and each needs a leading number.
        if pos < next_unit || number.is_empty() {
            return None;
        }
        total += number.parse::<f64>().ok()? * units[pos].1;
        number.clear();
        next_unit = pos + 1;
    }

    if number.is_empty() { Some(total) } else { None }
}

/// Reduce Wikipedia topic URLs to plain category names: last path segment,
/// underscores to spaces, parenthesized disambiguators stripped.
pub fn clean_topic_urls(urls: &[String]) -> String {
    if urls.is_empty() {
        return String::new();
    }

    let parens = Regex::new(r"\s*\([^)]*\)").expect("valid regex");

    let names: Vec<String> = urls
        .iter()
        .map(|url| {
            let name = url.rsplit('/').next().unwrap_or("").replace('_', " ");
            parens.replace_all(&name, "").trim().to_owned()
        })
        .collect();

    names.join(",")
}

fn matches_topic_filter(urls: &[String]) -> bool {
    urls.iter()
        .any(|url| TOPIC_FILTER_TERMS.iter().any(|term| url.contains(term)))
}

/// Count of title characters that are neither word characters, whitespace,
/// commas nor periods; a cheap proxy for emoji and decoration density.
fn emoji_count(title: &str) -> usize {
    let pattern = Regex::new(r"[^\w\s,.]").expect("valid regex");
    pattern.find_iter(title).count()
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
