use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::error::SearchError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8888";
pub const DEFAULT_LANGUAGE: &str = "zh-CN";
pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Images,
    Videos,
    News,
    Map,
    Music,
    It,
    Science,
    Files,
    Social,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Images => "images",
            Category::Videos => "videos",
            Category::News => "news",
            Category::Map => "map",
            Category::Music => "music",
            Category::It => "it",
            Category::Science => "science",
            Category::Files => "files",
            Category::Social => "social",
        }
    }
}

impl FromStr for Category {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Category::General),
            "images" => Ok(Category::Images),
            "videos" => Ok(Category::Videos),
            "news" => Ok(Category::News),
            "map" => Ok(Category::Map),
            "music" => Ok(Category::Music),
            "it" => Ok(Category::It),
            "science" => Ok(Category::Science),
            "files" => Ok(Category::Files),
            "social" => Ok(Category::Social),
            other => Err(SearchError::InvalidRequest(format!(
                "unsupported category '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    /// Returns `None` for anything outside day/week/month/year.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "day" => Some(TimeRange::Day),
            "week" => Some(TimeRange::Week),
            "month" => Some(TimeRange::Month),
            "year" => Some(TimeRange::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Day => "day",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
        }
    }
}

/// Clamps a caller supplied limit into `1..=MAX_LIMIT`, defaulting when absent.
pub fn clamp_limit(limit: Option<i64>) -> usize {
    match limit {
        Some(n) => n.clamp(1, MAX_LIMIT as i64) as usize,
        None => DEFAULT_LIMIT,
    }
}

/// A validated search against the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub category: Category,
    pub language: String,
    pub time_range: Option<TimeRange>,
    pub limit: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: Category::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            time_range: None,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_time_range(mut self, time_range: Option<TimeRange>) -> Self {
        self.time_range = time_range;
        self
    }

    pub fn with_limit(mut self, limit: Option<i64>) -> Self {
        self.limit = clamp_limit(limit);
        self
    }
}

impl TryFrom<WebSearchParams> for SearchRequest {
    type Error = SearchError;

    fn try_from(params: WebSearchParams) -> Result<Self, Self::Error> {
        let category = match params.category.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(c) => c.parse()?,
            None => Category::default(),
        };
        let time_range = params.time_range.as_deref().and_then(|t| {
            let parsed = TimeRange::parse(t);
            if parsed.is_none() {
                log::debug!("Ignoring unrecognized time range: {}", t);
            }
            parsed
        });
        let language = params
            .language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        Ok(SearchRequest::new(params.query)
            .with_category(category)
            .with_language(language)
            .with_time_range(time_range)
            .with_limit(params.limit))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    pub title: String,
    pub url: String,
    pub content: String,
    pub snippet: String,
    pub engine: String,
    pub category: String,
    pub score: f64,
    pub is_image: bool,
    pub thumbnail: Option<String>,
    pub favicon: Option<String>,
    pub published_date: Option<String>,
}

impl NormalizedResult {
    /// Resolves one raw aggregator record. Fields that are missing or carry
    /// the wrong JSON type fall back to empty/zero/null.
    pub fn from_raw(item: &Value) -> Self {
        let text = |key: &str| {
            item.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let nullable = |key: &str| {
            item.get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };

        let content = text("content");
        let thumbnail = nullable("img_src");

        Self {
            title: text("title"),
            url: text("url"),
            snippet: content.clone(),
            content,
            engine: text("engine"),
            category: text("category"),
            score: item.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0),
            is_image: thumbnail.is_some(),
            thumbnail,
            favicon: nullable("favicon"),
            published_date: nullable("publishedDate"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMeta {
    pub search_url: String,
    pub engines: Vec<Value>,
    pub answered: Vec<Value>,
    pub infoboxes: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub category: Category,
    pub language: String,
    pub total_results: usize,
    pub results: Vec<NormalizedResult>,
    pub meta: SearchMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    pub content: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSearchResponse {
    pub query: String,
    pub total_results: usize,
    pub images: Vec<ImageResult>,
}

/// Shared projection for video and news hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source: String,
    pub published_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSearchResponse {
    pub query: String,
    pub total_results: usize,
    pub videos: Vec<ArticleResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsSearchResponse {
    pub query: String,
    pub total_results: usize,
    pub news: Vec<ArticleResult>,
}

fn default_limit() -> Option<i64> {
    Some(DEFAULT_LIMIT as i64)
}

/// Accepts integral floats such as `5.0`; fractions round to the nearest integer.
fn deserialize_limit<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let limit = Option::<f64>::deserialize(deserializer)?;
    Ok(limit.filter(|n| n.is_finite()).map(|n| n.round() as i64))
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchParams {
    #[schemars(description = "Search keywords")]
    pub query: String,
    #[schemars(
        description = "Search category (general, images, videos, news, map, music, it, science, files, social). Default: general"
    )]
    pub category: Option<String>,
    #[schemars(description = "Result language, e.g. zh-CN or en. Default: zh-CN")]
    pub language: Option<String>,
    #[schemars(description = "Time range filter (day, week, month, year)")]
    pub time_range: Option<String>,
    #[serde(default = "default_limit", deserialize_with = "deserialize_limit")]
    #[schemars(with = "Option<f64>")]
    #[schemars(description = "Number of results to return (1-20)", range(min = 1, max = 20))]
    pub limit: Option<i64>,
}

/// Parameters shared by the image, video and news tools.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CategorySearchParams {
    #[schemars(description = "Search keywords")]
    pub query: String,
    #[serde(default = "default_limit", deserialize_with = "deserialize_limit")]
    #[schemars(with = "Option<f64>")]
    #[schemars(description = "Number of results to return (1-20)", range(min = 1, max = 20))]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct SearXNGConfig {
    pub base_url: String,
    pub max_limit: usize,
    pub default_language: String,
}

impl SearXNGConfig {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            max_limit: MAX_LIMIT,
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}
