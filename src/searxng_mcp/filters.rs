use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::types::{ArticleResult, ImageResult, NormalizedResult};

static IMAGE_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp)").expect("valid image regex"));

pub const VIDEO_DOMAINS: [&str; 5] = [
    "youtube.com",
    "vimeo.com",
    "bilibili.com",
    "youku.com",
    "qq.com",
];

pub fn is_image_result(result: &NormalizedResult) -> bool {
    result.thumbnail.is_some() || IMAGE_EXTENSION.is_match(&result.url)
}

pub fn is_video_result(result: &NormalizedResult) -> bool {
    if result.category == "video" {
        return true;
    }

    Url::parse(&result.url)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_ascii_lowercase()))
        .map(|host| VIDEO_DOMAINS.iter().any(|domain| host.contains(domain)))
        .unwrap_or(false)
}

pub fn to_image(result: &NormalizedResult) -> ImageResult {
    ImageResult {
        title: result.title.clone(),
        url: result.url.clone(),
        thumbnail: result
            .thumbnail
            .clone()
            .unwrap_or_else(|| result.url.clone()),
        content: result.content.clone(),
        source: result.engine.clone(),
    }
}

pub fn to_article(result: &NormalizedResult) -> ArticleResult {
    ArticleResult {
        title: result.title.clone(),
        url: result.url.clone(),
        snippet: result.content.clone(),
        source: result.engine.clone(),
        published_date: result.published_date.clone(),
    }
}
