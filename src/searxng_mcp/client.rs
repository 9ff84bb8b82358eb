use super::error::SearchError;
use super::filters::{is_image_result, is_video_result, to_article, to_image};
use super::types::*;
use serde_json::Value;
use url::Url;

const LOOPBACK: &str = "127.0.0.1";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

#[derive(Debug, Clone)]
pub struct SearXNGClient {
    client: reqwest::Client,
    config: SearXNGConfig,
}

impl SearXNGClient {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self::with_config(SearXNGConfig::new(base_url))
    }

    pub fn with_config(config: SearXNGConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, SearchError> {
        let raw = format!("{}/{}", self.config.base_url, path);
        Url::parse(&raw).map_err(|e| {
            SearchError::InvalidRequest(format!("invalid SearXNG URL '{}': {}", raw, e))
        })
    }

    pub fn search_url(&self, request: &SearchRequest) -> Result<Url, SearchError> {
        let mut url = self.endpoint("search")?;
        {
            let mut params = url.query_pairs_mut();
            params
                .append_pair("q", &request.query)
                .append_pair("format", "json")
                .append_pair("category", request.category.as_str())
                .append_pair("language", &request.language);
            if let Some(time_range) = request.time_range {
                params.append_pair("time_range", time_range.as_str());
            }
        }
        Ok(url)
    }

    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        if request.query.trim().is_empty() {
            return Err(SearchError::InvalidRequest(
                "search query cannot be empty".to_string(),
            ));
        }

        let limit = request.limit.clamp(1, self.config.max_limit);
        let url = self.search_url(&request)?;
        log::debug!("Querying SearXNG: {}", url);

        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/json")
            .header("X-Forwarded-For", LOOPBACK)
            .header("X-Real-IP", LOOPBACK)
            .header("User-Agent", BROWSER_USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        let json_response: Value = serde_json::from_str(&body)?;

        let results: Vec<NormalizedResult> = json_response
            .get("results")
            .and_then(|r| r.as_array())
            .map(|items| {
                items
                    .iter()
                    .take(limit)
                    .map(NormalizedResult::from_raw)
                    .collect()
            })
            .unwrap_or_default();

        let list = |value: Option<&Value>| -> Vec<Value> {
            value
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default()
        };

        let meta = SearchMeta {
            search_url: url.to_string(),
            engines: list(json_response.get("query").and_then(|q| q.get("engines"))),
            answered: list(json_response.get("answers")),
            infoboxes: list(json_response.get("infoboxes")),
        };

        log::debug!(
            "SearXNG returned {} results for '{}'",
            results.len(),
            request.query
        );

        Ok(SearchResponse {
            query: request.query,
            category: request.category,
            language: request.language,
            total_results: results.len(),
            results,
            meta,
        })
    }

    pub async fn search_images(
        &self,
        query: &str,
        limit: Option<i64>,
    ) -> Result<ImageSearchResponse, SearchError> {
        let response = self
            .search(self.category_request(query, Category::Images, limit))
            .await?;

        let images: Vec<ImageResult> = response
            .results
            .iter()
            .filter(|r| is_image_result(r))
            .map(to_image)
            .collect();

        Ok(ImageSearchResponse {
            query: query.to_string(),
            total_results: images.len(),
            images,
        })
    }

    pub async fn search_videos(
        &self,
        query: &str,
        limit: Option<i64>,
    ) -> Result<VideoSearchResponse, SearchError> {
        let response = self
            .search(self.category_request(query, Category::Videos, limit))
            .await?;

        let videos: Vec<ArticleResult> = response
            .results
            .iter()
            .filter(|r| is_video_result(r))
            .map(to_article)
            .collect();

        Ok(VideoSearchResponse {
            query: query.to_string(),
            total_results: videos.len(),
            videos,
        })
    }

    pub async fn search_news(
        &self,
        query: &str,
        limit: Option<i64>,
    ) -> Result<NewsSearchResponse, SearchError> {
        let response = self
            .search(self.category_request(query, Category::News, limit))
            .await?;

        let news: Vec<ArticleResult> = response.results.iter().map(to_article).collect();

        Ok(NewsSearchResponse {
            query: query.to_string(),
            total_results: news.len(),
            news,
        })
    }

    /// Probes `<base>/config`. Any failure reads as unavailable.
    pub async fn check_health(&self) -> bool {
        let url = match self.endpoint("config") {
            Ok(url) => url,
            Err(e) => {
                log::warn!("SearXNG health check skipped: {}", e);
                return false;
            }
        };

        match self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                log::debug!("SearXNG health check failed: {}", e);
                false
            }
        }
    }

    fn category_request(&self, query: &str, category: Category, limit: Option<i64>) -> SearchRequest {
        SearchRequest::new(query)
            .with_category(category)
            .with_language(self.config.default_language.clone())
            .with_limit(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_results(server: &MockServer, body: Value) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_search_url_includes_recognized_time_range() {
        let client = SearXNGClient::new("http://localhost:8888/");
        let request = SearchRequest::new("rust lang")
            .with_category(Category::News)
            .with_language("en")
            .with_time_range(TimeRange::parse("week"));

        let url = client.search_url(&request).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/search");
        assert!(pairs.contains(&("q".to_string(), "rust lang".to_string())));
        assert!(pairs.contains(&("format".to_string(), "json".to_string())));
        assert!(pairs.contains(&("category".to_string(), "news".to_string())));
        assert!(pairs.contains(&("language".to_string(), "en".to_string())));
        assert!(pairs.contains(&("time_range".to_string(), "week".to_string())));
    }

    #[test]
    fn test_search_url_omits_unrecognized_time_range() {
        let client = SearXNGClient::new("http://localhost:8888");
        for value in ["decade", "", "Day", "hour"] {
            let request = SearchRequest::new("q").with_time_range(TimeRange::parse(value));
            let url = client.search_url(&request).unwrap();
            assert!(!url.as_str().contains("time_range"), "{} leaked into {}", value, url);
        }
    }

    #[tokio::test]
    async fn test_search_sends_expected_query_and_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "test query"))
            .and(query_param("format", "json"))
            .and(query_param("category", "general"))
            .and(query_param("language", "zh-CN"))
            .and(header("Accept", "application/json"))
            .and(header("X-Forwarded-For", "127.0.0.1"))
            .and(header("X-Real-IP", "127.0.0.1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = SearXNGClient::new(server.uri());
        let response = client.search(SearchRequest::new("test query")).await.unwrap();

        assert_eq!(response.total_results, 0);
        assert!(response.results.is_empty());
        assert!(response.meta.engines.is_empty());
        assert!(response.meta.answered.is_empty());
        assert!(response.meta.infoboxes.is_empty());
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let server = MockServer::start().await;
        let items: Vec<Value> = (0..25)
            .map(|i| json!({"title": format!("Result {}", i), "url": format!("https://example.com/{}", i)}))
            .collect();
        mount_results(&server, json!({ "results": items })).await;

        let client = SearXNGClient::new(server.uri());

        for limit in [1, 3, 10, 20] {
            let response = client
                .search(SearchRequest::new("query").with_limit(Some(limit)))
                .await
                .unwrap();
            assert_eq!(response.results.len(), limit as usize);
            assert_eq!(response.total_results, limit as usize);
        }

        let response = client
            .search(SearchRequest::new("query").with_limit(Some(99)))
            .await
            .unwrap();
        assert_eq!(response.results.len(), 20);
        assert_eq!(response.results[0].title, "Result 0");
    }

    #[tokio::test]
    async fn test_search_returns_fewer_than_limit_when_upstream_is_short() {
        let server = MockServer::start().await;
        mount_results(
            &server,
            json!({"results": [{"title": "Only", "url": "https://example.com"}]}),
        )
        .await;

        let client = SearXNGClient::new(server.uri());
        let response = client
            .search(SearchRequest::new("query").with_limit(Some(10)))
            .await
            .unwrap();

        assert_eq!(response.total_results, 1);
    }

    #[tokio::test]
    async fn test_search_collects_metadata() {
        let server = MockServer::start().await;
        mount_results(
            &server,
            json!({
                "query": {"engines": ["google", "bing"]},
                "answers": ["42"],
                "infoboxes": [{"infobox": "Rust"}],
                "results": [{
                    "title": "Rust",
                    "url": "https://www.rust-lang.org",
                    "content": "A language",
                    "engine": "google",
                    "category": "general",
                    "score": 2.0,
                    "favicon": "https://www.rust-lang.org/favicon.ico"
                }]
            }),
        )
        .await;

        let client = SearXNGClient::new(format!("{}/", server.uri()));
        let response = client.search(SearchRequest::new("rust")).await.unwrap();

        assert_eq!(response.query, "rust");
        assert_eq!(response.category, Category::General);
        assert_eq!(response.language, "zh-CN");
        assert_eq!(response.meta.engines, vec![json!("google"), json!("bing")]);
        assert_eq!(response.meta.answered, vec![json!("42")]);
        assert_eq!(response.meta.infoboxes.len(), 1);
        assert!(response.meta.search_url.starts_with(&format!("{}/search?", server.uri())));

        let first = &response.results[0];
        assert_eq!(first.snippet, "A language");
        assert_eq!(first.score, 2.0);
        assert_eq!(
            first.favicon.as_deref(),
            Some("https://www.rust-lang.org/favicon.ico")
        );
        assert!(!first.is_image);
    }

    #[tokio::test]
    async fn test_search_handles_missing_results_list() {
        let server = MockServer::start().await;
        mount_results(&server, json!({"query": "rust", "number_of_results": 0})).await;

        let client = SearXNGClient::new(server.uri());
        let response = client.search(SearchRequest::new("rust")).await.unwrap();

        assert!(response.results.is_empty());
        assert!(response.meta.engines.is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_empty_query_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = SearXNGClient::new(server.uri());
        let err = client.search(SearchRequest::new("   ")).await.unwrap_err();

        assert!(matches!(err, SearchError::InvalidRequest(_)));
        assert!(err.to_string().starts_with("Search failed:"));
    }

    #[tokio::test]
    async fn test_search_reports_upstream_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = SearXNGClient::new(server.uri());
        let err = client.search(SearchRequest::new("rust")).await.unwrap_err();

        match &err {
            SearchError::Upstream { status, reason } => {
                assert_eq!(*status, 429);
                assert_eq!(reason, "Too Many Requests");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
        assert_eq!(err.to_string(), "Search failed: HTTP 429: Too Many Requests");
    }

    #[tokio::test]
    async fn test_search_reports_malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let client = SearXNGClient::new(server.uri());
        let err = client.search(SearchRequest::new("rust")).await.unwrap_err();

        assert!(matches!(err, SearchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_search_reports_transport_failure() {
        let client = SearXNGClient::new("http://127.0.0.1:1");
        let err = client.search(SearchRequest::new("rust")).await.unwrap_err();

        assert!(matches!(err, SearchError::Transport(_)));
        assert!(err.to_string().starts_with("Search failed:"));
    }

    #[tokio::test]
    async fn test_search_images_filters_and_projects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("category", "images"))
            .and(query_param("language", "zh-CN"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"title": "Thumb", "url": "http://x.com/page", "img_src": "http://x.com/t.jpg", "engine": "bing images"},
                    {"title": "Direct", "url": "http://x.com/a.png", "content": "png", "engine": "google images"},
                    {"title": "Page", "url": "http://x.com/a.html", "engine": "google images"}
                ]
            })))
            .mount(&server)
            .await;

        let client = SearXNGClient::new(server.uri());
        let response = client.search_images("cats", None).await.unwrap();

        assert_eq!(response.query, "cats");
        assert_eq!(response.total_results, 2);
        assert_eq!(response.images[0].thumbnail, "http://x.com/t.jpg");
        assert_eq!(response.images[0].source, "bing images");
        assert_eq!(response.images[1].thumbnail, "http://x.com/a.png");
        assert_eq!(response.images[1].content, "png");
    }

    #[tokio::test]
    async fn test_search_videos_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("category", "videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"title": "A", "url": "http://youtube.com/1", "content": "c", "engine": "e"},
                    {"title": "B", "url": "http://example.com/x", "content": "d", "engine": "e"}
                ]
            })))
            .mount(&server)
            .await;

        let client = SearXNGClient::new(server.uri());
        let response = client.search_videos("clips", Some(10)).await.unwrap();

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "query": "clips",
                "totalResults": 1,
                "videos": [{
                    "title": "A",
                    "url": "http://youtube.com/1",
                    "snippet": "c",
                    "source": "e",
                    "publishedDate": null
                }]
            })
        );
    }

    #[tokio::test]
    async fn test_search_news_keeps_every_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("category", "news"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"title": "One", "url": "https://news.example.com/1", "content": "first", "engine": "bing news", "publishedDate": "2024-05-01T00:00:00"},
                    {"title": "Two", "url": "https://news.example.com/2"}
                ]
            })))
            .mount(&server)
            .await;

        let client = SearXNGClient::new(server.uri());
        let response = client.search_news("headlines", Some(1)).await.unwrap();

        assert_eq!(response.total_results, 1);
        assert_eq!(response.news[0].snippet, "first");
        assert_eq!(response.news[0].source, "bing news");
        assert_eq!(
            response.news[0].published_date.as_deref(),
            Some("2024-05-01T00:00:00")
        );
    }

    #[tokio::test]
    async fn test_check_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"engines": []})))
            .mount(&server)
            .await;

        assert!(SearXNGClient::new(server.uri()).check_health().await);
    }

    #[tokio::test]
    async fn test_check_health_false_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(!SearXNGClient::new(server.uri()).check_health().await);
    }

    #[tokio::test]
    async fn test_check_health_false_when_unreachable() {
        assert!(!SearXNGClient::new("http://127.0.0.1:1").check_health().await);
    }
}
