use super::client::SearXNGClient;
use super::error::{SearchError, ToolError};
use super::types::*;
use rmcp::{
    handler::server::tool::ToolCallContext,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, Error as RmcpError, RoleServer, ServerHandler,
};
use serde::Serialize;
use serde_json::json;

/// The fixed menu of tools this server registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    WebSearch,
    WebSearchImages,
    WebSearchVideos,
    WebSearchNews,
}

impl ToolName {
    pub const ALL: [ToolName; 4] = [
        ToolName::WebSearch,
        ToolName::WebSearchImages,
        ToolName::WebSearchVideos,
        ToolName::WebSearchNews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::WebSearch => "webSearch",
            ToolName::WebSearchImages => "webSearchImages",
            ToolName::WebSearchVideos => "webSearchVideos",
            ToolName::WebSearchNews => "webSearchNews",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }
}

/// Serializes a payload the way every tool returns it.
pub fn to_payload<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| json!({ "error": format!("Failed to encode result: {}", e) }).to_string())
}

#[derive(Debug, Clone)]
pub struct SearXNGServer {
    client: SearXNGClient,
}

#[tool(tool_box)]
impl SearXNGServer {
    pub fn with_client(client: SearXNGClient) -> Self {
        Self { client }
    }

    #[tool(
        name = "webSearch",
        description = "Search the web. Returns page titles, URLs, snippets, source engines, favicons and publish dates."
    )]
    pub async fn web_search(
        &self,
        #[tool(aggr)] params: WebSearchParams,
    ) -> Result<CallToolResult, RmcpError> {
        log::info!("webSearch: {}", params.query);
        let result = match SearchRequest::try_from(params) {
            Ok(request) => self.client.search(request).await,
            Err(e) => Err(e),
        };
        Ok(self.respond(result))
    }

    #[tool(
        name = "webSearchImages",
        description = "Search for images. Returns image URLs, thumbnails, titles and sources."
    )]
    pub async fn web_search_images(
        &self,
        #[tool(aggr)] params: CategorySearchParams,
    ) -> Result<CallToolResult, RmcpError> {
        log::info!("webSearchImages: {}", params.query);
        let result = self.client.search_images(&params.query, params.limit).await;
        Ok(self.respond(result))
    }

    #[tool(
        name = "webSearchVideos",
        description = "Search for videos. Returns video URLs, titles, sources and publish dates."
    )]
    pub async fn web_search_videos(
        &self,
        #[tool(aggr)] params: CategorySearchParams,
    ) -> Result<CallToolResult, RmcpError> {
        log::info!("webSearchVideos: {}", params.query);
        let result = self.client.search_videos(&params.query, params.limit).await;
        Ok(self.respond(result))
    }

    #[tool(
        name = "webSearchNews",
        description = "Search for news. Returns headlines, URLs, publish dates and sources."
    )]
    pub async fn web_search_news(
        &self,
        #[tool(aggr)] params: CategorySearchParams,
    ) -> Result<CallToolResult, RmcpError> {
        log::info!("webSearchNews: {}", params.query);
        let result = self.client.search_news(&params.query, params.limit).await;
        Ok(self.respond(result))
    }

    fn respond<T: Serialize>(&self, result: Result<T, SearchError>) -> CallToolResult {
        match result {
            Ok(response) => CallToolResult::success(vec![Content::text(to_payload(&response))]),
            Err(e) => self.error_result(&ToolError::from(e)),
        }
    }

    /// Returns the error payload for a name outside the registered menu.
    pub fn reject_unknown_tool(&self, name: &str) -> Option<CallToolResult> {
        match ToolName::from_name(name) {
            Some(_) => None,
            None => Some(self.error_result(&ToolError::UnknownTool(name.to_string()))),
        }
    }

    /// Wraps any failure into the `{error, hint}` payload flagged as an error result.
    pub fn error_result(&self, error: &ToolError) -> CallToolResult {
        log::warn!("{}", error);
        let payload = json!({
            "error": error.to_string(),
            "hint": format!(
                "Make sure the SearXNG service is running: {}",
                self.client.base_url()
            ),
        });
        CallToolResult::error(vec![Content::text(to_payload(&payload))])
    }
}

impl ServerHandler for SearXNGServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(format!(
                "Web search backed by the SearXNG instance at {}.\n\nTOOLS:\n- webSearch: general search (query, category, language, timeRange, limit)\n- webSearchImages: image search (query, limit)\n- webSearchVideos: video search (query, limit)\n- webSearchNews: news search (query, limit)\n\nEvery tool returns a JSON document. limit is clamped to 1-20 and defaults to 10. timeRange accepts day, week, month or year; other values are ignored. Failures return {{\"error\", \"hint\"}} with isError set.",
                self.client.base_url()
            )),
        }
    }

    async fn list_tools(
        &self,
        _request: PaginatedRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, RmcpError> {
        Ok(ListToolsResult {
            next_cursor: None,
            tools: Self::tool_box().list(),
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, RmcpError> {
        let name = request.name.to_string();
        if let Some(rejected) = self.reject_unknown_tool(&name) {
            return Ok(rejected);
        }

        let tool_context = ToolCallContext::new(self, request, context);
        match Self::tool_box().call(tool_context).await {
            Ok(result) => Ok(result),
            Err(e) => Ok(self.error_result(&ToolError::InvalidArguments {
                tool: name,
                message: e.message.to_string(),
            })),
        }
    }
}
