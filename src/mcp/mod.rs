//! MCP server implementation for rfcindex.
//!
//! Exposes lookup, resolution and search as MCP tools for AI editors.

use std::borrow::Cow;

use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, ErrorCode, ErrorData as McpError, ServerCapabilities, ServerInfo,
    },
    schemars, tool, tool_handler, tool_router,
    transport::stdio,
};
use serde::Deserialize;

use crate::commands::{self, Output};
use crate::config::Config;
use crate::document::DocType;
use crate::query::{Mode, Outcome};
use crate::search::AuthorQuery;

/// Parameters for `lookup_documents` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LookupParams {
    #[schemars(description = "Document type: RFC, STD, BCP or FYI")]
    pub doc_type: String,
    #[schemars(description = "Document numbers")]
    pub numbers: Vec<u32>,
    #[schemars(
        description = "lookup (default), current, obsoleting, aliases or see_also"
    )]
    pub mode: Option<String>,
}

/// Parameters for `search_rfcs` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "What to match: author (default), title or keyword")]
    pub field: Option<String>,
    #[schemars(description = "Terms that must all match; `*` is a wildcard")]
    pub terms: Vec<String>,
}

fn invalid(message: String) -> McpError {
    McpError {
        code: ErrorCode::INVALID_PARAMS,
        message: Cow::from(message),
        data: None,
    }
}

fn internal(context: &str, err: &anyhow::Error) -> McpError {
    McpError {
        code: ErrorCode::INTERNAL_ERROR,
        message: Cow::from(format!("{context}: {err}")),
        data: None,
    }
}

fn parse_mode(mode: Option<&str>) -> Result<Mode, McpError> {
    match mode.unwrap_or("lookup") {
        "lookup" => Ok(Mode::Lookup),
        "current" => Ok(Mode::Current),
        "obsoleting" => Ok(Mode::Obsoleting),
        "aliases" => Ok(Mode::Aliases),
        "see_also" => Ok(Mode::SeeAlso),
        other => Err(invalid(format!("Unknown mode '{other}'"))),
    }
}

fn respond(outcome: &Outcome) -> Result<CallToolResult, McpError> {
    let mirror = Config::load()
        .map_err(|e| internal("Failed to load config", &e))?
        .mirror();
    let text = commands::render(outcome, Output::Json, &mirror)
        .map_err(|e| internal("Failed to render result", &e))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// MCP server exposing rfcindex tools.
#[derive(Clone)]
pub struct RfcIndexServer {
    tool_router: ToolRouter<Self>,
}

impl Default for RfcIndexServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl RfcIndexServer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Look up RFC, STD, BCP or FYI documents by number, optionally \
                          following updates, obsolescence, aliases or see-also references")]
    async fn lookup_documents(
        &self,
        Parameters(params): Parameters<LookupParams>,
    ) -> Result<CallToolResult, McpError> {
        let doc_type: DocType = params
            .doc_type
            .to_uppercase()
            .parse()
            .map_err(|e| invalid(format!("{e}")))?;
        let mode = parse_mode(params.mode.as_deref())?;

        let outcome = commands::resolve(doc_type, &params.numbers, mode)
            .map_err(|e| internal("Lookup failed", &e))?;
        respond(&outcome)
    }

    #[tool(description = "Search RFCs by author, title or keyword")]
    async fn search_rfcs(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = match params.field.as_deref().unwrap_or("author") {
            "author" => commands::author(&AuthorQuery::names(params.terms)),
            "title" => commands::title(&params.terms),
            "keyword" => commands::keyword(&params.terms),
            other => return Err(invalid(format!("Unknown search field '{other}'"))),
        }
        .map_err(|e| internal("Search failed", &e))?;
        respond(&outcome)
    }
}

#[tool_handler]
impl ServerHandler for RfcIndexServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "rfcindex answers questions about IETF documents from a local index. \
                Use lookup_documents to fetch documents by number or follow their \
                relationships, and search_rfcs to find RFCs by author, title or keyword."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Start the MCP server with stdio transport.
///
/// # Errors
///
/// Returns an error if the server fails to start or encounters a fatal error.
pub async fn serve() -> anyhow::Result<()> {
    let server = RfcIndexServer::new();
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_by_name() {
        assert_eq!(parse_mode(None).unwrap(), Mode::Lookup);
        assert_eq!(parse_mode(Some("see_also")).unwrap(), Mode::SeeAlso);
        assert!(parse_mode(Some("newest")).is_err());
    }
}
