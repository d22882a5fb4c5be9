use crate::error::GenerationError;
use crate::generation::Tool;
use crate::models::PaperSummary;
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use url::Url;

const ARXIV_API: &str = "http://export.arxiv.org/api/query";
const DEFAULT_MAX_RESULTS: usize = 3;

/// Thin client over the arXiv Atom API. Used only as a generation-time
/// fallback; never part of the retrieval path.
pub struct ArxivClient {
    client: reqwest::Client,
    api_base: String,
    max_results: usize,
}

impl Default for ArxivClient {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: ARXIV_API.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl ArxivClient {
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub async fn search(&self, topic: &str) -> Result<Vec<PaperSummary>, GenerationError> {
        let url = Url::parse_with_params(
            &self.api_base,
            &[
                ("search_query", format!("all:{topic}")),
                ("max_results", self.max_results.to_string()),
                ("sortBy", "relevance".to_string()),
            ],
        )
        .map_err(|error| GenerationError::Tool {
            name: "arxiv_search".to_string(),
            details: error.to_string(),
        })?;

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(GenerationError::Tool {
                name: "arxiv_search".to_string(),
                details: format!("arxiv api returned {}", response.status()),
            });
        }

        let feed = response.text().await?;
        parse_atom_feed(&feed)
    }
}

/// Pulls entries out of the Atom feed. The feed shape is small and fixed, so
/// a couple of regexes beat carrying a full XML parser.
pub fn parse_atom_feed(feed: &str) -> Result<Vec<PaperSummary>, GenerationError> {
    let entry_re = Regex::new(r"(?s)<entry>(.*?)</entry>")?;
    let title_re = Regex::new(r"(?s)<title>(.*?)</title>")?;
    let summary_re = Regex::new(r"(?s)<summary>(.*?)</summary>")?;
    let author_re = Regex::new(r"(?s)<name>(.*?)</name>")?;
    let pdf_re = Regex::new(r#"<link[^>]*title="pdf"[^>]*href="([^"]*)""#)?;

    let papers = entry_re
        .captures_iter(feed)
        .filter_map(|entry| {
            let body = entry.get(1)?.as_str();
            let title = title_re
                .captures(body)
                .and_then(|c| c.get(1))
                .map(|m| unescape_xml(m.as_str().trim()))?;
            let summary = summary_re
                .captures(body)
                .and_then(|c| c.get(1))
                .map(|m| unescape_xml(m.as_str().trim()))
                .unwrap_or_default();
            let authors = author_re
                .captures_iter(body)
                .filter_map(|c| c.get(1).map(|m| unescape_xml(m.as_str().trim())))
                .collect();
            let pdf_url = pdf_re
                .captures(body)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();

            Some(PaperSummary {
                title,
                authors,
                summary,
                pdf_url,
            })
        })
        .collect();

    Ok(papers)
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

pub fn format_papers(papers: &[PaperSummary]) -> String {
    papers
        .iter()
        .map(|paper| {
            format!(
                "Title: {}\nAuthors: {}\nSummary: {}\nPDF URL: {}\n",
                paper.title,
                paper.authors.join(", "),
                paper.summary,
                paper.pdf_url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The paper-search tool the generator may call when the supplied context is
/// insufficient.
pub struct ArxivSearchTool {
    client: ArxivClient,
}

impl ArxivSearchTool {
    pub fn new(client: ArxivClient) -> Self {
        Self { client }
    }
}

impl Default for ArxivSearchTool {
    fn default() -> Self {
        Self::new(ArxivClient::default())
    }
}

#[async_trait]
impl Tool for ArxivSearchTool {
    fn name(&self) -> &str {
        "arxiv_search"
    }

    fn description(&self) -> &str {
        "Searches arXiv for research papers on a topic. Returns title, authors, summary, and PDF URL."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search topic or description."
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, args: &Value) -> Result<String, GenerationError> {
        let topic = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| GenerationError::Tool {
                name: "arxiv_search".to_string(),
                details: "missing required argument: query".to_string(),
            })?;

        let papers = self.client.search(topic).await?;
        if papers.is_empty() {
            return Ok(format!("No arXiv papers found for '{topic}'."));
        }
        Ok(format_papers(&papers))
    }
}
