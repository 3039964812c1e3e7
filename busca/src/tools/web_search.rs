//! Web search tool for querying the internet.
//!
//! The tool maps a free-text query to free-text results. It is best-effort:
//! an empty result page is reported as text, not as an error, so the agent
//! can rephrase and try again.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::tool::{Tool, ToolError};

/// Text returned when a search yields nothing.
pub const NO_RESULTS: &str = "Nenhum resultado encontrado.";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

static DDG_LINK_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a\s([^>]*class=['"]result-link['"][^>]*)>(.*?)</a>"#).ok()
});
static DDG_SNIPPET_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?s)class=['"]result-snippet['"][^>]*>(.*?)</td>"#).ok());
static HREF_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"href=['"]([^'"]+)['"]"#).ok());
static RSS_ITEM_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<item>.*?<title>(.*?)</title>.*?<link>(.*?)</link>.*?<description>(.*?)</description>.*?</item>",
    )
    .ok()
});
static TAG_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]*>").ok());

/// Supported search engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    /// `DuckDuckGo` Lite HTML interface.
    #[default]
    DuckDuckGo,
    /// Bing RSS feed.
    Bing,
}

/// Generic web search tool with configurable backend.
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    /// Maximum number of results to return.
    pub max_results: usize,
    /// Search engine to use.
    pub engine: SearchEngine,
    client: reqwest::Client,
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self {
            max_results: Self::DEFAULT_MAX_RESULTS,
            engine: SearchEngine::default(),
            client: reqwest::Client::new(),
        }
    }
}

/// Arguments for web search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchArgs {
    /// The search query to perform.
    pub query: String,
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Title of the result.
    pub title: String,
    /// URL of the result.
    pub link: String,
    /// Description/snippet of the result.
    pub description: String,
}

impl WebSearchTool {
    /// Default number of results kept per query.
    pub const DEFAULT_MAX_RESULTS: usize = 5;

    /// Create a new web search tool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tool whose HTTP requests time out after `timeout_secs`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ToolError::execution(e.to_string()))?;
        Ok(Self {
            client,
            ..Self::default()
        })
    }

    /// Set maximum results.
    #[must_use]
    pub const fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set search engine.
    #[must_use]
    pub const fn with_engine(mut self, engine: SearchEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Run a search and return the formatted results.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] when the search engine cannot be
    /// reached or answers with a non-success status.
    pub async fn search(&self, query: &str) -> Result<String, ToolError> {
        let results = match self.engine {
            SearchEngine::DuckDuckGo => self.search_duckduckgo(query).await?,
            SearchEngine::Bing => self.search_bing(query).await?,
        };
        debug!(engine = ?self.engine, %query, hits = results.len(), "web search finished");
        Ok(Self::format_results(&results))
    }

    /// Render results as plain text blocks.
    fn format_results(results: &[SearchResult]) -> String {
        if results.is_empty() {
            return NO_RESULTS.to_owned();
        }

        results
            .iter()
            .map(|r| {
                if r.description.is_empty() {
                    format!("{}\n{}", r.title, r.link)
                } else {
                    format!("{}\n{}\n{}", r.title, r.link, r.description)
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    async fn fetch(&self, url: &str) -> Result<String, ToolError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| ToolError::execution(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::execution(format!(
                "Search engine answered HTTP {status}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ToolError::execution(format!("Failed to read response: {e}")))
    }

    /// Perform `DuckDuckGo` search using lite HTML interface.
    async fn search_duckduckgo(&self, query: &str) -> Result<Vec<SearchResult>, ToolError> {
        let url = format!(
            "https://lite.duckduckgo.com/lite/?q={}",
            urlencoding::encode(query)
        );
        let html = self.fetch(&url).await?;
        Ok(parse_duckduckgo_html(&html, self.max_results))
    }

    /// Perform Bing search using RSS feed.
    async fn search_bing(&self, query: &str) -> Result<Vec<SearchResult>, ToolError> {
        let url = format!(
            "https://www.bing.com/search?q={}&format=rss",
            urlencoding::encode(query)
        );
        let xml = self.fetch(&url).await?;
        Ok(parse_rss_xml(&xml, self.max_results))
    }
}

/// Parse a `DuckDuckGo` Lite HTML page.
///
/// Links and snippets are paired by position.
fn parse_duckduckgo_html(html: &str, limit: usize) -> Vec<SearchResult> {
    let (Some(link_re), Some(snippet_re), Some(href_re)) = (
        DDG_LINK_RE.as_ref(),
        DDG_SNIPPET_RE.as_ref(),
        HREF_RE.as_ref(),
    ) else {
        return Vec::new();
    };

    let snippets: Vec<String> = snippet_re
        .captures_iter(html)
        .map(|c| clean_text(c.get(1).map_or("", |m| m.as_str())))
        .collect();

    link_re
        .captures_iter(html)
        .enumerate()
        .filter_map(|(i, cap)| {
            let attrs = cap.get(1).map_or("", |m| m.as_str());
            let link = href_re
                .captures(attrs)
                .and_then(|h| h.get(1))
                .map(|m| decode_entities(m.as_str()))?;
            let title = clean_text(cap.get(2).map_or("", |m| m.as_str()));
            if link.is_empty() || title.is_empty() {
                return None;
            }
            Some(SearchResult {
                title,
                link,
                description: snippets.get(i).cloned().unwrap_or_default(),
            })
        })
        .take(limit)
        .collect()
}

/// Parse a Bing RSS response.
fn parse_rss_xml(xml: &str, limit: usize) -> Vec<SearchResult> {
    let Some(item_re) = RSS_ITEM_RE.as_ref() else {
        return Vec::new();
    };

    item_re
        .captures_iter(xml)
        .map(|cap| {
            let field = |i: usize| clean_text(cap.get(i).map_or("", |m| m.as_str()));
            SearchResult {
                title: field(1),
                link: field(2),
                description: field(3),
            }
        })
        .filter(|r| !r.link.is_empty())
        .take(limit)
        .collect()
}

/// Strip tags, decode entities and collapse whitespace.
fn clean_text(fragment: &str) -> String {
    let without_tags = TAG_RE
        .as_ref()
        .map_or_else(|| fragment.to_owned(), |re| re.replace_all(fragment, "").into_owned());
    decode_entities(&without_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[async_trait]
impl Tool for WebSearchTool {
    const NAME: &'static str = "duckduckgo_search";
    type Args = WebSearchArgs;
    type Output = String;
    type Error = ToolError;

    fn description(&self) -> String {
        "Busca na web. Útil para responder perguntas sobre fatos atuais ou que você não sabe. \
         A entrada deve ser uma consulta de busca."
            .to_owned()
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to perform"
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        self.search(&args.query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::DynTool;

    const DDG_PAGE: &str = r#"
<table>
  <tr><td>1.&nbsp;</td><td>
    <a rel="nofollow" href="https://pt.wikipedia.org/wiki/Paris" class='result-link'>Paris &amp; a <b>capital</b> - Wikipédia</a>
  </td></tr>
  <tr><td>&nbsp;</td><td class='result-snippet'>
    <b>Paris</b> é a capital e a cidade mais populosa da França.
  </td></tr>
  <tr><td>2.&nbsp;</td><td>
    <a rel="nofollow" href="https://example.com/franca" class='result-link'>França</a>
  </td></tr>
  <tr><td>&nbsp;</td><td class='result-snippet'>País da Europa Ocidental.</td></tr>
</table>
"#;

    const RSS_FEED: &str = r"<rss><channel>
<item><title>Rust</title><link>https://www.rust-lang.org/</link><description>A language empowering everyone</description><pubDate>x</pubDate></item>
<item><title>Crates</title><link>https://crates.io/</link><description>The Rust package registry</description></item>
</channel></rss>";

    mod duckduckgo {
        use super::*;

        #[test]
        fn parses_links_titles_and_snippets() {
            let results = parse_duckduckgo_html(DDG_PAGE, 10);

            assert_eq!(results.len(), 2);
            assert_eq!(results[0].title, "Paris & a capital - Wikipédia");
            assert_eq!(results[0].link, "https://pt.wikipedia.org/wiki/Paris");
            assert_eq!(
                results[0].description,
                "Paris é a capital e a cidade mais populosa da França."
            );
            assert_eq!(results[1].description, "País da Europa Ocidental.");
        }

        #[test]
        fn respects_limit() {
            assert_eq!(parse_duckduckgo_html(DDG_PAGE, 1).len(), 1);
        }

        #[test]
        fn page_without_results_is_empty() {
            assert!(parse_duckduckgo_html("<html><body>nada</body></html>", 5).is_empty());
        }
    }

    mod bing {
        use super::*;

        #[test]
        fn parses_rss_items() {
            let results = parse_rss_xml(RSS_FEED, 10);

            assert_eq!(results.len(), 2);
            assert_eq!(results[0].title, "Rust");
            assert_eq!(results[1].link, "https://crates.io/");
        }

        #[test]
        fn respects_limit() {
            assert_eq!(parse_rss_xml(RSS_FEED, 1).len(), 1);
        }
    }

    mod formatting {
        use super::*;

        #[test]
        fn empty_results_use_sentinel() {
            assert_eq!(WebSearchTool::format_results(&[]), NO_RESULTS);
        }

        #[test]
        fn results_are_separated_by_blank_lines() {
            let results = vec![
                SearchResult {
                    title: "A".into(),
                    link: "https://a".into(),
                    description: "primeiro".into(),
                },
                SearchResult {
                    title: "B".into(),
                    link: "https://b".into(),
                    description: String::new(),
                },
            ];
            assert_eq!(
                WebSearchTool::format_results(&results),
                "A\nhttps://a\nprimeiro\n\nB\nhttps://b"
            );
        }
    }

    mod tool {
        use super::*;

        #[test]
        fn definition_binds_text_to_query() {
            let tool = WebSearchTool::new();
            let def = Tool::definition(&tool);
            assert_eq!(def.name, "duckduckgo_search");
            assert_eq!(def.primary_parameter(), Some("query"));
            assert!(!DynTool::description(&tool).is_empty());
        }

        #[test]
        fn builder_sets_engine_and_limit() {
            let tool = WebSearchTool::new()
                .with_engine(SearchEngine::Bing)
                .with_max_results(3);
            assert_eq!(tool.engine, SearchEngine::Bing);
            assert_eq!(tool.max_results, 3);
        }

        #[test]
        fn client_with_timeout_builds() {
            let tool: Result<WebSearchTool, ToolError> = WebSearchTool::with_timeout(5);
            assert!(tool.is_ok());
        }

        #[test]
        fn engine_deserializes_lowercase() {
            let engine: SearchEngine = serde_json::from_str(r#""duckduckgo""#).unwrap_or_default();
            assert_eq!(engine, SearchEngine::DuckDuckGo);
            let engine: Result<SearchEngine, _> = serde_json::from_str(r#""bing""#);
            assert!(matches!(engine, Ok(SearchEngine::Bing)));
        }
    }
}
