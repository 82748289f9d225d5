//! Project search parameters and results.

use serde::{Deserialize, Serialize};

use crate::types::{ProjectType, Support};

/// Upper bound the API accepts for `limit`.
pub const MAX_LIMIT: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetOperation {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl FacetOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            FacetOperation::Equal => ":",
            FacetOperation::NotEqual => "!=",
            FacetOperation::Less => "<",
            FacetOperation::LessEqual => "<=",
            FacetOperation::Greater => ">",
            FacetOperation::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    pub key: String,
    pub operation: FacetOperation,
    pub value: String,
}

impl Facet {
    pub fn equal(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            operation: FacetOperation::Equal,
            value: value.to_string(),
        }
    }

    fn render(&self) -> String {
        format!("{}{}{}", self.key, self.operation.as_str(), self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchIndex {
    Relevance,
    Downloads,
    Follows,
    Newest,
    Updated,
}

impl SearchIndex {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchIndex::Relevance => "relevance",
            SearchIndex::Downloads => "downloads",
            SearchIndex::Follows => "follows",
            SearchIndex::Newest => "newest",
            SearchIndex::Updated => "updated",
        }
    }
}

/// Facets are ANDed across the outer list and ORed within each inner list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub facets: Vec<Vec<Facet>>,
    pub index: Option<SearchIndex>,
    /// Number of results to skip.
    pub offset: u32,
    /// Zero leaves the server default; values above `MAX_LIMIT` are clamped.
    pub limit: u8,
}

impl SearchQuery {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            ..Self::default()
        }
    }

    /// Unencoded query pairs; the transport does the percent-encoding.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("query".to_string(), self.query.clone())];

        if !self.facets.is_empty() {
            let rendered: Vec<Vec<String>> = self
                .facets
                .iter()
                .map(|group| group.iter().map(Facet::render).collect())
                .collect();
            // A list of lists of strings always serializes.
            let facets = serde_json::to_string(&rendered).unwrap_or_default();
            pairs.push(("facets".to_string(), facets));
        }
        if let Some(index) = self.index {
            pairs.push(("index".to_string(), index.as_str().to_string()));
        }
        if self.offset != 0 {
            pairs.push(("offset".to_string(), self.offset.to_string()));
        }
        if self.limit != 0 {
            pairs.push(("limit".to_string(), self.limit.min(MAX_LIMIT).to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub client_side: Option<Support>,
    pub server_side: Option<Support>,
    pub project_type: Option<ProjectType>,
    pub downloads: u64,
    pub icon_url: Option<String>,
    pub project_id: String,
    pub author: String,
    pub versions: Vec<String>,
    pub follows: u64,
    pub date_created: String,
    pub date_modified: String,
    pub latest_version: Option<String>,
    pub license: String,
    pub gallery: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub hits: Vec<SearchResult>,
    pub offset: u32,
    pub limit: u32,
    pub total_hits: u64,
}
