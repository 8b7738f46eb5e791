//! SPARQL 1.1 JSON result format, reduced to what a co-star query returns.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::error::{BaconError, Result};
use crate::graph::{is_identifier, Edge};

#[derive(Debug, Deserialize)]
pub struct SparqlResponse {
    pub results: SparqlResults,
}

#[derive(Debug, Deserialize)]
pub struct SparqlResults {
    #[serde(default)]
    pub bindings: Vec<HashMap<String, BindingValue>>,
}

#[derive(Debug, Deserialize)]
pub struct BindingValue {
    /// `uri`, `literal`, `typed-literal` or `bnode`.
    #[serde(rename = "type", default)]
    pub kind: String,
    pub value: String,
}

impl BindingValue {
    /// Local name of a resource binding, if it is a usable identifier.
    fn resource_name(&self) -> Option<&str> {
        if self.kind != "uri" {
            return None;
        }
        let name = local_name(&self.value);
        is_identifier(name).then_some(name)
    }
}

/// Drop the namespace from a resource IRI:
/// `http://dbpedia.org/resource/Kevin_Bacon` -> `Kevin_Bacon`.
pub fn local_name(iri: &str) -> &str {
    iri.rsplit('/').next().unwrap_or(iri)
}

/// Parse a response body into distinct (film, actor) edges, first occurrence
/// wins. Rows missing either variable, literal values and names that cannot
/// be queried again are skipped.
pub fn parse_edges(body: &str) -> Result<Vec<Edge>> {
    let response: SparqlResponse = serde_json::from_str(body)
        .map_err(|e| BaconError::Parse(format!("Invalid SPARQL JSON: {}", e)))?;

    let mut seen = HashSet::new();
    let mut edges = Vec::with_capacity(response.results.bindings.len());

    for row in &response.results.bindings {
        let (Some(film), Some(actor)) = (row.get("film"), row.get("actor")) else {
            log::debug!("Skipping incomplete binding: {:?}", row.keys().collect::<Vec<_>>());
            continue;
        };
        let (Some(film), Some(actor)) = (film.resource_name(), actor.resource_name()) else {
            log::debug!("Skipping unusable binding: {} / {}", film.value, actor.value);
            continue;
        };
        if seen.insert((film, actor)) {
            edges.push(Edge::new(film, actor));
        }
    }

    Ok(edges)
}
