//! Co-star graph: identifiers, edges, paths and the BFS explorer.
//!
//! The graph is bipartite (actors and films) and never materialised. Edges
//! are discovered one actor at a time through a [`CoStarSource`].

mod explorer;
mod path;

pub use explorer::{Explorer, LevelPolicy, NotFoundReason, SearchOutcome, SearchStats};
pub use path::Path;

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{BaconError, Result};

/// Characters that cannot appear inside a SPARQL IRI reference.
fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^[^\s<>"{}|\\^`]+$"#).expect("Invalid regex pattern"))
}

/// Whether `id` can be pasted into a resource IRI as-is: non-empty, no
/// whitespace and none of `<>"{}|\^` and backtick.
pub fn is_identifier(id: &str) -> bool {
    identifier_regex().is_match(id)
}

/// An actor, identified by its DBpedia resource name (e.g. `Kevin_Bacon`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    /// Validate and wrap an identifier supplied by a user or config file.
    ///
    /// Rejects empty input and anything that would break out of an IRI
    /// (whitespace, angle brackets, quotes, braces, pipes, carets, backticks).
    pub fn parse(id: &str) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(BaconError::InvalidInput(
                "actor identifier cannot be empty".to_string(),
            ));
        }
        if !is_identifier(id) {
            return Err(BaconError::InvalidInput(format!(
                "'{}' is not a resource name (use e.g. Gillian_Anderson)",
                id
            )));
        }
        Ok(Self(id.to_string()))
    }

    /// Wrap an identifier that came back from the query service.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable name: `Kevin_Bacon` -> `Kevin Bacon`.
    pub fn display_name(&self) -> String {
        self.0.replace('_', " ")
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A film, identified by its DBpedia resource name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Film(String);

impl Film {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Film {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One hop: `actor` appeared in `film` alongside the previous actor of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub film: Film,
    pub actor: Actor,
}

impl Edge {
    pub fn new(film: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            film: Film::new(film),
            actor: Actor::new(actor),
        }
    }
}

/// Anything that can list the direct co-star edges of an actor.
///
/// `Ok(vec![])` means the actor has no known co-stars; `Err` is a hard
/// failure that aborts the search. Results may contain duplicates and
/// already-visited films or actors.
#[allow(async_fn_in_trait)]
pub trait CoStarSource {
    async fn co_stars(&self, actor: &Actor) -> Result<Vec<Edge>>;
}
