//! Rendering of search outcomes for the terminal or for scripts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::graph::{Actor, Edge, NotFoundReason, SearchOutcome, SearchStats};

/// Plain-text report, one `Route:` block per winning path.
pub fn render_text(outcome: &SearchOutcome, target: &Actor) -> String {
    let name = target.display_name();
    match outcome {
        SearchOutcome::Found { hops, routes, .. } => {
            let mut out = format!("{} found in {} hops:\n", name, hops);
            for route in routes {
                out.push_str("Route:\n");
                for edge in route.edges() {
                    out.push_str(&format!("  Film: {};  Actor: {}\n", edge.film, edge.actor));
                }
            }
            out
        }
        SearchOutcome::NotFound {
            reason: NotFoundReason::HopLimit,
            hops_searched,
            ..
        } => format!("{} was not found within {} hops\n", name, hops_searched),
        SearchOutcome::NotFound {
            reason: NotFoundReason::FrontierExhausted,
            hops_searched,
            ..
        } => format!(
            "{} was not found (no new co-stars after {} hops)\n",
            name, hops_searched
        ),
    }
}

/// Machine-readable form of a search outcome.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub source: &'a Actor,
    pub target: &'a Actor,
    pub found: bool,
    /// Hop count of the routes when found, levels searched otherwise.
    pub hops: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<NotFoundReason>,
    pub routes: Vec<&'a [Edge]>,
    pub stats: &'a SearchStats,
    pub generated_at: DateTime<Utc>,
}

impl<'a> JsonReport<'a> {
    pub fn new(source: &'a Actor, target: &'a Actor, outcome: &'a SearchOutcome) -> Self {
        let (hops, reason, routes): (usize, Option<NotFoundReason>, Vec<&'a [Edge]>) = match outcome {
            SearchOutcome::Found { hops, routes, .. } => {
                (*hops, None, routes.iter().map(|r| r.edges()).collect())
            }
            SearchOutcome::NotFound {
                reason,
                hops_searched,
                ..
            } => (*hops_searched, Some(*reason), Vec::new()),
        };
        Self {
            source,
            target,
            found: outcome.is_found(),
            hops,
            reason,
            routes,
            stats: outcome.stats(),
            generated_at: Utc::now(),
        }
    }
}

pub fn render_json(
    source: &Actor,
    target: &Actor,
    outcome: &SearchOutcome,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport::new(source, target, outcome))
}
