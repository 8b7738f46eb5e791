//! Level-by-level BFS from a source actor towards a target actor.
//!
//! Edges are fetched lazily: one [`CoStarSource`] query per frontier path.
//! Actors and films are claimed globally for the whole search, so every
//! actor except the target is reached through exactly one edge and no actor
//! is ever queried twice.

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;

use super::{Actor, CoStarSource, Edge, Film, Path};
use crate::error::{BaconError, Result};

/// Default hop limit ("six degrees").
pub const DEFAULT_MAX_HOPS: usize = 6;

/// What to do with the rest of a level once some path has hit the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelPolicy {
    /// Expand every path of the terminal level so all equal-length routes
    /// are reported.
    #[default]
    CompleteLevel,
    /// Stop at the first frontier path whose expansion reaches the target.
    /// Fewer queries, but sibling routes of the same length may be missed.
    EarlyExit,
}

/// Effort spent by one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Co-star queries issued.
    pub queries: usize,
    /// BFS levels completed (or partially completed under early exit).
    pub levels: usize,
    pub actors_visited: usize,
    pub films_visited: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundReason {
    /// `max_hops` levels expanded without meeting the target.
    HopLimit,
    /// A level produced no unvisited actors.
    FrontierExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found {
        hops: usize,
        routes: Vec<Path>,
        stats: SearchStats,
    },
    NotFound {
        reason: NotFoundReason,
        hops_searched: usize,
        stats: SearchStats,
    },
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found { .. })
    }

    pub fn stats(&self) -> &SearchStats {
        match self {
            SearchOutcome::Found { stats, .. } | SearchOutcome::NotFound { stats, .. } => stats,
        }
    }
}

/// Mutable state of a single search. Never shared between searches.
struct SearchState {
    visited_films: HashSet<Film>,
    visited_actors: HashSet<Actor>,
    frontier: Vec<Path>,
    step: usize,
    queries: usize,
}

impl SearchState {
    fn new(from: &Actor) -> Self {
        let mut visited_actors = HashSet::new();
        visited_actors.insert(from.clone());
        Self {
            visited_films: HashSet::new(),
            visited_actors,
            frontier: vec![Path::start(from.clone())],
            step: 0,
            queries: 0,
        }
    }

    /// Fold one query's candidates into the next level.
    ///
    /// Films are committed only after the whole batch has been scanned: two
    /// co-stars of the same film in one result must both be able to extend
    /// `path`. Actors are claimed immediately so a batch never yields two
    /// paths to the same new actor.
    ///
    /// The target is only claimed per batch. The search ends with the level
    /// that first reaches it, so sibling paths of that level may each report
    /// their own route without the target ever being expanded.
    fn absorb(
        &mut self,
        path: &Path,
        candidates: Vec<Edge>,
        target: &Actor,
        next: &mut Vec<Path>,
        reached: &mut Vec<Path>,
    ) {
        let mut batch_films = HashSet::new();
        let mut target_claimed = self.visited_actors.contains(target);

        for edge in candidates {
            if self.visited_films.contains(&edge.film) {
                continue;
            }
            batch_films.insert(edge.film.clone());

            let hits_target = edge.actor == *target;
            if hits_target {
                if target_claimed {
                    continue;
                }
                target_claimed = true;
            } else if !self.visited_actors.insert(edge.actor.clone()) {
                continue;
            }
            let new_path = path.extend(edge);
            if hits_target {
                reached.push(new_path.clone());
            }
            next.push(new_path);
        }

        self.visited_films.extend(batch_films);
    }

    fn stats(&self) -> SearchStats {
        SearchStats {
            queries: self.queries,
            levels: self.step,
            actors_visited: self.visited_actors.len(),
            films_visited: self.visited_films.len(),
        }
    }
}

/// BFS path explorer over a [`CoStarSource`].
pub struct Explorer<S> {
    source: S,
    target: Actor,
    max_hops: usize,
    policy: LevelPolicy,
    search_timeout: Option<Duration>,
}

impl<S: CoStarSource> Explorer<S> {
    pub fn new(source: S, target: Actor) -> Self {
        Self {
            source,
            target,
            max_hops: DEFAULT_MAX_HOPS,
            policy: LevelPolicy::default(),
            search_timeout: None,
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn with_policy(mut self, policy: LevelPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Wall-clock budget for a whole search. Exceeding it aborts with
    /// [`BaconError::Timeout`].
    pub fn with_search_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn target(&self) -> &Actor {
        &self.target
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Search for the shortest co-star routes from `from` to the target.
    ///
    /// Every call starts from fresh visited sets.
    pub async fn search(&self, from: &Actor) -> Result<SearchOutcome> {
        if from.as_str().trim().is_empty() {
            return Err(BaconError::InvalidInput(
                "source actor identifier cannot be empty".to_string(),
            ));
        }
        if self.max_hops == 0 {
            return Err(BaconError::InvalidInput(
                "max_hops must be at least 1".to_string(),
            ));
        }

        match self.search_timeout {
            Some(budget) => tokio::time::timeout(budget, self.run(from))
                .await
                .map_err(|_| BaconError::Timeout(budget))?,
            None => self.run(from).await,
        }
    }

    async fn run(&self, from: &Actor) -> Result<SearchOutcome> {
        let mut state = SearchState::new(from);
        log::info!(
            "Searching from {} to {} (max {} hops, {:?})",
            from,
            self.target,
            self.max_hops,
            self.policy
        );

        loop {
            let frontier = std::mem::take(&mut state.frontier);
            let mut next = Vec::new();
            let mut reached = Vec::new();

            log::debug!(
                "Level {}: expanding {} paths",
                state.step + 1,
                frontier.len()
            );

            for path in &frontier {
                let candidates = self.source.co_stars(path.tail()).await?;
                state.queries += 1;
                log::debug!("{} -> {} candidate edges", path.tail(), candidates.len());

                state.absorb(path, candidates, &self.target, &mut next, &mut reached);

                if !reached.is_empty() && self.policy == LevelPolicy::EarlyExit {
                    break;
                }
            }

            state.step += 1;

            if !reached.is_empty() {
                state.visited_actors.insert(self.target.clone());
                log::info!(
                    "Reached {} in {} hops via {} route(s) after {} queries",
                    self.target,
                    state.step,
                    reached.len(),
                    state.queries
                );
                return Ok(SearchOutcome::Found {
                    hops: state.step,
                    routes: reached,
                    stats: state.stats(),
                });
            }

            if next.is_empty() {
                log::info!("Frontier exhausted after {} hops", state.step);
                return Ok(SearchOutcome::NotFound {
                    reason: NotFoundReason::FrontierExhausted,
                    hops_searched: state.step,
                    stats: state.stats(),
                });
            }

            if state.step >= self.max_hops {
                log::info!("Hop limit {} reached", self.max_hops);
                return Ok(SearchOutcome::NotFound {
                    reason: NotFoundReason::HopLimit,
                    hops_searched: state.step,
                    stats: state.stats(),
                });
            }

            state.frontier = next;
        }
    }
}
