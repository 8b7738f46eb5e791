use serde::Serialize;

use super::{Actor, Edge};

/// A route from the source actor, one [`Edge`] per hop.
///
/// The origin is stored explicitly so a zero-hop path still has a tail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Path {
    origin: Actor,
    edges: Vec<Edge>,
}

impl Path {
    /// Zero-hop path sitting on `origin`.
    pub fn start(origin: Actor) -> Self {
        Self {
            origin,
            edges: Vec::new(),
        }
    }

    /// Copy of this path with one more hop appended.
    pub fn extend(&self, edge: Edge) -> Self {
        let mut edges = Vec::with_capacity(self.edges.len() + 1);
        edges.extend(self.edges.iter().cloned());
        edges.push(edge);
        Self {
            origin: self.origin.clone(),
            edges,
        }
    }

    /// Last actor reached, or the origin for an empty path.
    pub fn tail(&self) -> &Actor {
        self.edges.last().map(|e| &e.actor).unwrap_or(&self.origin)
    }

    pub fn origin(&self) -> &Actor {
        &self.origin
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of hops taken.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_tail_is_origin() {
        let path = Path::start(Actor::new("Actor_A"));
        assert!(path.is_empty());
        assert_eq!(path.len(), 0);
        assert_eq!(path.tail().as_str(), "Actor_A");
    }

    #[test]
    fn test_extend_leaves_parent_untouched() {
        let root = Path::start(Actor::new("Actor_A"));
        let one = root.extend(Edge::new("Film_1", "Actor_B"));
        let two = one.extend(Edge::new("Film_2", "Actor_C"));

        assert!(root.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(two.len(), 2);
        assert_eq!(one.tail().as_str(), "Actor_B");
        assert_eq!(two.tail().as_str(), "Actor_C");
        assert_eq!(two.origin().as_str(), "Actor_A");
        assert_eq!(two.edges()[0], Edge::new("Film_1", "Actor_B"));
    }
}
