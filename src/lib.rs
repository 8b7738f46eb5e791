pub mod config;
pub mod error;
pub mod graph;
pub mod report;
pub mod sparql;

pub use config::Config;
pub use error::{BaconError, Result};
pub use graph::{Actor, CoStarSource, Edge, Explorer, Film, LevelPolicy, Path, SearchOutcome};
pub use sparql::SparqlClient;
