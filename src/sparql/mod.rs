//! Graph query client backed by a SPARQL endpoint (DBpedia by default).

mod client;
pub mod response;

pub use client::SparqlClient;
