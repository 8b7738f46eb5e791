use std::time::{Duration, Instant};

use reqwest::Client;
use url::Url;

use super::response::parse_edges;
use crate::config::SparqlConfig;
use crate::error::{BaconError, Result};
use crate::graph::{Actor, CoStarSource, Edge};

const SPARQL_JSON: &str = "application/sparql-results+json";

/// SPARQL endpoint client answering "who co-starred with this actor?"
///
/// Every request is preceded by a cooperative pause and bounded by a
/// per-query timeout. Rate limiting (429) and server errors (5xx) are
/// retried with exponential backoff; a timeout is not.
pub struct SparqlClient {
    client: Client,
    endpoint: Url,
    resource_prefix: String,
    starring_property: String,
    request_delay: Duration,
    query_timeout: Duration,
    max_retries: usize,
    retry_backoff: Duration,
}

impl SparqlClient {
    /// Create a new client from the `[sparql]` config section.
    pub fn new(config: &SparqlConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            BaconError::Config(format!("Invalid SPARQL endpoint {}: {}", config.endpoint, e))
        })?;
        let query_timeout = config.query_timeout();

        let client = Client::builder()
            .timeout(query_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| BaconError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            resource_prefix: config.resource_prefix.clone(),
            starring_property: config.starring_property.clone(),
            request_delay: config.request_delay(),
            query_timeout,
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff(),
        })
    }

    /// Films starring `actor`, paired with every actor of each film.
    pub fn build_query(&self, actor: &Actor) -> String {
        format!(
            "SELECT DISTINCT ?film ?actor WHERE {{\n  \
               ?film <{prop}> <{prefix}{actor}> .\n  \
               ?film <{prop}> ?actor .\n\
             }}",
            prop = self.starring_property,
            prefix = self.resource_prefix,
            actor = actor.as_str(),
        )
    }

    /// Single request, no pause and no retry.
    async fn query_once(&self, query: &str) -> Result<Vec<Edge>> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("query", query), ("format", SPARQL_JSON)])
            .header(reqwest::header::ACCEPT, SPARQL_JSON)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(BaconError::Http {
                status,
                body: body.trim().to_string(),
            });
        }

        let body = response.text().await.map_err(|e| self.request_error(e))?;
        parse_edges(&body)
    }

    async fn query_with_retry(&self, actor: &Actor) -> Result<Vec<Edge>> {
        let query = self.build_query(actor);
        let start = Instant::now();
        let mut attempt = 0;
        let mut delay = self.retry_backoff;

        loop {
            match self.query_once(&query).await {
                Ok(edges) => {
                    log::debug!(
                        "Co-star query for {} took {:?} (attempt {}), {} edges",
                        actor,
                        start.elapsed(),
                        attempt + 1,
                        edges.len()
                    );
                    return Ok(edges);
                }
                Err(e) if attempt < self.max_retries && e.is_retryable() => {
                    log::warn!(
                        "Retry {}/{} for {} after error: {}",
                        attempt + 1,
                        self.max_retries,
                        actor,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2; // Exponential backoff
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn request_error(&self, err: reqwest::Error) -> BaconError {
        if err.is_timeout() {
            BaconError::Timeout(self.query_timeout)
        } else {
            err.into()
        }
    }
}

impl CoStarSource for SparqlClient {
    async fn co_stars(&self, actor: &Actor) -> Result<Vec<Edge>> {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
        self.query_with_retry(actor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::Router;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Endpoint {
        hits: Arc<AtomicUsize>,
        /// Number of leading requests answered with 503.
        failures: usize,
        stall: Option<Duration>,
        /// Fixed answer for every request.
        reject: Option<(StatusCode, &'static str)>,
    }

    fn bindings_for(query: &str) -> serde_json::Value {
        let rows: Vec<(&str, &str)> = if query.contains("resource/Lori_Singer>") {
            vec![
                ("Footloose_(1984_film)", "Lori_Singer"),
                ("Footloose_(1984_film)", "Kevin_Bacon"),
            ]
        } else {
            vec![]
        };
        let bindings: Vec<_> = rows
            .into_iter()
            .map(|(film, actor)| {
                serde_json::json!({
                    "film": { "type": "uri", "value": format!("http://dbpedia.org/resource/{}", film) },
                    "actor": { "type": "uri", "value": format!("http://dbpedia.org/resource/{}", actor) }
                })
            })
            .collect();
        serde_json::json!({
            "head": { "vars": ["film", "actor"] },
            "results": { "bindings": bindings }
        })
    }

    async fn handle_sparql(
        State(endpoint): State<Endpoint>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        let hit = endpoint.hits.fetch_add(1, Ordering::SeqCst);
        if let Some(stall) = endpoint.stall {
            tokio::time::sleep(stall).await;
        }
        if let Some((status, body)) = endpoint.reject {
            return (status, body).into_response();
        }
        if hit < endpoint.failures {
            return (StatusCode::SERVICE_UNAVAILABLE, "busy").into_response();
        }
        if params.get("format").map(String::as_str) != Some(SPARQL_JSON) {
            return (StatusCode::BAD_REQUEST, "missing format").into_response();
        }
        let query = params.get("query").cloned().unwrap_or_default();
        axum::Json(bindings_for(&query)).into_response()
    }

    async fn spawn_endpoint(endpoint: Endpoint) -> String {
        let app = Router::new()
            .route("/sparql", get(handle_sparql))
            .with_state(endpoint);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/sparql", addr)
    }

    fn test_config(endpoint: String) -> SparqlConfig {
        SparqlConfig {
            endpoint,
            request_delay_ms: 0,
            query_timeout_ms: 2_000,
            max_retries: 2,
            retry_backoff_ms: 10,
            ..SparqlConfig::default()
        }
    }

    #[test]
    fn test_build_query() {
        let client = SparqlClient::new(&SparqlConfig::default()).unwrap();
        let query = client.build_query(&Actor::new("Gillian_Anderson"));
        assert!(query.starts_with("SELECT DISTINCT ?film ?actor WHERE {"));
        assert!(query.contains(
            "?film <http://dbpedia.org/ontology/starring> <http://dbpedia.org/resource/Gillian_Anderson> ."
        ));
        assert!(query.contains("?film <http://dbpedia.org/ontology/starring> ?actor ."));
    }

    #[test]
    fn test_invalid_endpoint() {
        let config = SparqlConfig {
            endpoint: "dbpedia sparql".to_string(),
            ..SparqlConfig::default()
        };
        assert!(matches!(SparqlClient::new(&config), Err(BaconError::Config(_))));
    }

    #[tokio::test]
    async fn test_co_stars_success() {
        let url = spawn_endpoint(Endpoint::default()).await;
        let client = SparqlClient::new(&test_config(url)).unwrap();

        let edges = client.co_stars(&Actor::new("Lori_Singer")).await.unwrap();
        assert_eq!(
            edges,
            vec![
                Edge::new("Footloose_(1984_film)", "Lori_Singer"),
                Edge::new("Footloose_(1984_film)", "Kevin_Bacon"),
            ]
        );
    }

    #[tokio::test]
    async fn test_co_stars_empty_is_not_an_error() {
        let url = spawn_endpoint(Endpoint::default()).await;
        let client = SparqlClient::new(&test_config(url)).unwrap();

        let edges = client.co_stars(&Actor::new("Nobody_In_Particular")).await.unwrap();
        assert!(edges.is_empty());
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let endpoint = Endpoint {
            failures: 2,
            ..Endpoint::default()
        };
        let hits = endpoint.hits.clone();
        let url = spawn_endpoint(endpoint).await;
        let client = SparqlClient::new(&test_config(url)).unwrap();

        let edges = client.co_stars(&Actor::new("Lori_Singer")).await.unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let endpoint = Endpoint {
            failures: usize::MAX,
            ..Endpoint::default()
        };
        let hits = endpoint.hits.clone();
        let url = spawn_endpoint(endpoint).await;
        let client = SparqlClient::new(&test_config(url)).unwrap();

        let err = client.co_stars(&Actor::new("Lori_Singer")).await.unwrap_err();
        assert!(matches!(
            err,
            BaconError::Http { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let endpoint = Endpoint {
            reject: Some((StatusCode::BAD_REQUEST, "rejected")),
            ..Endpoint::default()
        };
        let hits = endpoint.hits.clone();
        let url = spawn_endpoint(endpoint).await;
        let client = SparqlClient::new(&test_config(url)).unwrap();

        let err = client.co_stars(&Actor::new("Lori_Singer")).await.unwrap_err();
        assert!(matches!(
            err,
            BaconError::Http { status, ref body } if status == StatusCode::BAD_REQUEST && body == "rejected"
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_client_error_with_status_like_body_not_retried() {
        let endpoint = Endpoint {
            reject: Some((
                StatusCode::BAD_REQUEST,
                "Virtuoso 37000 Error SP030: SPARQL compiler, line 500: syntax error",
            )),
            ..Endpoint::default()
        };
        let hits = endpoint.hits.clone();
        let url = spawn_endpoint(endpoint).await;
        let client = SparqlClient::new(&test_config(url)).unwrap();

        let err = client.co_stars(&Actor::new("Lori_Singer")).await.unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_retried() {
        let endpoint = Endpoint {
            reject: Some((StatusCode::TOO_MANY_REQUESTS, "slow down")),
            ..Endpoint::default()
        };
        let hits = endpoint.hits.clone();
        let url = spawn_endpoint(endpoint).await;
        let client = SparqlClient::new(&test_config(url)).unwrap();

        let err = client.co_stars(&Actor::new("Lori_Singer")).await.unwrap_err();
        assert!(matches!(err, BaconError::Http { status, .. } if status == StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_query_timeout() {
        let endpoint = Endpoint {
            stall: Some(Duration::from_secs(2)),
            ..Endpoint::default()
        };
        let hits = endpoint.hits.clone();
        let url = spawn_endpoint(endpoint).await;
        let config = SparqlConfig {
            query_timeout_ms: 100,
            ..test_config(url)
        };
        let client = SparqlClient::new(&config).unwrap();

        let err = client.co_stars(&Actor::new("Lori_Singer")).await.unwrap_err();
        assert!(matches!(err, BaconError::Timeout(d) if d == Duration::from_millis(100)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // Bind and drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = SparqlConfig {
            max_retries: 0,
            ..test_config(format!("http://{}/sparql", addr))
        };
        let client = SparqlClient::new(&config).unwrap();

        let err = client.co_stars(&Actor::new("Lori_Singer")).await.unwrap_err();
        assert!(matches!(err, BaconError::Connect(_)));
    }
}
