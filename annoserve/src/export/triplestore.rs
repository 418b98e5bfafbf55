//! Annotation upload into a SPARQL triplestore.
//!
//! Upload replaces the per-(user, document) named graph: first a DELETE of
//! the graph on the data endpoint, then a single `INSERT DATA` on the update
//! endpoint. A 500 on the delete is tolerated (the graph may simply not
//! exist yet); any failed insert is surfaced to the caller and never retried.

use std::path::Path;

use reqwest::StatusCode;
use tracing::{info, instrument};

use crate::{
    config::TriplestoreConfig,
    errors::{Error, Result},
    export::rdf,
};

pub struct TriplestoreClient {
    config: TriplestoreConfig,
    http: reqwest::Client,
}

impl TriplestoreClient {
    pub fn new(config: TriplestoreConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// The named graph holding one user's annotations for one document.
    fn graph_uri(&self, user: &str, document: &str) -> String {
        format!("{}{user}/{document}", self.config.graph_base)
    }

    /// Replace the graph for (`user`, `document`) with the RDF rendering of
    /// the annotation file at `ann_path`.
    #[instrument(skip(self, ann_path), fields(user = %user, document = %document), err)]
    pub async fn upload(&self, user: &str, document: &str, ann_path: &Path) -> Result<()> {
        let graph = self.graph_uri(user, document);

        let response = self
            .http
            .delete(self.config.data_url.clone())
            .query(&[("graph", graph.as_str())])
            .send()
            .await
            .map_err(|e| Error::Upstream {
                operation: "delete old graph from triplestore".to_string(),
                detail: e.to_string(),
            })?;
        let status = response.status();
        // A 500 here usually means the graph did not exist; proceed.
        if status != StatusCode::OK && status != StatusCode::INTERNAL_SERVER_ERROR {
            return Err(Error::Upstream {
                operation: "delete old graph from triplestore".to_string(),
                detail: format!("response {status}"),
            });
        }

        let parts = rdf::rdf_parts(ann_path).await?;
        let mut sparql = String::new();
        for prefix in &parts.prefixes {
            sparql.push_str(&format!("PREFIX {prefix} "));
        }
        sparql.push_str(&format!(" INSERT DATA {{ GRAPH <{graph}> {{ {} }}}} ", parts.data));

        let response = self
            .http
            .post(self.config.update_url.clone())
            .form(&[("update", sparql.as_str())])
            .send()
            .await
            .map_err(|e| Error::Upstream {
                operation: "upload to triplestore".to_string(),
                detail: e.to_string(),
            })?;

        if response.status() != StatusCode::OK {
            return Err(Error::Upstream {
                operation: "upload to triplestore".to_string(),
                detail: format!("response {}", response.status()),
            });
        }
        info!(graph, "uploaded annotation data to triplestore");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn client() -> TriplestoreClient {
        TriplestoreClient::new(TriplestoreConfig {
            data_url: Url::parse("http://localhost:8000/data/").unwrap(),
            update_url: Url::parse("http://localhost:8000/update/").unwrap(),
            graph_base: Url::parse("http://contextus.net/user/").unwrap(),
        })
    }

    #[test]
    fn graphs_are_scoped_per_user_and_document() {
        let client = client();
        assert_eq!(
            client.graph_uri("alice", "doc1"),
            "http://contextus.net/user/alice/doc1"
        );
        assert_ne!(client.graph_uri("alice", "doc1"), client.graph_uri("bob", "doc1"));
        assert_ne!(client.graph_uri("alice", "doc1"), client.graph_uri("alice", "doc2"));
    }
}
