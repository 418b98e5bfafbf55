//! Export paths: RDF rendering, collection archives, and triplestore sync.

pub mod archive;
pub mod rdf;
pub mod triplestore;
