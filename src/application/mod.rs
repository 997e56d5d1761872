pub mod agent;
pub mod assistant;
pub mod client;
pub mod formatter;
pub mod ingest;
pub mod persistence;
pub mod rag;
pub mod session;
pub mod tooling;
