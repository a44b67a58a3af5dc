//! HTTP API handlers for shelfmark-web
//!
//! JSON in, JSON out. Rendering is the client's problem; these handlers
//! expose catalog data and the import reconciliation flow.

pub mod health;
pub mod import;
pub mod records;

pub use health::health_routes;
pub use import::import_routes;
pub use records::record_routes;
