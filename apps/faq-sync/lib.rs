pub mod config;
pub mod embeddings;
pub mod errors;
pub mod feed;
pub mod query;
pub mod reconciler;
pub mod scheduler;
pub mod server;
pub mod store;
pub mod types;

pub use errors::SyncError;
pub use query::QueryService;
pub use reconciler::{ReconcileReport, Reconciler};
