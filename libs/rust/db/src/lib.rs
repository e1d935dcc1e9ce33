//! Postgres access for the FAQ embedding collection.
//!
//! Holds the pieces shared by anything that talks to the `faq_embedding`
//! table: pool construction, schema bootstrap, row models and the pgvector
//! text encoding.

pub mod connection;
pub mod models;
pub mod schema;
pub mod vector;

pub use connection::{PoolOptions, connect};
