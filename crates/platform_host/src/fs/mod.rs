//! Virtual filesystem: path model, records, store contract, service, and change feed.

pub mod changes;
pub mod error;
pub mod path;
pub mod service;
pub mod store;
pub mod types;
