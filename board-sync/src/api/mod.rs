//! monday.com GraphQL API access
//!
//! Request construction, the query/mutation documents used by the sync,
//! and the HTTP transport that sends them.

pub mod client;
pub mod queries;
pub mod request;

pub use client::{BoardClient, GraphqlResponse, GraphqlTransport};
