//! HTTP request handlers for the Mock API server

mod graphql;

pub use graphql::GraphqlHandler;
