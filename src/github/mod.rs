//! The two remote protocols the board can be read and written through.
//!
//! - [`graphql`]: the structured-query endpoint, richer data, requires a credential
//! - [`rest`]: the per-resource API, works anonymously for reads and serves
//!   every comment and reaction operation

pub mod graphql;
pub mod rest;

use std::fmt;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{Credential, Discussion, NewDiscussion};

pub use graphql::GraphqlClient;
pub use rest::RestClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Structured,
    Rest,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Structured => f.write_str("structured-query"),
            Protocol::Rest => f.write_str("rest"),
        }
    }
}

/// Parameters of one listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub category: String,
    pub page: u32,
    pub page_size: u32,
}

/// A protocol able to list and create discussions.
#[async_trait]
pub trait DiscussionSource: Send + Sync {
    fn protocol(&self) -> Protocol;

    /// Whether a request carrying `credential` can be served at all.
    fn accepts(&self, credential: Option<&Credential>) -> bool;

    async fn list(
        &self,
        credential: Option<&Credential>,
        query: &ListQuery,
    ) -> Result<Vec<Discussion>>;

    async fn create(&self, credential: &Credential, draft: &NewDiscussion) -> Result<Discussion>;
}
