//! Ordered-strategy combinator.
//!
//! Alternatives are tried in order until one succeeds. Failures that were
//! superseded by a later success are recorded on the result instead of
//! being returned.

use std::future::Future;

use crate::app::{ErrorKind, Result, SyncError};
use crate::github::Protocol;

#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub protocol: Protocol,
    pub value: T,
    pub superseded: Vec<(Protocol, ErrorKind)>,
}

impl<T> Sourced<T> {
    pub fn fell_back(&self) -> bool {
        !self.superseded.is_empty()
    }
}

/// Run `attempt` against each alternative in order and return the first success.
///
/// When every alternative fails the last error is returned. An empty chain
/// fails with [`SyncError::Unknown`].
pub async fn first_success<S, T, F, Fut>(
    alternatives: Vec<(Protocol, S)>,
    mut attempt: F,
) -> Result<Sourced<T>>
where
    F: FnMut(S) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut superseded = Vec::new();
    let mut last_error = None;

    for (protocol, alternative) in alternatives {
        match attempt(alternative).await {
            Ok(value) => {
                return Ok(Sourced {
                    protocol,
                    value,
                    superseded,
                })
            }
            Err(err) => {
                tracing::warn!(%protocol, error = %err, "protocol attempt failed");
                superseded.push((protocol, err.kind()));
                last_error = Some(err);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| SyncError::Unknown("no protocol available".into())))
}
