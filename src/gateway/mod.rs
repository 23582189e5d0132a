//! Read-through, write-through access to the discussion board.
//!
//! Listings try the structured-query protocol first when a credential is
//! held and fall back to REST; every result lands in the [`ContentCache`].
//! Writes need a credential, are validated locally before any request, and
//! invalidate the cached listings once they succeed.

pub mod fallback;

use std::sync::Arc;

use crate::app::{Result, SyncError};
use crate::cache::{CachedContent, ContentCache};
use crate::config::CacheConfig;
use crate::domain::{Comment, Credential, Discussion, NewDiscussion, ReactionKind};
use crate::github::{DiscussionSource, GraphqlClient, ListQuery, Protocol, RestClient};
use crate::identity::IdentityStore;
use crate::validation;

pub use fallback::{first_success, Sourced};

/// Every listing and single-discussion key starts with this.
pub const DISCUSSIONS_PREFIX: &str = "discussions_";

pub fn discussions_key(category: &str, page: u32, page_size: u32, credentialed: bool) -> String {
    format!(
        "{}{}_{}_{}_{}",
        DISCUSSIONS_PREFIX,
        category,
        page,
        page_size,
        if credentialed { "auth" } else { "anon" }
    )
}

pub fn discussion_key(number: u64) -> String {
    format!("{}item_{}", DISCUSSIONS_PREFIX, number)
}

pub fn comments_key(number: u64) -> String {
    format!("comments_{}", number)
}

pub struct DiscussionGateway {
    identity: Arc<IdentityStore>,
    cache: Arc<ContentCache>,
    rest: Arc<RestClient>,
    /// In preference order.
    sources: Vec<Arc<dyn DiscussionSource>>,
    ttl: CacheConfig,
}

impl DiscussionGateway {
    pub fn new(
        identity: Arc<IdentityStore>,
        cache: Arc<ContentCache>,
        graphql: Arc<GraphqlClient>,
        rest: Arc<RestClient>,
        ttl: CacheConfig,
    ) -> Self {
        let structured: Arc<dyn DiscussionSource> = graphql;
        let fallback: Arc<dyn DiscussionSource> = rest.clone();
        Self {
            identity,
            cache,
            rest,
            sources: vec![structured, fallback],
            ttl,
        }
    }

    fn chain(&self, credential: Option<&Credential>) -> Vec<(Protocol, Arc<dyn DiscussionSource>)> {
        self.sources
            .iter()
            .filter(|source| source.accepts(credential))
            .map(|source| (source.protocol(), source.clone()))
            .collect()
    }

    fn require_credential(&self, action: &str) -> Result<Credential> {
        self.identity
            .credential()
            .ok_or_else(|| SyncError::Authentication(format!("sign in to {}", action)))
    }

    fn invalidate_listings(&self) {
        self.cache.invalidate_prefix(DISCUSSIONS_PREFIX);
    }

    pub async fn get_discussions(
        &self,
        category: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Discussion>> {
        let credential = self.identity.credential();
        let key = discussions_key(category, page, page_size, credential.is_some());

        if let Some(CachedContent::Discussions(discussions)) = self.cache.get(&key) {
            tracing::debug!(%key, "serving discussions from cache");
            return Ok(discussions);
        }

        let query = ListQuery {
            category: category.to_string(),
            page: page.max(1),
            page_size,
        };
        let credential = credential.as_ref();
        let query = &query;

        let sourced = first_success(self.chain(credential), |source| async move {
            source.list(credential, query).await
        })
        .await?;

        tracing::info!(
            protocol = %sourced.protocol,
            fell_back = sourced.fell_back(),
            count = sourced.value.len(),
            %key,
            "fetched discussions"
        );

        self.cache.set(
            key,
            CachedContent::Discussions(sourced.value.clone()),
            self.ttl.discussions_ttl(),
        );
        Ok(sourced.value)
    }

    /// Single discussion, for detail views opened without a loaded listing.
    pub async fn get_discussion(&self, number: u64) -> Result<Discussion> {
        let key = discussion_key(number);
        if let Some(CachedContent::Discussion(discussion)) = self.cache.get(&key) {
            return Ok(*discussion);
        }

        let credential = self.identity.credential();
        let discussion = self.rest.get_issue(credential.as_ref(), number).await?;
        self.cache.set(
            key,
            CachedContent::Discussion(Box::new(discussion.clone())),
            self.ttl.discussions_ttl(),
        );
        Ok(discussion)
    }

    pub async fn get_comments(&self, number: u64) -> Result<Vec<Comment>> {
        let key = comments_key(number);
        if let Some(CachedContent::Comments(comments)) = self.cache.get(&key) {
            tracing::debug!(%key, "serving comments from cache");
            return Ok(comments);
        }

        let credential = self.identity.credential();
        let comments = self.rest.list_comments(credential.as_ref(), number).await?;
        self.cache.set(
            key,
            CachedContent::Comments(comments.clone()),
            self.ttl.comments_ttl(),
        );
        Ok(comments)
    }

    pub async fn create_discussion(&self, draft: &NewDiscussion) -> Result<Discussion> {
        let credential = self.require_credential("start a discussion")?;
        validation::check_discussion(&draft.title, &draft.body)?;

        let credential = &credential;
        let sourced = first_success(self.chain(Some(credential)), |source| async move {
            source.create(credential, draft).await
        })
        .await?;

        self.invalidate_listings();
        tracing::info!(
            protocol = %sourced.protocol,
            number = sourced.value.number,
            "created discussion"
        );
        Ok(sourced.value)
    }

    pub async fn add_comment(&self, number: u64, body: &str) -> Result<Comment> {
        let credential = self.require_credential("comment")?;
        validation::check_comment(body)?;

        let comment = self.rest.create_comment(&credential, number, body).await?;

        self.invalidate_listings();
        self.cache.delete(&comments_key(number));
        tracing::info!(number, comment_id = comment.id, "added comment");
        Ok(comment)
    }

    pub async fn add_reaction(&self, number: u64, kind: ReactionKind) -> Result<()> {
        let credential = self.require_credential("react")?;

        self.rest.add_reaction(&credential, number, kind).await?;

        self.invalidate_listings();
        tracing::info!(number, reaction = kind.as_content(), "added reaction");
        Ok(())
    }

    /// Close the discussion and rename it to a deletion marker.
    pub async fn delete_discussion(&self, number: u64) -> Result<()> {
        let credential = self.require_credential("delete a discussion")?;

        self.rest.close_as_deleted(&credential, number).await?;

        self.invalidate_listings();
        tracing::info!(number, "deleted discussion");
        Ok(())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
