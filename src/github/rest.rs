use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::app::Result;
use crate::config::Config;
use crate::domain::{
    Author, Comment, Credential, Discussion, Identity, NewDiscussion, ReactionKind,
};
use crate::fetcher::{RequestExecutor, RequestOptions};
use crate::github::{DiscussionSource, ListQuery, Protocol};

/// Title a discussion is renamed to when it is deleted. The platform has
/// no hard delete for issues, so deletion closes and renames.
pub const DELETED_TITLE: &str = "[Deleted]";

const DEFAULT_CATEGORY: &str = "general";

pub struct RestClient {
    executor: Arc<RequestExecutor>,
    rest_base: String,
    repo_url: String,
}

impl RestClient {
    pub fn new(executor: Arc<RequestExecutor>, config: &Config) -> Self {
        Self {
            executor,
            rest_base: config.endpoints.rest_base.trim_end_matches('/').to_string(),
            repo_url: config.repository_url(),
        }
    }

    fn authorize(
        &self,
        options: RequestOptions,
        credential: Option<&Credential>,
    ) -> Result<RequestOptions> {
        match credential {
            Some(credential) => options.bearer(credential),
            None => Ok(options),
        }
    }

    /// Open issues, one page, with the label filter applied locally.
    pub async fn list_issues(
        &self,
        credential: Option<&Credential>,
        query: &ListQuery,
    ) -> Result<Vec<Discussion>> {
        let url = format!(
            "{}/issues?state=open&per_page={}&page={}",
            self.repo_url, query.page_size, query.page
        );
        let options = self.authorize(self.executor.get(), credential)?;
        let issues: Vec<IssuePayload> = self.executor.execute(&url, options).await?.json()?;

        let discussions: Vec<Discussion> = issues
            .into_iter()
            .filter(|issue| issue.pull_request.is_none())
            .map(IssuePayload::into_discussion)
            .filter(|discussion| discussion.has_label_matching(&query.category))
            .collect();

        tracing::debug!(
            category = %query.category,
            page = query.page,
            count = discussions.len(),
            "listed issues"
        );
        Ok(discussions)
    }

    pub async fn get_issue(
        &self,
        credential: Option<&Credential>,
        number: u64,
    ) -> Result<Discussion> {
        let url = format!("{}/issues/{}", self.repo_url, number);
        let options = self.authorize(self.executor.get(), credential)?;
        let issue: IssuePayload = self.executor.execute(&url, options).await?.json()?;
        Ok(issue.into_discussion())
    }

    pub async fn list_comments(
        &self,
        credential: Option<&Credential>,
        number: u64,
    ) -> Result<Vec<Comment>> {
        let url = format!("{}/issues/{}/comments?per_page=100", self.repo_url, number);
        let options = self.authorize(self.executor.get(), credential)?;
        let comments: Vec<CommentPayload> = self.executor.execute(&url, options).await?.json()?;
        Ok(comments.into_iter().map(CommentPayload::into_comment).collect())
    }

    pub async fn create_issue(
        &self,
        credential: &Credential,
        draft: &NewDiscussion,
    ) -> Result<Discussion> {
        let url = format!("{}/issues", self.repo_url);
        let options = self
            .executor
            .post()
            .no_retry()
            .bearer(credential)?
            .json(&json!({
                "title": draft.title,
                "body": draft.body,
                "labels": draft.labels(),
            }))?;
        let issue: IssuePayload = self.executor.execute(&url, options).await?.json()?;
        Ok(issue.into_discussion())
    }

    pub async fn create_comment(
        &self,
        credential: &Credential,
        number: u64,
        body: &str,
    ) -> Result<Comment> {
        let url = format!("{}/issues/{}/comments", self.repo_url, number);
        let options = self
            .executor
            .post()
            .no_retry()
            .bearer(credential)?
            .json(&json!({ "body": body }))?;
        let comment: CommentPayload = self.executor.execute(&url, options).await?.json()?;
        Ok(comment.into_comment())
    }

    pub async fn add_reaction(
        &self,
        credential: &Credential,
        number: u64,
        kind: ReactionKind,
    ) -> Result<()> {
        let url = format!("{}/issues/{}/reactions", self.repo_url, number);
        let options = self
            .executor
            .post()
            .no_retry()
            .bearer(credential)?
            .json(&json!({ "content": kind.as_content() }))?;
        self.executor.execute(&url, options).await?;
        Ok(())
    }

    /// Close the issue and replace its title with [`DELETED_TITLE`].
    pub async fn close_as_deleted(&self, credential: &Credential, number: u64) -> Result<()> {
        let url = format!("{}/issues/{}", self.repo_url, number);
        let options = self
            .executor
            .patch()
            .no_retry()
            .bearer(credential)?
            .json(&json!({ "state": "closed", "title": DELETED_TITLE }))?;
        self.executor.execute(&url, options).await?;
        Ok(())
    }

    /// Resolve the account behind `credential`.
    pub async fn fetch_identity(&self, credential: &Credential) -> Result<Identity> {
        let url = format!("{}/user", self.rest_base);
        let options = self.executor.get().bearer(credential)?;
        let profile: ProfilePayload = self.executor.execute(&url, options).await?.json()?;
        Ok(profile.into_identity())
    }
}

#[async_trait]
impl DiscussionSource for RestClient {
    fn protocol(&self) -> Protocol {
        Protocol::Rest
    }

    fn accepts(&self, _credential: Option<&Credential>) -> bool {
        true
    }

    async fn list(
        &self,
        credential: Option<&Credential>,
        query: &ListQuery,
    ) -> Result<Vec<Discussion>> {
        self.list_issues(credential, query).await
    }

    async fn create(&self, credential: &Credential, draft: &NewDiscussion) -> Result<Discussion> {
        self.create_issue(credential, draft).await
    }
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    login: String,
    #[serde(default)]
    avatar_url: String,
}

impl UserPayload {
    fn into_author(self) -> Author {
        Author {
            login: self.login,
            avatar_url: self.avatar_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LabelPayload {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ReactionsPayload {
    #[serde(default)]
    total_count: u64,
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    id: u64,
    #[serde(default)]
    node_id: Option<String>,
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    user: Option<UserPayload>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    labels: Vec<LabelPayload>,
    #[serde(default)]
    comments: u64,
    #[serde(default)]
    reactions: Option<ReactionsPayload>,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

impl IssuePayload {
    fn into_discussion(self) -> Discussion {
        let labels: Vec<String> = self.labels.into_iter().map(|l| l.name).collect();
        let category = labels
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        Discussion {
            id: self.node_id.unwrap_or_else(|| self.id.to_string()),
            number: self.number,
            title: self.title,
            body: self.body.unwrap_or_default(),
            author: self
                .user
                .map(UserPayload::into_author)
                .unwrap_or_else(Author::ghost),
            created_at: self.created_at,
            category,
            comment_count: self.comments,
            reaction_count: self.reactions.map(|r| r.total_count).unwrap_or(0),
            labels,
            url: self.html_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommentPayload {
    id: u64,
    #[serde(default)]
    user: Option<UserPayload>,
    #[serde(default)]
    body: Option<String>,
    created_at: DateTime<Utc>,
}

impl CommentPayload {
    fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            author: self
                .user
                .map(UserPayload::into_author)
                .unwrap_or_else(Author::ghost),
            body: self.body.unwrap_or_default(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProfilePayload {
    login: String,
    id: u64,
    #[serde(default)]
    avatar_url: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl ProfilePayload {
    fn into_identity(self) -> Identity {
        let display_name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.login.clone());
        Identity {
            login: self.login,
            id: self.id,
            avatar_url: self.avatar_url,
            display_name,
            email: self.email,
        }
    }
}
