use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::{Result, SyncError};
use crate::config::Config;
use crate::domain::{Author, Credential, Discussion, NewDiscussion};
use crate::fetcher::RequestExecutor;
use crate::github::{DiscussionSource, ListQuery, Protocol};

/// Largest `first:` argument the endpoint accepts on a connection.
pub const MAX_WINDOW: u32 = 100;

const DISCUSSION_FIELDS: &str = r#"
    id
    number
    title
    body
    createdAt
    url
    author { login avatarUrl }
    category { name }
    comments { totalCount }
    reactions { totalCount }
    labels(first: 10) { nodes { name } }
"#;

fn list_query() -> String {
    format!(
        r#"query($owner: String!, $name: String!, $first: Int!) {{
  repository(owner: $owner, name: $name) {{
    discussions(first: $first, orderBy: {{field: CREATED_AT, direction: DESC}}) {{
      nodes {{ {fields} }}
    }}
  }}
}}"#,
        fields = DISCUSSION_FIELDS
    )
}

const REPOSITORY_QUERY: &str = r#"query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    id
    discussionCategories(first: 25) { nodes { id name } }
  }
}"#;

fn create_mutation() -> String {
    format!(
        r#"mutation($input: CreateDiscussionInput!) {{
  createDiscussion(input: $input) {{
    discussion {{ {fields} }}
  }}
}}"#,
        fields = DISCUSSION_FIELDS
    )
}

pub struct GraphqlClient {
    executor: Arc<RequestExecutor>,
    endpoint: String,
    owner: String,
    name: String,
}

impl GraphqlClient {
    pub fn new(executor: Arc<RequestExecutor>, config: &Config) -> Self {
        Self {
            executor,
            endpoint: config.endpoints.graphql_url.clone(),
            owner: config.repository.owner.clone(),
            name: config.repository.name.clone(),
        }
    }

    /// Read-only query; transient failures are retried.
    pub async fn query<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        query: &str,
        variables: Value,
    ) -> Result<T> {
        self.send(credential, query, variables, true).await
    }

    /// Mutation; sent exactly once.
    pub async fn mutate<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        mutation: &str,
        variables: Value,
    ) -> Result<T> {
        self.send(credential, mutation, variables, false).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        document: &str,
        variables: Value,
        retry: bool,
    ) -> Result<T> {
        let mut options = self.executor.post();
        if !retry {
            options = options.no_retry();
        }
        let options = options
            .bearer(credential)?
            .json(&json!({ "query": document, "variables": variables }))?;

        let envelope: Envelope<T> = self.executor.execute(&self.endpoint, options).await?.json()?;

        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(SyncError::Unknown(format!(
                "structured query rejected: {}",
                messages.join("; ")
            )));
        }

        envelope
            .data
            .ok_or_else(|| SyncError::Unknown("structured query returned no data".into()))
    }

    pub async fn list_discussions(
        &self,
        credential: &Credential,
        query: &ListQuery,
    ) -> Result<Vec<Discussion>> {
        let page = query.page.max(1);
        let window = page.saturating_mul(query.page_size);
        if window > MAX_WINDOW {
            return Err(SyncError::Unknown(format!(
                "page {} of size {} is beyond the structured-query window of {}",
                page, query.page_size, MAX_WINDOW
            )));
        }

        let data: ListData = self
            .query(
                credential,
                &list_query(),
                json!({ "owner": self.owner, "name": self.name, "first": window }),
            )
            .await?;

        let repository = data
            .repository
            .ok_or_else(|| SyncError::NotFound(format!("repository {}/{}", self.owner, self.name)))?;

        let skip = ((page - 1) * query.page_size) as usize;
        let discussions: Vec<Discussion> = repository
            .discussions
            .nodes
            .into_iter()
            .flatten()
            .skip(skip)
            .map(DiscussionNode::into_discussion)
            .filter(|discussion| discussion.matches_category(&query.category))
            .collect();

        tracing::debug!(
            category = %query.category,
            page,
            count = discussions.len(),
            "listed discussions"
        );
        Ok(discussions)
    }

    pub async fn create_discussion(
        &self,
        credential: &Credential,
        draft: &NewDiscussion,
    ) -> Result<Discussion> {
        let data: RepositoryData = self
            .query(
                credential,
                REPOSITORY_QUERY,
                json!({ "owner": self.owner, "name": self.name }),
            )
            .await?;
        let repository = data
            .repository
            .ok_or_else(|| SyncError::NotFound(format!("repository {}/{}", self.owner, self.name)))?;

        let category_id = pick_category(&repository.discussion_categories.nodes, &draft.category)
            .ok_or_else(|| {
                SyncError::Unknown("repository has no discussion categories".into())
            })?;

        let created: CreateData = self
            .mutate(
                credential,
                &create_mutation(),
                json!({
                    "input": {
                        "repositoryId": repository.id,
                        "categoryId": category_id,
                        "title": draft.title,
                        "body": draft.body_with_metadata(),
                    }
                }),
            )
            .await?;

        Ok(created.create_discussion.discussion.into_discussion())
    }
}

/// Case-insensitive name match, first category otherwise.
fn pick_category(categories: &[CategoryNode], wanted: &str) -> Option<String> {
    let wanted = wanted.to_lowercase();
    categories
        .iter()
        .find(|c| c.name.to_lowercase() == wanted)
        .or_else(|| categories.first())
        .map(|c| c.id.clone())
}

#[async_trait]
impl DiscussionSource for GraphqlClient {
    fn protocol(&self) -> Protocol {
        Protocol::Structured
    }

    fn accepts(&self, credential: Option<&Credential>) -> bool {
        credential.is_some()
    }

    async fn list(
        &self,
        credential: Option<&Credential>,
        query: &ListQuery,
    ) -> Result<Vec<Discussion>> {
        let credential = credential.ok_or_else(|| {
            SyncError::Authentication("structured queries require a credential".into())
        })?;
        self.list_discussions(credential, query).await
    }

    async fn create(&self, credential: &Credential, draft: &NewDiscussion) -> Result<Discussion> {
        self.create_discussion(credential, draft).await
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphqlErrorPayload>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorPayload {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ListData {
    repository: Option<ListRepository>,
}

#[derive(Debug, Deserialize)]
struct ListRepository {
    discussions: Connection<DiscussionNode>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<Option<T>>,
}

#[derive(Debug, Deserialize)]
struct TotalCount {
    #[serde(rename = "totalCount")]
    total_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActorNode {
    login: String,
    #[serde(default)]
    avatar_url: String,
}

#[derive(Debug, Deserialize)]
struct NamedNode {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscussionNode {
    id: String,
    number: u64,
    title: String,
    #[serde(default)]
    body: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    url: String,
    author: Option<ActorNode>,
    category: Option<NamedNode>,
    comments: Option<TotalCount>,
    reactions: Option<TotalCount>,
    labels: Option<Connection<NamedNode>>,
}

impl DiscussionNode {
    fn into_discussion(self) -> Discussion {
        Discussion {
            id: self.id,
            number: self.number,
            title: self.title,
            body: self.body,
            author: self
                .author
                .map(|a| Author {
                    login: a.login,
                    avatar_url: a.avatar_url,
                })
                .unwrap_or_else(Author::ghost),
            created_at: self.created_at,
            category: self.category.map(|c| c.name).unwrap_or_default(),
            comment_count: self.comments.map(|c| c.total_count).unwrap_or(0),
            reaction_count: self.reactions.map(|r| r.total_count).unwrap_or(0),
            labels: self
                .labels
                .map(|l| l.nodes.into_iter().flatten().map(|n| n.name).collect())
                .unwrap_or_default(),
            url: self.url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    id: String,
    discussion_categories: CategoryConnection,
}

#[derive(Debug, Deserialize)]
struct CategoryConnection {
    #[serde(default)]
    nodes: Vec<CategoryNode>,
}

#[derive(Debug, Clone, Deserialize)]
struct CategoryNode {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateData {
    create_discussion: CreatePayload,
}

#[derive(Debug, Deserialize)]
struct CreatePayload {
    discussion: DiscussionNode,
}
