use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category value that disables category filtering.
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub login: String,
    pub avatar_url: String,
}

impl Author {
    /// Placeholder for content whose author account no longer exists.
    pub fn ghost() -> Self {
        Self {
            login: "ghost".to_string(),
            avatar_url: String::new(),
        }
    }
}

/// Read-only projection of a remote discussion thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: String,
    pub number: u64,
    pub title: String,
    pub body: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub category: String,
    pub comment_count: u64,
    pub reaction_count: u64,
    pub labels: Vec<String>,
    pub url: String,
}

impl Discussion {
    pub fn matches_category(&self, category: &str) -> bool {
        category == ALL_CATEGORIES || contains_ignore_case(&self.category, category)
    }

    pub fn has_label_matching(&self, category: &str) -> bool {
        category == ALL_CATEGORIES
            || self
                .labels
                .iter()
                .any(|label| contains_ignore_case(label, category))
    }

    /// Case-insensitive substring match on title or body. An empty query matches everything.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty()
            || contains_ignore_case(&self.title, query)
            || contains_ignore_case(&self.body, query)
    }

    pub fn is_authored_by(&self, login: &str) -> bool {
        self.author.login == login
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Draft for a new discussion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDiscussion {
    pub title: String,
    pub body: String,
    pub category: String,
    pub tags: Vec<String>,
}

impl NewDiscussion {
    /// Body with category and tags appended as plain text, for protocols
    /// that cannot attach labels.
    pub fn body_with_metadata(&self) -> String {
        let mut body = self.body.clone();
        body.push_str("\n\n---\n");
        body.push_str(&format!("Category: {}", self.category));
        if !self.tags.is_empty() {
            body.push_str(&format!("\nTags: {}", self.tags.join(", ")));
        }
        body
    }

    /// Category followed by tags, empty entries dropped.
    pub fn labels(&self) -> Vec<String> {
        std::iter::once(&self.category)
            .chain(self.tags.iter())
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
            .map(String::from)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionKind {
    ThumbsUp,
    ThumbsDown,
    Laugh,
    Confused,
    Heart,
    Hooray,
    Rocket,
    Eyes,
}

impl ReactionKind {
    /// Content string understood by the REST reactions endpoint.
    pub fn as_content(self) -> &'static str {
        match self {
            ReactionKind::ThumbsUp => "+1",
            ReactionKind::ThumbsDown => "-1",
            ReactionKind::Laugh => "laugh",
            ReactionKind::Confused => "confused",
            ReactionKind::Heart => "heart",
            ReactionKind::Hooray => "hooray",
            ReactionKind::Rocket => "rocket",
            ReactionKind::Eyes => "eyes",
        }
    }
}

impl std::str::FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "+1" | "thumbs_up" | "like" => Ok(ReactionKind::ThumbsUp),
            "-1" | "thumbs_down" => Ok(ReactionKind::ThumbsDown),
            "laugh" => Ok(ReactionKind::Laugh),
            "confused" => Ok(ReactionKind::Confused),
            "heart" => Ok(ReactionKind::Heart),
            "hooray" => Ok(ReactionKind::Hooray),
            "rocket" => Ok(ReactionKind::Rocket),
            "eyes" => Ok(ReactionKind::Eyes),
            other => Err(format!("Unknown reaction: {}", other)),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample(number: u64, category: &str, labels: &[&str]) -> Discussion {
    Discussion {
        id: format!("D_{}", number),
        number,
        title: format!("Discussion {}", number),
        body: "Body text".to_string(),
        author: Author {
            login: "octocat".to_string(),
            avatar_url: String::new(),
        },
        created_at: Utc::now(),
        category: category.to_string(),
        comment_count: 0,
        reaction_count: 0,
        labels: labels.iter().map(|l| l.to_string()).collect(),
        url: String::new(),
    }
}
