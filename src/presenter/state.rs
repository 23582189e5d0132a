use crate::domain::{Comment, Discussion};

use super::notice::Notice;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    Idle,
    Loading,
    Loaded,
    Empty,
    Error(Notice),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentsState {
    Loading,
    Loaded(Vec<Comment>),
    /// Loading failed; the discussion itself is still shown.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub discussion: Discussion,
    pub comments: CommentsState,
    pub can_delete: bool,
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub list: ListState,
    pub filter: String,
    pub search: String,
    pub page: u32,
    pub page_size: u32,
    pub discussions: Vec<Discussion>,
    pub detail: Option<DetailView>,
}

impl ViewState {
    pub fn new(filter: impl Into<String>, page_size: u32) -> Self {
        Self {
            list: ListState::Idle,
            filter: filter.into(),
            search: String::new(),
            page: 1,
            page_size,
            discussions: Vec::new(),
            detail: None,
        }
    }

    /// Loaded discussions narrowed by the search text.
    pub fn visible(&self) -> Vec<Discussion> {
        self.discussions
            .iter()
            .filter(|d| d.matches_search(&self.search))
            .cloned()
            .collect()
    }

    pub fn find(&self, number: u64) -> Option<&Discussion> {
        self.discussions.iter().find(|d| d.number == number)
    }
}
