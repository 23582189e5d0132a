use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::app::{Result, SyncError};

/// An input that submits a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    CommentForm,
    NewDiscussionForm,
    Reaction,
    Delete,
}

impl Control {
    fn action(self) -> &'static str {
        match self {
            Control::CommentForm => "posting a comment",
            Control::NewDiscussionForm => "creating a discussion",
            Control::Reaction => "adding a reaction",
            Control::Delete => "deleting a discussion",
        }
    }
}

/// Set of currently disabled controls.
#[derive(Debug, Clone, Default)]
pub struct Controls {
    disabled: Arc<Mutex<HashSet<Control>>>,
}

impl Controls {
    /// Disable `control` until the returned guard drops.
    pub fn disable(&self, control: Control) -> Result<ControlGuard> {
        let mut disabled = self.disabled.lock().unwrap_or_else(|e| e.into_inner());
        if !disabled.insert(control) {
            return Err(SyncError::Validation(format!(
                "{} already in progress",
                control.action()
            )));
        }
        Ok(ControlGuard {
            control,
            disabled: self.disabled.clone(),
        })
    }

    pub fn is_enabled(&self, control: Control) -> bool {
        !self
            .disabled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&control)
    }
}

#[must_use]
pub struct ControlGuard {
    control: Control,
    disabled: Arc<Mutex<HashSet<Control>>>,
}

impl Drop for ControlGuard {
    fn drop(&mut self) {
        self.disabled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.control);
    }
}
