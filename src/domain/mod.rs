pub mod comment;
pub mod discussion;
pub mod identity;

pub use comment::Comment;
pub use discussion::{Author, Discussion, NewDiscussion, ReactionKind, ALL_CATEGORIES};
pub use identity::{Credential, Identity, LoginSyncMarker};
