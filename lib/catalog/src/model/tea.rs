//! Teas and the comments left on them.

use pantry_core::{CommentId, TeaId, UserId};
use pantry_identity::UserSummary;
use serde::{Deserialize, Serialize};

/// A tea record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tea {
    /// Tea ID.
    pub id: TeaId,
    /// Unique name.
    pub name: String,
    /// Whether the tea is currently in stock.
    pub in_stock: bool,
    /// Rating given by the owner.
    pub rating: f64,
    /// The owning user. Set at creation and never changed.
    pub user_id: UserId,
}

impl Tea {
    /// Creates a tea owned by `owner` with a generated ID.
    #[must_use]
    pub fn new(new: NewTea, owner: UserId) -> Self {
        Self {
            id: TeaId::new(),
            name: new.name,
            in_stock: new.in_stock,
            rating: new.rating,
            user_id: owner,
        }
    }
}

/// Payload for creating a tea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewTea {
    pub name: String,
    pub in_stock: bool,
    pub rating: f64,
}

/// A comment on a tea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment ID.
    pub id: CommentId,
    pub content: String,
    /// The tea this comment belongs to.
    pub tea_id: TeaId,
}

impl Comment {
    /// Creates a comment with a generated ID.
    #[must_use]
    pub fn new(new: NewComment) -> Self {
        Self {
            id: CommentId::new(),
            content: new.content,
            tea_id: new.tea_id,
        }
    }
}

/// Payload for creating a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewComment {
    pub content: String,
    pub tea_id: TeaId,
}

/// A tea as returned to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeaView {
    #[serde(flatten)]
    pub tea: Tea,
    /// The owning user.
    pub user: UserSummary,
    pub comments: Vec<Comment>,
}
