use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Replies nested deeper than this are flattened onto their ancestor.
pub const DEFAULT_MAX_DEPTH: usize = 1;

/// Moderation status of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Pending,
    Approved,
    Rejected,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(DomainError::validation(format!(
                "Unknown comment status: {other}"
            ))),
        }
    }
}

/// Comment entity. `parent_id` makes comments a tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
}

/// A comment as submitted by a reader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewComment {
    pub post_id: Option<Uuid>,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

impl NewComment {
    /// Trim every field and build an approved comment.
    ///
    /// Fails listing each missing field. Author identity is not verified.
    pub fn into_comment(self, now: DateTime<Utc>) -> Result<Comment, DomainError> {
        let author_name = self.author_name.trim().to_string();
        let author_email = self.author_email.trim().to_string();
        let content = self.content.trim().to_string();

        let mut errors = Vec::new();
        if self.post_id.is_none() {
            errors.push("Post id is required".to_string());
        }
        if author_name.is_empty() {
            errors.push("Name is required".to_string());
        }
        if author_email.is_empty() {
            errors.push("Email is required".to_string());
        }
        if content.is_empty() {
            errors.push("Comment content is required".to_string());
        }

        match self.post_id {
            Some(post_id) if errors.is_empty() => Ok(Comment {
                id: Uuid::new_v4(),
                post_id,
                parent_id: self.parent_id,
                author_name,
                author_email,
                content,
                status: CommentStatus::Approved,
                created_at: now,
            }),
            _ => Err(DomainError::Validation(errors)),
        }
    }
}

/// A comment with its displayed replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub depth: usize,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of comments in this subtree, including this one.
    pub fn size(&self) -> usize {
        1 + self.replies.iter().map(CommentNode::size).sum::<usize>()
    }
}

/// Ancestors of `idx`, nearest first. `None` when the chain loops.
fn ancestors(
    idx: usize,
    comments: &[Comment],
    index: &HashMap<Uuid, usize>,
) -> Option<Vec<usize>> {
    let mut chain = Vec::new();
    let mut seen = HashSet::from([idx]);
    let mut current = idx;

    while let Some(parent) = comments[current].parent_id.and_then(|p| index.get(&p)) {
        if !seen.insert(*parent) {
            return None;
        }
        chain.push(*parent);
        current = *parent;
    }
    Some(chain)
}

/// Rebuild the reply tree from a flat, oldest-first list.
///
/// A comment whose parent is unknown (deleted, or on another post) is
/// promoted to a root rather than dropped. Replies deeper than `max_depth`
/// are attached to their ancestor at depth `max_depth - 1`, so nothing is
/// lost and the tree never grows past `max_depth`. Order within each level
/// follows the input order.
pub fn build_tree(comments: Vec<Comment>, max_depth: usize) -> Vec<CommentNode> {
    let index: HashMap<Uuid, usize> = comments
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id, i))
        .collect();

    let mut roots = Vec::new();
    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();

    for idx in 0..comments.len() {
        let chain = ancestors(idx, &comments, &index).unwrap_or_default();
        let depth = chain.len();

        let parent = if depth == 0 || max_depth == 0 {
            None
        } else if depth <= max_depth {
            chain.first().copied()
        } else {
            chain.get(depth - max_depth).copied()
        };

        match parent {
            Some(parent) => children.entry(parent).or_default().push(idx),
            None => roots.push(idx),
        }
    }

    let mut slots: Vec<Option<Comment>> = comments.into_iter().map(Some).collect();
    roots
        .into_iter()
        .filter_map(|idx| assemble(idx, 0, &mut slots, &children))
        .collect()
}

fn assemble(
    idx: usize,
    depth: usize,
    slots: &mut [Option<Comment>],
    children: &HashMap<usize, Vec<usize>>,
) -> Option<CommentNode> {
    let comment = slots[idx].take()?;
    let replies = children
        .get(&idx)
        .map(|kids| {
            kids.iter()
                .filter_map(|kid| assemble(*kid, depth + 1, slots, children))
                .collect()
        })
        .unwrap_or_default();

    Some(CommentNode {
        comment,
        depth,
        replies,
    })
}
