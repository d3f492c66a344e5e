//! Comment subsystem.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::comment::DEFAULT_MAX_DEPTH;
use crate::domain::{Comment, CommentNode, CommentStatus, NewComment, build_tree};
use crate::error::{DomainError, RepoError};
use crate::ports::{CommentRepository, PostRepository};

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
    max_depth: usize,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self {
            comments,
            posts,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Approved comments on a post, oldest first.
    pub async fn list(&self, post_id: Uuid) -> Result<Vec<Comment>, DomainError> {
        Ok(self
            .comments
            .list_for_post(post_id, CommentStatus::Approved)
            .await?)
    }

    /// Approved comments arranged as reply threads.
    ///
    /// `max_depth` overrides the configured nesting cap.
    pub async fn thread(
        &self,
        post_id: Uuid,
        max_depth: Option<usize>,
    ) -> Result<Vec<CommentNode>, DomainError> {
        let comments = self.list(post_id).await?;
        Ok(build_tree(comments, max_depth.unwrap_or(self.max_depth)))
    }

    pub async fn add(&self, new: NewComment) -> Result<Comment, DomainError> {
        let comment = new.into_comment(Utc::now())?;

        match self.posts.find_by_id(comment.post_id).await? {
            Some(post) if post.is_published => {}
            _ => return Err(DomainError::not_found("Post", comment.post_id)),
        }

        if let Some(parent_id) = comment.parent_id {
            match self.comments.find_by_id(parent_id).await? {
                Some(parent) if parent.post_id == comment.post_id => {}
                Some(_) => {
                    return Err(DomainError::validation(
                        "Parent comment belongs to a different post",
                    ));
                }
                None => return Err(DomainError::validation("Parent comment not found")),
            }
        }

        let comment = self.comments.insert(comment).await.map_err(|e| match e {
            RepoError::PermissionDenied(msg) => {
                tracing::warn!(error = %msg, "Comment insert rejected by store");
                DomainError::Permission(
                    "Permission denied. Please try again or contact support.".to_string(),
                )
            }
            other => DomainError::Backend(other.to_string()),
        })?;

        if let Err(e) = self.posts.increment_comments(comment.post_id).await {
            tracing::warn!(post_id = %comment.post_id, error = %e, "Comment counter not updated");
        }

        tracing::info!(
            comment_id = %comment.id,
            post_id = %comment.post_id,
            reply = comment.parent_id.is_some(),
            "Comment added"
        );
        Ok(comment)
    }
}
