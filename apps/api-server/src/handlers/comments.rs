//! Comment endpoints nested under a post.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::NewComment;
use quill_shared::ApiResponse;
use quill_shared::dto::{CreateCommentRequest, ThreadParams};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/posts/{id}/comments?threaded=&max_depth=
pub async fn list(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    query: web::Query<ThreadParams>,
) -> AppResult<HttpResponse> {
    let post_id = post_id.into_inner();

    if query.threaded {
        let threads = state.comments.thread(post_id, query.max_depth).await?;
        Ok(HttpResponse::Ok().json(ApiResponse::ok(threads)))
    } else {
        let comments = state.comments.list(post_id).await?;
        Ok(HttpResponse::Ok().json(ApiResponse::ok(comments)))
    }
}

/// POST /api/posts/{id}/comments
pub async fn create(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let comment = state
        .comments
        .add(NewComment {
            post_id: Some(post_id.into_inner()),
            author_name: req.author_name,
            author_email: req.author_email,
            content: req.content,
            parent_id: req.parent_id,
        })
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        comment,
        "Comment posted successfully!",
    )))
}
