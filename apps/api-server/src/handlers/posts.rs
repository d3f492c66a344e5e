//! Public post endpoints.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::LikeState;
use quill_core::domain::page::DEFAULT_PAGE_SIZE;
use quill_core::services::DEFAULT_FEATURED_LIMIT;
use quill_shared::ApiResponse;
use quill_shared::dto::{LikeResponse, ListParams, PageParams, SearchParams};

use crate::middleware::error::AppResult;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: u64 = 10;
const DEFAULT_POPULAR_LIMIT: u64 = 5;
const DEFAULT_POPULAR_DAYS: i64 = 30;

/// GET /api/posts?page=&page_size=
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let page = state
        .content
        .list_published(
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
}

/// GET /api/posts/search?q=
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchParams>,
) -> AppResult<HttpResponse> {
    let posts = state.content.search(&query.q).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// GET /api/posts/featured?limit=
pub async fn featured(
    state: web::Data<AppState>,
    query: web::Query<ListParams>,
) -> AppResult<HttpResponse> {
    let posts = state
        .content
        .featured(query.limit.unwrap_or(DEFAULT_FEATURED_LIMIT))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// GET /api/posts/popular?limit=&days=
pub async fn popular(
    state: web::Data<AppState>,
    query: web::Query<ListParams>,
) -> AppResult<HttpResponse> {
    let posts = state
        .content
        .popular(
            query.limit.unwrap_or(DEFAULT_POPULAR_LIMIT),
            query.days.unwrap_or(DEFAULT_POPULAR_DAYS),
        )
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// GET /api/posts/topic/{topic}?limit=
pub async fn by_topic(
    state: web::Data<AppState>,
    topic: web::Path<String>,
    query: web::Query<ListParams>,
) -> AppResult<HttpResponse> {
    let posts = state
        .content
        .by_topic(&topic, query.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// GET /api/posts/{slug}
///
/// Reading a post counts a view. A failed increment is logged and the post
/// is still served.
pub async fn get_by_slug(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let mut post = state.content.get_by_slug(&slug).await?;

    match state.content.increment_views(post.id).await {
        Ok(views) => post.view_count = views,
        Err(e) => tracing::warn!(post_id = %post.id, error = %e, "Failed to count view"),
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// POST /api/posts/{id}/like
pub async fn like(state: web::Data<AppState>, id: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let update = state.content.like(id.into_inner()).await?;
    let body = LikeResponse {
        state: update.state.as_str().to_string(),
        like_count: update.displayed,
    };

    Ok(match update.state {
        LikeState::Reverted => HttpResponse::ServiceUnavailable().json(ApiResponse {
            success: false,
            data: Some(body),
            message: Some("Your like could not be saved. Please try again.".to_string()),
        }),
        _ => HttpResponse::Ok().json(ApiResponse::ok(body)),
    })
}

/// GET /api/posts/{id}/stats
pub async fn stats(state: web::Data<AppState>, id: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let stats = state.content.stats(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(stats)))
}
