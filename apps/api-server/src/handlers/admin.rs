//! Admin-only endpoints: post management, notifications, images and figures.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures::StreamExt;
use uuid::Uuid;

use quill_core::domain::PostInput;
use quill_core::domain::image::{ImageUpload, MAX_IMAGE_BYTES};
use quill_core::domain::page::DEFAULT_PAGE_SIZE;
use quill_shared::ApiResponse;
use quill_shared::dto::{CountResponse, EmailParams, PageParams};

use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/admin/posts - drafts included.
pub async fn list_posts(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    query: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let page = state
        .content
        .list_all(
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
}

/// POST /api/admin/posts
pub async fn create_post(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    body: web::Json<PostInput>,
) -> AppResult<HttpResponse> {
    let post = state.content.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        post,
        "Post created successfully",
    )))
}

/// GET /api/admin/posts/{id}
pub async fn get_post(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.content.get_by_id(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// PUT /api/admin/posts/{id}
pub async fn update_post(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    body: web::Json<PostInput>,
) -> AppResult<HttpResponse> {
    let post = state
        .content
        .update(id.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        post,
        "Post updated successfully",
    )))
}

/// DELETE /api/admin/posts/{id}
pub async fn delete_post(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.content.delete(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Post deleted successfully")))
}

/// POST /api/admin/posts/{id}/notify
///
/// Emails every active subscriber about a published post. Individual
/// delivery failures are reported, not raised.
pub async fn notify_subscribers(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.content.get_by_id(id.into_inner()).await?;
    let report = state.dispatcher.notify_subscribers(&post).await?;

    let message = format!(
        "Notified {} of {} subscribers",
        report.successful, report.total
    );
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(report, message)))
}

/// Read the `file` part of a multipart body, refusing anything larger than
/// an image may be.
async fn read_image(mut payload: Multipart) -> AppResult<ImageUpload> {
    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| AppError::BadRequest(e.to_string()))?;
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "upload.bin".to_string());
        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
            if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
                return Err(AppError::Validation(vec![
                    "File size too large. Please upload an image smaller than 5MB.".to_string(),
                ]));
            }
            bytes.extend_from_slice(&chunk);
        }

        return Ok(ImageUpload {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(AppError::Validation(vec!["No file provided".to_string()]))
}

/// POST /api/admin/images (multipart, field `file`)
pub async fn upload_image(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let upload = read_image(payload).await?;
    let image = state.content.upload_image(upload).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        image,
        "Image uploaded successfully",
    )))
}

/// GET /api/admin/dashboard
pub async fn dashboard(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let stats = state.content.dashboard().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(stats)))
}

/// GET /api/admin/subscribers/count
pub async fn subscriber_count(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let count = state.subscriptions.active_count().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(CountResponse { count })))
}

/// POST /api/admin/subscribers/reactivate
pub async fn reactivate_subscriber(
    _admin: AdminIdentity,
    state: web::Data<AppState>,
    body: web::Json<EmailParams>,
) -> AppResult<HttpResponse> {
    let email = body
        .into_inner()
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::Validation(vec!["Email is required".to_string()]))?;

    let subscriber = state.subscriptions.reactivate(&email).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        subscriber,
        "Subscription reactivated",
    )))
}
