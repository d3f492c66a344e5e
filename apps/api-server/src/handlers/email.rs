//! The email dispatch endpoint.
//!
//! Clients post `{type, to?, subject?, html?, blogData?, subscribers?}` and
//! always receive `{success, data}` or `{success: false, error}`. Every
//! response carries permissive CORS headers.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder, web};
use serde_json::json;

use quill_core::email::{PostSummary, Recipient};
use quill_core::ports::EmailMessage;
use quill_core::services::NotificationJob;
use quill_shared::EmailDispatchResponse;
use quill_shared::dto::{BlogData, EmailDispatchRequest, EmailKind, RecipientData};

use crate::middleware::auth::AdminIdentity;
use crate::state::AppState;

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    (
        "Access-Control-Allow-Headers",
        "authorization, x-client-info, apikey, content-type",
    ),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
];

fn with_cors(status: StatusCode) -> HttpResponseBuilder {
    let mut builder = HttpResponse::build(status);
    for header in CORS_HEADERS {
        builder.insert_header(header);
    }
    builder
}

fn failed(status: StatusCode, error: impl Into<String>) -> HttpResponse {
    with_cors(status).json(EmailDispatchResponse::<()>::failed(error))
}

/// OPTIONS /api/email
pub async fn preflight() -> HttpResponse {
    with_cors(StatusCode::OK).finish()
}

/// POST /api/email
pub async fn dispatch(
    state: web::Data<AppState>,
    admin: Option<AdminIdentity>,
    body: web::Bytes,
) -> HttpResponse {
    if admin.is_none() {
        return failed(StatusCode::UNAUTHORIZED, "Admin authentication required");
    }

    let request: EmailDispatchRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected email dispatch request");
            return failed(StatusCode::BAD_REQUEST, format!("Invalid request: {e}"));
        }
    };

    match handle(&state, request).await {
        Ok(data) => with_cors(StatusCode::OK).json(EmailDispatchResponse::ok(data)),
        Err(error) => {
            tracing::error!(error = %error, "Email dispatch failed");
            failed(StatusCode::BAD_REQUEST, error)
        }
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("Missing required field: {field}"))
}

async fn handle(
    state: &AppState,
    request: EmailDispatchRequest,
) -> Result<serde_json::Value, String> {
    let templates = &state.templates;

    let message = match request.kind {
        EmailKind::Test => {
            let to = required(request.to, "to")?;
            templates
                .test(&to, request.subject.as_deref())
                .map_err(|e| e.to_string())?
        }
        EmailKind::Welcome => {
            let to = required(request.to, "to")?;
            match request.html.filter(|html| !html.trim().is_empty()) {
                Some(html) => EmailMessage {
                    to,
                    subject: request.subject.unwrap_or_else(|| {
                        format!("Welcome to the {} newsletter!", templates.site().name)
                    }),
                    html,
                },
                None => templates.welcome(&to, None).map_err(|e| e.to_string())?,
            }
        }
        EmailKind::BlogNotification => {
            let blog = request
                .blog_data
                .ok_or("Missing required field: blogData")?;
            let recipients = request
                .subscribers
                .ok_or("Missing required field: subscribers")?;

            let report = state
                .dispatcher
                .dispatch(NotificationJob {
                    post: summary(blog),
                    recipients: recipients.into_iter().map(recipient).collect(),
                })
                .await;
            return serde_json::to_value(report).map_err(|e| e.to_string());
        }
    };

    let receipt = state
        .mailer
        .send(&message)
        .await
        .map_err(|e| e.to_string())?;
    Ok(json!({ "id": receipt.id, "to": message.to }))
}

fn summary(blog: BlogData) -> PostSummary {
    PostSummary {
        title: blog.title,
        slug: blog.slug,
        excerpt: blog.excerpt,
        topic: blog.topic,
        tags: blog.tags,
        reading_time_minutes: blog.reading_time_minutes,
        published_at: blog.published_at.or(blog.created_at),
    }
}

fn recipient(data: RecipientData) -> Recipient {
    Recipient {
        email: data.email,
        name: data.name,
    }
}
