//! Newsletter subscription endpoints.

use actix_web::{HttpResponse, web};

use quill_core::domain::SubscriptionState;
use quill_shared::ApiResponse;
use quill_shared::dto::{EmailParams, SubscribeRequest, SubscriptionStatus};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn required_email(params: Option<EmailParams>) -> AppResult<String> {
    params
        .and_then(|p| p.email)
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::Validation(vec!["Email is required".to_string()]))
}

fn status(email: String, state: SubscriptionState) -> SubscriptionStatus {
    SubscriptionStatus {
        email,
        state: state.as_str().to_string(),
        is_active: state.is_active(),
    }
}

/// POST /api/newsletter/subscribe
pub async fn subscribe(
    state: web::Data<AppState>,
    body: web::Json<SubscribeRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let subscriber = state.subscriptions.subscribe(&req.email, req.name).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        status(subscriber.email, SubscriptionState::Active),
        "Successfully subscribed! Check your inbox for a welcome email.",
    )))
}

async fn unsubscribe(state: &AppState, email: String) -> AppResult<HttpResponse> {
    let result = state.subscriptions.unsubscribe(&email).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        status(email.to_lowercase(), result),
        "You have been unsubscribed.",
    )))
}

/// GET /api/newsletter/unsubscribe?email=
///
/// The target of the link in every newsletter email.
pub async fn unsubscribe_link(
    state: web::Data<AppState>,
    query: web::Query<EmailParams>,
) -> AppResult<HttpResponse> {
    let email = required_email(Some(query.into_inner()))?;
    unsubscribe(&state, email).await
}

/// POST /api/newsletter/unsubscribe, email in the body or the query string.
pub async fn unsubscribe_form(
    state: web::Data<AppState>,
    query: web::Query<EmailParams>,
    body: Option<web::Json<EmailParams>>,
) -> AppResult<HttpResponse> {
    let from_body = body.map(web::Json::into_inner).filter(|p| p.email.is_some());
    let email = required_email(from_body.or(Some(query.into_inner())))?;
    unsubscribe(&state, email).await
}

/// GET /api/newsletter/status?email=
pub async fn subscription_status(
    state: web::Data<AppState>,
    query: web::Query<EmailParams>,
) -> AppResult<HttpResponse> {
    let email = required_email(Some(query.into_inner()))?;
    let current = state.subscriptions.state(&email).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(status(email.to_lowercase(), current))))
}
