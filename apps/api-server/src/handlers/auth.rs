//! Admin authentication handlers.

use actix_web::{HttpResponse, web};

use quill_core::ports::ADMIN_ROLE;
use quill_shared::ApiResponse;
use quill_shared::dto::{AdminProfile, AuthResponse, LoginRequest};

use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let email = req.email.trim().to_lowercase();

    let admin = &state.admin;
    let Some(hash) = admin.password_hash.clone() else {
        tracing::warn!("Login attempted but no admin password is configured");
        return Err(AppError::Unauthorized);
    };
    if admin.email.is_empty() || !admin.email.eq_ignore_ascii_case(&email) {
        return Err(AppError::Unauthorized);
    }

    // Argon2 verification blocks; run it on the blocking pool.
    let passwords = state.passwords.clone();
    let valid = web::block(move || passwords.verify(&req.password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        tracing::warn!("Admin login failed");
        return Err(AppError::Unauthorized);
    }

    let token = state
        .tokens
        .generate_token("admin", &admin.email, vec![ADMIN_ROLE.to_string()])
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!("Admin logged in");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: u64::try_from(state.tokens.expiration_seconds()).unwrap_or(0),
    })))
}

/// GET /api/auth/me
pub async fn me(admin: AdminIdentity) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(AdminProfile {
        email: admin.email,
        roles: admin.roles,
        expires_at: admin.expires_at,
    })))
}
