//! HTTP handlers and route configuration.

mod admin;
mod auth;
mod comments;
mod email;
mod health;
mod newsletter;
mod posts;


use actix_web::{guard, web};

use crate::middleware::error::AppError;
use crate::middleware::rate_limit::RateLimit;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("/search", web::get().to(posts::search))
                    .route("/featured", web::get().to(posts::featured))
                    .route("/popular", web::get().to(posts::popular))
                    .route("/topic/{topic}", web::get().to(posts::by_topic))
                    .service(
                        web::resource("/{id}/like")
                            .wrap(RateLimit)
                            .route(web::post().to(posts::like)),
                    )
                    .route("/{id}/stats", web::get().to(posts::stats))
                    .service(
                        web::resource("/{id}/comments")
                            .guard(guard::Post())
                            .wrap(RateLimit)
                            .to(comments::create),
                    )
                    .route("/{id}/comments", web::get().to(comments::list))
                    .route("/{slug}", web::get().to(posts::get_by_slug)),
            )
            .service(
                web::scope("/newsletter")
                    .service(
                        web::resource("/subscribe")
                            .wrap(RateLimit)
                            .route(web::post().to(newsletter::subscribe)),
                    )
                    .service(
                        web::resource("/unsubscribe")
                            .route(web::get().to(newsletter::unsubscribe_link))
                            .route(web::post().to(newsletter::unsubscribe_form)),
                    )
                    .route("/status", web::get().to(newsletter::subscription_status)),
            )
            // Admin routes; every handler takes an AdminIdentity
            .service(
                web::scope("/admin")
                    .service(
                        web::resource("/posts")
                            .route(web::get().to(admin::list_posts))
                            .route(web::post().to(admin::create_post)),
                    )
                    .service(
                        web::resource("/posts/{id}")
                            .route(web::get().to(admin::get_post))
                            .route(web::put().to(admin::update_post))
                            .route(web::delete().to(admin::delete_post)),
                    )
                    .route("/posts/{id}/notify", web::post().to(admin::notify_subscribers))
                    .route("/images", web::post().to(admin::upload_image))
                    .route("/dashboard", web::get().to(admin::dashboard))
                    .route("/subscribers/count", web::get().to(admin::subscriber_count))
                    .route(
                        "/subscribers/reactivate",
                        web::post().to(admin::reactivate_subscriber),
                    ),
            )
            .service(
                web::resource("/email")
                    .route(web::method(actix_web::http::Method::OPTIONS).to(email::preflight))
                    .route(web::post().to(email::dispatch)),
            ),
    );
}
