//! Rate limiting middleware for public write endpoints.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
    web,
};
use std::future::{Ready, ready};
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use quill_core::ports::RateLimitDecision;
use quill_shared::ErrorResponse;

use crate::state::AppState;

/// Limits each client, keyed by its real IP, using the limiter in
/// [`AppState`]. Backend failures let the request through.
pub struct RateLimit;

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService {
            service: Rc::new(service),
        }))
    }
}

pub struct RateLimitService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let limiter = req
                .app_data::<web::Data<AppState>>()
                .map(|state| state.rate_limiter.clone());
            let key = req
                .connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
                .to_string();

            let decision = match limiter {
                Some(limiter) => limiter.check(&key).await,
                None => Ok(RateLimitDecision::Allowed),
            };

            match decision {
                Ok(RateLimitDecision::Limited { retry_after }) => {
                    let seconds = retry_after.as_secs().max(1);
                    tracing::warn!(client = %key, path = %req.path(), "Rate limit exceeded");

                    let error = ErrorResponse::too_many_requests().with_detail(format!(
                        "Rate limit exceeded. Try again in {seconds} seconds."
                    ));
                    let response = HttpResponse::TooManyRequests()
                        .insert_header((header::RETRY_AFTER, seconds.to_string()))
                        .json(error);

                    Ok(req.into_response(response).map_into_right_body())
                }
                Ok(RateLimitDecision::Allowed) => {
                    Ok(service.call(req).await?.map_into_left_body())
                }
                Err(e) => {
                    tracing::error!(error = %e, "Rate limiter error, failing open");
                    Ok(service.call(req).await?.map_into_left_body())
                }
            }
        })
    }
}
