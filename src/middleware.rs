use crate::auth::validate_token;
use crate::models::UserInfo;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    web, Error, HttpMessage,
};
use futures_util::future::{ready, Ready};

/// Authentication middleware that extracts the Bearer JWT and attaches user
/// info to the request.
pub struct AuthenticationMiddleware;

/// Health, register, login and the public survey listing are reachable
/// without a token.
fn is_public_route(path: &str, method: &str) -> bool {
    matches!(path, "/api/health" | "/api/auth/login" | "/api/auth/register")
        || (path == "/api/surveys" && method == "GET")
}

impl<S, B> Transform<S, ServiceRequest> for AuthenticationMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthenticationMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddlewareService { service }))
    }
}

pub struct AuthenticationMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future =
        futures_util::future::LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path().to_string();
        let method = req.method().to_string();

        if is_public_route(&path, &method) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        // Get the JWT secret from app state
        let jwt_secret = match req.app_data::<web::Data<crate::handlers::AppState>>() {
            Some(state) => match state.config.read() {
                Ok(config) => config
                    .auth
                    .as_ref()
                    .and_then(|a| a.jwt_secret.as_ref())
                    .cloned(),
                Err(_) => None,
            },
            None => None,
        };

        // If JWT secret is not configured, skip authentication (for tests)
        let Some(jwt_secret) = jwt_secret else {
            let test_user = UserInfo {
                id: 1,
                username: "testuser".to_string(),
                email: "test@example.com".to_string(),
            };
            req.extensions_mut().insert(test_user);
            let fut = self.service.call(req);
            return Box::pin(fut);
        };

        // Extract Authorization header
        let auth_header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        let auth_header = match auth_header {
            Some(h) => h,
            None => {
                tracing::warn!("Auth failed: missing Authorization header for {method} {path}");
                return Box::pin(async { Err(ErrorUnauthorized("Missing Authorization header")) });
            }
        };

        let token = match auth_header.strip_prefix("Bearer ") {
            Some(t) => t.to_string(),
            None => {
                tracing::warn!("Auth failed: invalid Authorization header format");
                return Box::pin(async {
                    Err(ErrorUnauthorized(
                        "Invalid Authorization header format. Expected 'Bearer <token>'",
                    ))
                });
            }
        };

        match validate_token(&token, &jwt_secret) {
            Ok(claims) => {
                let username = claims.username.clone();
                let user_info = UserInfo {
                    id: claims.sub.parse().unwrap_or(0),
                    username: claims.username,
                    email: "".to_string(), // Email is not stored in JWT claims
                };

                req.extensions_mut().insert(user_info);
                tracing::debug!("Auth successful for user: {}", username);

                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(_) => {
                tracing::warn!("Auth failed: invalid or expired token");
                Box::pin(async { Err(ErrorUnauthorized("Invalid or expired token")) })
            }
        }
    }
}
