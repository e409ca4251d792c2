use super::main_handlers::AppState;
use crate::auth;
use crate::error::AppError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, User, UserInfo, UserResponse};
use actix_web::{web, HttpResponse, Result};

pub async fn register(
    data: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let req = request.into_inner();

    if req.username.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Username cannot be empty".to_string(),
        ));
    }
    if req.email.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Email cannot be empty".to_string(),
        ));
    }
    if req.password.is_empty() {
        return Err(AppError::InvalidRequest(
            "Password cannot be empty".to_string(),
        ));
    }

    // Check if the username is already taken; the unique columns in the
    // users table are the backstop for concurrent registrations.
    if data.database.get_user_by_username(&req.username).is_ok() {
        return Err(AppError::InvalidRequest(
            "Username already exists".to_string(),
        ));
    }

    let password_hash = auth::hash_password(&req.password)?;

    let user = User::new(req.username, req.email, password_hash);
    let user_id = data.database.create_user(&user)?;
    let mut user = user;
    user.id = user_id;

    let response = UserResponse { user };
    Ok(HttpResponse::Created().json(response))
}

pub async fn login(
    data: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let req = request.into_inner();

    let user = data
        .database
        .get_user_by_username(&req.username)
        .map_err(|_| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !auth::verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let config = data
        .config
        .read()
        .map_err(|e| AppError::Internal(format!("Failed to acquire config read lock: {}", e)))?;

    let jwt_secret = config
        .auth
        .as_ref()
        .and_then(|a| a.jwt_secret.as_ref())
        .ok_or_else(|| AppError::Internal("JWT secret not configured".to_string()))?;

    let claims = auth::Claims::new(user.id, user.username.clone());
    let token = auth::generate_token(&claims, jwt_secret)?;

    tracing::info!("User {} logged in", user.username);

    let response = LoginResponse {
        token,
        user: UserInfo {
            id: user.id,
            username: user.username,
            email: user.email,
        },
    };
    Ok(HttpResponse::Ok().json(response))
}
