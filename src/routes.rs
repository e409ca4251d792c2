//! Centralized route configuration for the survey-manager API.
//!
//! Shared between the main server and the test servers so both run the same
//! routing setup.

use crate::handlers::{main_handlers, response_handlers, survey_handlers, user_handlers};
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public endpoints (no auth required)
            .route("/health", web::get().to(main_handlers::health_check))
            .route("/auth/register", web::post().to(user_handlers::register))
            .route("/auth/login", web::post().to(user_handlers::login))
            .route("/surveys", web::get().to(survey_handlers::list_surveys))
            // Protected endpoints
            .route("/surveys", web::post().to(survey_handlers::create_survey))
            // Registered before /surveys/{id} so "dashboard" is not parsed as an id
            .route(
                "/surveys/dashboard",
                web::get().to(survey_handlers::dashboard),
            )
            .route("/surveys/{id}", web::get().to(survey_handlers::get_survey))
            .route(
                "/surveys/{id}",
                web::put().to(survey_handlers::update_survey),
            )
            .route(
                "/surveys/{id}",
                web::delete().to(survey_handlers::delete_survey),
            )
            .route(
                "/surveys/{id}/responses",
                web::post().to(response_handlers::submit_answer),
            )
            .route(
                "/surveys/{id}/analytics",
                web::get().to(response_handlers::get_survey_analytics),
            ),
    );
}
