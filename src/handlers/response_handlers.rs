use super::main_handlers::AppState;
use crate::analytics;
use crate::error::AppError;
use crate::models::{SubmitAnswersRequest, SurveyResponse, UserInfo};
use actix_web::{web, HttpMessage, HttpResponse, Result};

fn authenticated_user(req: &actix_web::HttpRequest) -> Result<UserInfo, AppError> {
    req.extensions()
        .get::<UserInfo>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

/// Submission guard: one response per (survey, respondent). The early
/// existence check gives a clean 409 for the common case; the unique
/// constraint in the responses table enforces it under concurrency.
pub async fn submit_answer(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<SubmitAnswersRequest>,
    http_req: actix_web::HttpRequest,
) -> Result<HttpResponse, AppError> {
    let survey_id = path.into_inner();
    let req = request.into_inner();
    let user = authenticated_user(&http_req)?;

    let survey = data.database.get_survey_by_id(survey_id)?;
    if !survey.accepting_responses {
        return Err(AppError::InvalidRequest(
            "This survey is no longer accepting responses".to_string(),
        ));
    }

    if data.database.response_exists(survey_id, user.id)? {
        return Err(AppError::DuplicateSubmission(
            "You have already completed this survey".to_string(),
        ));
    }

    let mut response = SurveyResponse::new(survey_id, user.id, req.answers);
    let response_id = data.database.create_response(&response)?;
    response.id = response_id;

    Ok(HttpResponse::Created().json(response))
}

/// Aggregated analytics for a survey, recomputed from the stored responses
/// on every read. Restricted to the survey's creator.
pub async fn get_survey_analytics(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    http_req: actix_web::HttpRequest,
) -> Result<HttpResponse, AppError> {
    let survey_id = path.into_inner();
    let user = authenticated_user(&http_req)?;

    let survey = data.database.get_survey_by_id(survey_id)?;
    if survey.creator_id != user.id {
        return Err(AppError::Forbidden(
            "Only the survey creator can view analytics".to_string(),
        ));
    }

    let responses = data.database.get_responses_for_survey(survey_id)?;
    let identities = data.database.get_respondent_identities(survey_id)?;

    let report = analytics::aggregate(&survey, &responses, &identities);

    Ok(HttpResponse::Ok().json(report))
}
