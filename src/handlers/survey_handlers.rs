use super::main_handlers::AppState;
use crate::error::AppError;
use crate::models::{
    CreateSurveyRequest, DashboardResponse, Question, Survey, SurveyEnvelope, SurveyListResponse,
    UpdateSurveyRequest, UserInfo,
};
use actix_web::{web, HttpMessage, HttpResponse, Result};

fn authenticated_user(req: &actix_web::HttpRequest) -> Result<UserInfo, AppError> {
    req.extensions()
        .get::<UserInfo>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

fn validate_questions(questions: &[Question]) -> Result<(), AppError> {
    for question in questions {
        if question.question_text.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "Question text cannot be empty".to_string(),
            ));
        }
        if question.question_type.is_choice() && question.options.is_empty() {
            return Err(AppError::InvalidRequest(format!(
                "Question '{}' needs at least one option",
                question.question_text
            )));
        }
    }
    Ok(())
}

pub async fn create_survey(
    data: web::Data<AppState>,
    request: web::Json<CreateSurveyRequest>,
    http_req: actix_web::HttpRequest,
) -> Result<HttpResponse, AppError> {
    let req = request.into_inner();
    let user = authenticated_user(&http_req)?;

    if req.title.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Survey title cannot be empty".to_string(),
        ));
    }
    validate_questions(&req.questions)?;

    let mut survey = Survey::new(user.id, req.title, req.description);
    survey.questions = req.questions;
    if let Some(is_public) = req.is_public {
        survey.is_public = is_public;
    }
    if let Some(accepting) = req.accepting_responses {
        survey.accepting_responses = accepting;
    }

    let survey_id = data.database.create_survey(&survey)?;
    survey.id = survey_id;

    let response = SurveyEnvelope { survey };
    Ok(HttpResponse::Created().json(response))
}

/// Public listing, newest first.
pub async fn list_surveys(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let surveys = data.database.get_public_surveys()?;
    let response = SurveyListResponse { surveys };
    Ok(HttpResponse::Ok().json(response))
}

/// Surveys by other users to explore, plus the caller's own surveys.
pub async fn dashboard(
    data: web::Data<AppState>,
    http_req: actix_web::HttpRequest,
) -> Result<HttpResponse, AppError> {
    let user = authenticated_user(&http_req)?;

    let explore = data.database.get_surveys_excluding_creator(user.id)?;
    let my_surveys = data.database.get_surveys_by_creator(user.id)?;

    let response = DashboardResponse {
        explore,
        my_surveys,
    };
    Ok(HttpResponse::Ok().json(response))
}

pub async fn get_survey(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let survey_id = path.into_inner();
    let survey = data.database.get_survey_by_id(survey_id)?;
    let response = SurveyEnvelope { survey };
    Ok(HttpResponse::Ok().json(response))
}

pub async fn update_survey(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    request: web::Json<UpdateSurveyRequest>,
    http_req: actix_web::HttpRequest,
) -> Result<HttpResponse, AppError> {
    let survey_id = path.into_inner();
    let req = request.into_inner();
    let user = authenticated_user(&http_req)?;

    let mut survey = data.database.get_survey_by_id(survey_id)?;
    if survey.creator_id != user.id {
        return Err(AppError::Forbidden(
            "Only the survey creator can update it".to_string(),
        ));
    }

    if let Some(title) = req.title {
        if title.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "Survey title cannot be empty".to_string(),
            ));
        }
        survey.title = title;
    }
    if let Some(description) = req.description {
        // An explicit null clears the description
        survey.description = description;
    }
    if let Some(questions) = req.questions {
        // Editing questions after responses exist shifts the indices stored
        // in those responses; stale indices surface as "Deleted Question" in
        // the analytics view rather than an error.
        validate_questions(&questions)?;
        survey.questions = questions;
    }
    if let Some(is_public) = req.is_public {
        survey.is_public = is_public;
    }
    if let Some(accepting) = req.accepting_responses {
        survey.accepting_responses = accepting;
    }

    data.database.update_survey(&survey)?;

    let response = SurveyEnvelope { survey };
    Ok(HttpResponse::Ok().json(response))
}

pub async fn delete_survey(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    http_req: actix_web::HttpRequest,
) -> Result<HttpResponse, AppError> {
    let survey_id = path.into_inner();
    let user = authenticated_user(&http_req)?;

    let survey = data.database.get_survey_by_id(survey_id)?;
    if survey.creator_id != user.id {
        return Err(AppError::Forbidden(
            "Only the survey creator can delete it".to_string(),
        ));
    }

    data.database.delete_survey(survey_id)?;

    Ok(HttpResponse::NoContent().finish())
}
