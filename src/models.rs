use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

/// Registered account that can author surveys and submit responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: i64,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: 0, // Will be set by database AUTOINCREMENT
            username,
            email,
            password_hash,
            created_at: Utc::now().timestamp(),
        }
    }
}

/// Authenticated user attached to the request by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuestionType {
    #[default]
    #[serde(rename = "multiple-choice")]
    MultipleChoice,
    #[serde(rename = "checkbox")]
    Checkbox,
    #[serde(rename = "text")]
    Text,
}

impl QuestionType {
    /// Multiple-choice and checkbox questions carry a fixed option list.
    pub fn is_choice(&self) -> bool {
        !matches!(self, QuestionType::Text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_text: String,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
}

/// A respondent's selected value for one question. The wire format is loose
/// (string, string array, or null), so the variant is resolved once on
/// ingestion instead of being re-branched on at every use site.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    Multiple(Vec<String>),
    Single(String),
    #[default]
    Empty,
}

impl Selection {
    /// Empty selections never contribute to a question's tally.
    pub fn is_empty(&self) -> bool {
        match self {
            Selection::Empty => true,
            Selection::Single(s) => s.is_empty(),
            Selection::Multiple(v) => v.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    #[serde(
        rename = "questionIndex",
        deserialize_with = "deserialize_question_index"
    )]
    pub question_index: usize,
    #[serde(rename = "selectedOption", default)]
    pub selection: Selection,
}

/// Question indices may arrive as numbers or numeric strings; normalize to an
/// integer here so downstream comparisons are purely numeric.
fn deserialize_question_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawIndex {
        Number(u64),
        Text(String),
    }

    match RawIndex::deserialize(deserializer)? {
        RawIndex::Number(n) => Ok(n as usize),
        RawIndex::Text(s) => s
            .trim()
            .parse::<usize>()
            .map_err(|e| serde::de::Error::custom(format!("invalid question index: {e}"))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: i64,
    pub creator_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub accepting_responses: bool,
    pub questions: Vec<Question>,
    /// Denormalized count bumped on submission. Advisory only: analytics
    /// always recomputes from the stored responses.
    pub total_responses: i64,
    pub created_at: i64,
}

impl Survey {
    pub fn new(creator_id: i64, title: String, description: Option<String>) -> Self {
        Self {
            id: 0, // Will be set by database AUTOINCREMENT
            creator_id,
            title,
            description,
            is_public: true,
            accepting_responses: true,
            questions: Vec::new(),
            total_responses: 0,
            created_at: Utc::now().timestamp(),
        }
    }
}

/// One respondent's submission for one survey. Immutable after creation and
/// unique per (survey_id, respondent_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    pub id: i64,
    pub survey_id: i64,
    pub respondent_id: i64,
    pub answers: Vec<Answer>,
    pub created_at: i64,
}

impl SurveyResponse {
    pub fn new(survey_id: i64, respondent_id: i64, answers: Vec<Answer>) -> Self {
        Self {
            id: 0, // Will be set by database AUTOINCREMENT
            survey_id,
            respondent_id,
            answers,
            created_at: Utc::now().timestamp(),
        }
    }
}

/// Display identity for a respondent, resolved from the users table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondentIdentity {
    pub username: String,
    pub email: String,
}

// ---------------------------------------------------------------------------
// Analytics output. Field names below are the wire contract the client
// depends on.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionStat {
    pub text: String,
    pub count: u32,
    /// Share of this question's respondents, rounded to one decimal.
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStats {
    pub question_text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub total_responses_for_q: u32,
    pub processed_options: Vec<OptionStat>,
    pub text_responses: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondentAnswer {
    pub question: String,
    pub answer: Selection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondentView {
    pub username: String,
    pub email: String,
    pub submitted_at: i64,
    pub answers: Vec<RespondentAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub title: String,
    pub total_responses: u32,
    pub questions: Vec<QuestionStats>,
    pub individual_responses: Vec<RespondentView>,
}

// ---------------------------------------------------------------------------
// Request/response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurveyRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    pub is_public: Option<bool>,
    pub accepting_responses: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSurveyRequest {
    pub title: Option<String>,
    /// Outer None: field absent, leave as-is. Inner None: explicit null,
    /// clear the description.
    #[serde(default, deserialize_with = "deserialize_explicit_null")]
    pub description: Option<Option<String>>,
    pub questions: Option<Vec<Question>>,
    pub is_public: Option<bool>,
    pub accepting_responses: Option<bool>,
}

/// Wraps a present field in Some so an explicit JSON null stays
/// distinguishable from the field being absent.
fn deserialize_explicit_null<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<Answer>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SurveyEnvelope {
    pub survey: Survey,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SurveyListResponse {
    pub surveys: Vec<Survey>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub explore: Vec<Survey>,
    pub my_surveys: Vec<Survey>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    pub version: String,
    pub uptime: u64,
}
