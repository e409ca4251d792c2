use crate::error::{AppError, AppResult};
use crate::models::{Answer, Question, RespondentIdentity, Survey, SurveyResponse, User};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub type DbConnection = Arc<Mutex<Connection>>;

pub struct Database {
    connection: DbConnection,
}

impl Database {
    pub fn new(db_path: &PathBuf) -> AppResult<Self> {
        // Ensure the database directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        // Enable foreign key constraints (SQLite3 has them disabled by default)
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        let database = Database {
            connection: Arc::new(Mutex::new(conn)),
        };

        database.run_migrations()?;

        Ok(database)
    }

    fn run_migrations(&self) -> AppResult<()> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Question lists are stored as a JSON document; the ordinal position
        // in that list is the stable reference responses use.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS surveys (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                creator_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                is_public INTEGER NOT NULL DEFAULT 1,
                accepting_responses INTEGER NOT NULL DEFAULT 1,
                questions TEXT NOT NULL,
                total_responses INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (creator_id) REFERENCES users (id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_surveys_creator_id ON surveys(creator_id)",
            [],
        )?;

        // The unique constraint on (survey_id, respondent_id) is the
        // authoritative one-response-per-respondent rule; handlers map its
        // violation to DuplicateSubmission.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS responses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                survey_id INTEGER NOT NULL,
                respondent_id INTEGER NOT NULL,
                answers TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE (survey_id, respondent_id),
                FOREIGN KEY (survey_id) REFERENCES surveys (id) ON DELETE CASCADE,
                FOREIGN KEY (respondent_id) REFERENCES users (id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_responses_survey_id ON responses(survey_id)",
            [],
        )?;

        tracing::info!("Database migrations completed");
        Ok(())
    }

    // User methods

    pub fn create_user(&self, user: &User) -> AppResult<i64> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        conn.execute(
            "INSERT INTO users (username, email, password_hash, created_at)
             VALUES (?, ?, ?, ?)",
            params![user.username, user.email, user.password_hash, user.created_at],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::InvalidRequest("Username or email already exists".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        let user_id = conn.last_insert_rowid();
        tracing::info!("Created user: {} ({})", user.username, user_id);
        Ok(user_id)
    }

    pub fn get_user_by_id(&self, id: i64) -> AppResult<User> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        let mut stmt = conn.prepare(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = ?",
        )?;

        stmt.query_row([id], map_user_row).map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                AppError::NotFound(format!("User not found: {id}"))
            }
            _ => AppError::Database(e),
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> AppResult<User> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        let mut stmt = conn.prepare(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = ?",
        )?;

        stmt.query_row([username], map_user_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    AppError::NotFound(format!("User not found: {username}"))
                }
                _ => AppError::Database(e),
            })
    }

    // Survey methods

    pub fn create_survey(&self, survey: &Survey) -> AppResult<i64> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        let questions_json = serialize_questions(&survey.questions)?;

        conn.execute(
            "INSERT INTO surveys (creator_id, title, description, is_public,
             accepting_responses, questions, total_responses, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                survey.creator_id,
                survey.title,
                survey.description,
                survey.is_public,
                survey.accepting_responses,
                questions_json,
                survey.total_responses,
                survey.created_at,
            ],
        )?;

        let survey_id = conn.last_insert_rowid();
        tracing::info!("Created survey: {} ({})", survey.title, survey_id);
        Ok(survey_id)
    }

    pub fn get_survey_by_id(&self, id: i64) -> AppResult<Survey> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        let mut stmt = conn.prepare(
            "SELECT id, creator_id, title, description, is_public, accepting_responses,
             questions, total_responses, created_at
             FROM surveys WHERE id = ?",
        )?;

        stmt.query_row([id], map_survey_row).map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::SurveyNotFound(id.to_string()),
            _ => AppError::Database(e),
        })
    }

    pub fn get_public_surveys(&self) -> AppResult<Vec<Survey>> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        let mut stmt = conn.prepare(
            "SELECT id, creator_id, title, description, is_public, accepting_responses,
             questions, total_responses, created_at
             FROM surveys WHERE is_public = 1 ORDER BY created_at DESC, id DESC",
        )?;

        let survey_iter = stmt.query_map([], map_survey_row)?;

        let mut surveys = Vec::new();
        for survey in survey_iter {
            surveys.push(survey?);
        }

        Ok(surveys)
    }

    pub fn get_surveys_by_creator(&self, creator_id: i64) -> AppResult<Vec<Survey>> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        let mut stmt = conn.prepare(
            "SELECT id, creator_id, title, description, is_public, accepting_responses,
             questions, total_responses, created_at
             FROM surveys WHERE creator_id = ? ORDER BY created_at DESC, id DESC",
        )?;

        let survey_iter = stmt.query_map([creator_id], map_survey_row)?;

        let mut surveys = Vec::new();
        for survey in survey_iter {
            surveys.push(survey?);
        }

        Ok(surveys)
    }

    /// Public surveys authored by other users, for the dashboard explore list.
    pub fn get_surveys_excluding_creator(&self, creator_id: i64) -> AppResult<Vec<Survey>> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        let mut stmt = conn.prepare(
            "SELECT id, creator_id, title, description, is_public, accepting_responses,
             questions, total_responses, created_at
             FROM surveys WHERE creator_id != ? AND is_public = 1
             ORDER BY created_at DESC, id DESC",
        )?;

        let survey_iter = stmt.query_map([creator_id], map_survey_row)?;

        let mut surveys = Vec::new();
        for survey in survey_iter {
            surveys.push(survey?);
        }

        Ok(surveys)
    }

    pub fn update_survey(&self, survey: &Survey) -> AppResult<()> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        let questions_json = serialize_questions(&survey.questions)?;

        let rows_affected = conn.execute(
            "UPDATE surveys SET title = ?, description = ?, is_public = ?,
             accepting_responses = ?, questions = ? WHERE id = ?",
            params![
                survey.title,
                survey.description,
                survey.is_public,
                survey.accepting_responses,
                questions_json,
                survey.id,
            ],
        )?;

        if rows_affected == 0 {
            return Err(AppError::SurveyNotFound(survey.id.to_string()));
        }

        tracing::info!("Updated survey: {} ({})", survey.title, survey.id);
        Ok(())
    }

    /// Deletes a survey and its responses in one transaction.
    pub fn delete_survey(&self, id: i64) -> AppResult<()> {
        let mut conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM responses WHERE survey_id = ?", [id])?;
        let rows_affected = tx.execute("DELETE FROM surveys WHERE id = ?", [id])?;
        if rows_affected == 0 {
            return Err(AppError::SurveyNotFound(id.to_string()));
        }
        tx.commit()?;

        tracing::info!("Deleted survey {} and its responses", id);
        Ok(())
    }

    // Response methods

    /// Persists a response and bumps the survey's advisory counter in one
    /// transaction. A second submission for the same (survey, respondent)
    /// pair hits the unique constraint and maps to DuplicateSubmission.
    pub fn create_response(&self, response: &SurveyResponse) -> AppResult<i64> {
        let mut conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        let answers_json = serde_json::to_string(&response.answers)
            .map_err(|e| AppError::Internal(format!("Failed to serialize answers: {e}")))?;

        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO responses (survey_id, respondent_id, answers, created_at)
             VALUES (?, ?, ?, ?)",
            params![
                response.survey_id,
                response.respondent_id,
                answers_json,
                response.created_at,
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateSubmission(
                    "You have already completed this survey".to_string(),
                )
            } else {
                AppError::Database(e)
            }
        })?;

        let response_id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE surveys SET total_responses = total_responses + 1 WHERE id = ?",
            [response.survey_id],
        )?;

        tx.commit()?;

        tracing::info!(
            "Recorded response {} for survey {} from user {}",
            response_id,
            response.survey_id,
            response.respondent_id
        );
        Ok(response_id)
    }

    pub fn response_exists(&self, survey_id: i64, respondent_id: i64) -> AppResult<bool> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        let mut stmt =
            conn.prepare("SELECT 1 FROM responses WHERE survey_id = ? AND respondent_id = ?")?;
        let exists = stmt.exists(params![survey_id, respondent_id])?;

        Ok(exists)
    }

    pub fn get_responses_for_survey(&self, survey_id: i64) -> AppResult<Vec<SurveyResponse>> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        let mut stmt = conn.prepare(
            "SELECT id, survey_id, respondent_id, answers, created_at
             FROM responses WHERE survey_id = ? ORDER BY created_at ASC, id ASC",
        )?;

        let response_iter = stmt.query_map([survey_id], |row| {
            let answers_json: String = row.get(3)?;
            let answers: Vec<Answer> = serde_json::from_str(&answers_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok(SurveyResponse {
                id: row.get(0)?,
                survey_id: row.get(1)?,
                respondent_id: row.get(2)?,
                answers,
                created_at: row.get(4)?,
            })
        })?;

        let mut responses = Vec::new();
        for response in response_iter {
            responses.push(response?);
        }

        Ok(responses)
    }

    /// Display identities for everyone who responded to a survey. Respondents
    /// whose account was deleted simply have no entry.
    pub fn get_respondent_identities(
        &self,
        survey_id: i64,
    ) -> AppResult<HashMap<i64, RespondentIdentity>> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))?;

        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.email
             FROM responses r JOIN users u ON u.id = r.respondent_id
             WHERE r.survey_id = ?",
        )?;

        let identity_iter = stmt.query_map([survey_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                RespondentIdentity {
                    username: row.get(1)?,
                    email: row.get(2)?,
                },
            ))
        })?;

        let mut identities = HashMap::new();
        for identity in identity_iter {
            let (id, identity) = identity?;
            identities.insert(id, identity);
        }

        Ok(identities)
    }
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_survey_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Survey> {
    let questions_json: String = row.get(6)?;
    let questions: Vec<Question> = serde_json::from_str(&questions_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Survey {
        id: row.get(0)?,
        creator_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        is_public: row.get(4)?,
        accepting_responses: row.get(5)?,
        questions,
        total_responses: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn serialize_questions(questions: &[Question]) -> AppResult<String> {
    serde_json::to_string(questions)
        .map_err(|e| AppError::Internal(format!("Failed to serialize questions: {e}")))
}

fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
