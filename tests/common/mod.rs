//! Shared test infrastructure: a tempdir-backed database plus application
//! state, so every test runs against an isolated SQLite file.

#![allow(dead_code)]

use actix_web::web;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use survey_manager::auth;
use survey_manager::config::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig};
use survey_manager::database::Database;
use survey_manager::handlers::AppState;
use survey_manager::models::{Question, QuestionType, Survey, User};
use tempfile::TempDir;

pub const TEST_PASSWORD: &str = "correct horse battery staple";

pub struct TestApp {
    pub db: Arc<Database>,
    pub state: web::Data<AppState>,
    _tmp: TempDir,
}

impl TestApp {
    /// No JWT secret configured: the auth middleware injects the test user
    /// (id 1), so handlers see an authenticated request.
    pub fn new() -> Self {
        Self::with_jwt_secret(None)
    }

    pub fn with_jwt_secret(jwt_secret: Option<&str>) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("test.db");
        let db = Arc::new(Database::new(&db_path).unwrap());

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig { path: db_path },
            auth: jwt_secret.map(|s| AuthConfig {
                jwt_secret: Some(s.to_string()),
            }),
        };

        let state = web::Data::new(AppState {
            database: Arc::clone(&db),
            start_time: SystemTime::now(),
            config: Arc::new(RwLock::new(config)),
        });

        Self {
            db,
            state,
            _tmp: tmp,
        }
    }

    pub fn seed_user(&self, username: &str) -> i64 {
        let user = User::new(
            username.to_string(),
            format!("{username}@example.com"),
            auth::hash_password(TEST_PASSWORD).unwrap(),
        );
        self.db.create_user(&user).unwrap()
    }

    pub fn seed_survey(&self, creator_id: i64, title: &str, questions: Vec<Question>) -> i64 {
        let mut survey = Survey::new(creator_id, title.to_string(), None);
        survey.questions = questions;
        self.db.create_survey(&survey).unwrap()
    }
}

pub fn choice_question(text: &str, question_type: QuestionType, options: &[&str]) -> Question {
    Question {
        question_text: text.to_string(),
        question_type,
        options: options.iter().map(|o| o.to_string()).collect(),
    }
}

pub fn text_question(text: &str) -> Question {
    Question {
        question_text: text.to_string(),
        question_type: QuestionType::Text,
        options: Vec::new(),
    }
}
