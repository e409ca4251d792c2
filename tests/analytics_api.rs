mod common;

use actix_web::{test, App};
use common::{choice_question, text_question, TestApp};
use survey_manager::middleware::AuthenticationMiddleware;
use survey_manager::models::{Answer, QuestionType, Selection, SurveyResponse};
use survey_manager::routes;

macro_rules! init_app {
    ($test_app:expr) => {
        test::init_service(
            App::new()
                .app_data($test_app.state.clone())
                .wrap(AuthenticationMiddleware)
                .configure(routes::configure_routes),
        )
        .await
    };
}

fn seed_response(test_app: &TestApp, survey_id: i64, respondent_id: i64, answers: Vec<Answer>) {
    let response = SurveyResponse::new(survey_id, respondent_id, answers);
    test_app.db.create_response(&response).unwrap();
}

fn answer(question_index: usize, selection: Selection) -> Answer {
    Answer {
        question_index,
        selection,
    }
}

fn multiple(values: &[&str]) -> Selection {
    Selection::Multiple(values.iter().map(|v| v.to_string()).collect())
}

fn single(value: &str) -> Selection {
    Selection::Single(value.to_string())
}

#[actix_rt::test]
async fn test_submit_then_duplicate_rejected() {
    let test_app = TestApp::new();
    let me = test_app.seed_user("testuser");
    let survey_id = test_app.seed_survey(
        me,
        "Lunch",
        vec![choice_question(
            "Pizza or sushi?",
            QuestionType::MultipleChoice,
            &["Pizza", "Sushi"],
        )],
    );

    let app = init_app!(test_app);

    let submit = test::TestRequest::post()
        .uri(&format!("/api/surveys/{survey_id}/responses"))
        .set_json(serde_json::json!({
            "answers": [{"questionIndex": 0, "selectedOption": "Pizza"}]
        }))
        .to_request();
    let resp = test::call_service(&app, submit).await;
    assert_eq!(resp.status(), 201);

    // Second submission from the same respondent is a conflict
    let again = test::TestRequest::post()
        .uri(&format!("/api/surveys/{survey_id}/responses"))
        .set_json(serde_json::json!({
            "answers": [{"questionIndex": 0, "selectedOption": "Sushi"}]
        }))
        .to_request();
    let resp = test::call_service(&app, again).await;
    assert_eq!(resp.status(), 409);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "duplicate_submission");

    // Only the first response was persisted
    let responses = test_app.db.get_responses_for_survey(survey_id).unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].answers[0].selection, single("Pizza"));

    let survey = test_app.db.get_survey_by_id(survey_id).unwrap();
    assert_eq!(survey.total_responses, 1);
}

#[actix_rt::test]
async fn test_submit_rejected_when_not_accepting() {
    let test_app = TestApp::new();
    let me = test_app.seed_user("testuser");
    let survey_id = test_app.seed_survey(me, "Closed", vec![text_question("Q")]);

    let mut survey = test_app.db.get_survey_by_id(survey_id).unwrap();
    survey.accepting_responses = false;
    test_app.db.update_survey(&survey).unwrap();

    let app = init_app!(test_app);

    let req = test::TestRequest::post()
        .uri(&format!("/api/surveys/{survey_id}/responses"))
        .set_json(serde_json::json!({"answers": []}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_submit_to_unknown_survey_returns_404() {
    let test_app = TestApp::new();
    test_app.seed_user("testuser");
    let app = init_app!(test_app);

    let req = test::TestRequest::post()
        .uri("/api/surveys/42/responses")
        .set_json(serde_json::json!({"answers": []}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_checkbox_analytics_report() {
    let test_app = TestApp::new();
    let me = test_app.seed_user("testuser");
    let bob = test_app.seed_user("bob");
    let carol = test_app.seed_user("carol");
    let survey_id = test_app.seed_survey(
        me,
        "Snack picks",
        vec![choice_question(
            "Pick any",
            QuestionType::Checkbox,
            &["A", "B"],
        )],
    );

    seed_response(&test_app, survey_id, me, vec![answer(0, multiple(&["A"]))]);
    seed_response(
        &test_app,
        survey_id,
        bob,
        vec![answer(0, multiple(&["A", "B"]))],
    );
    // Empty selection: present but excluded from the tally
    seed_response(&test_app, survey_id, carol, vec![answer(0, multiple(&[]))]);

    let app = init_app!(test_app);

    let req = test::TestRequest::get()
        .uri(&format!("/api/surveys/{survey_id}/analytics"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Snack picks");
    assert_eq!(body["totalResponses"], 3);

    let question = &body["questions"][0];
    assert_eq!(question["questionText"], "Pick any");
    assert_eq!(question["type"], "checkbox");
    assert_eq!(question["totalResponsesForQ"], 2);

    let options = question["processedOptions"].as_array().unwrap();
    assert_eq!(options[0]["text"], "A");
    assert_eq!(options[0]["count"], 2);
    assert_eq!(options[0]["percentage"], 100.0);
    assert_eq!(options[1]["text"], "B");
    assert_eq!(options[1]["count"], 1);
    assert_eq!(options[1]["percentage"], 50.0);

    let individual = body["individualResponses"].as_array().unwrap();
    assert_eq!(individual.len(), 3);
    assert_eq!(individual[0]["username"], "testuser");
    assert_eq!(individual[1]["username"], "bob");
    assert_eq!(individual[1]["email"], "bob@example.com");
    assert_eq!(individual[1]["answers"][0]["question"], "Pick any");
    assert_eq!(
        individual[1]["answers"][0]["answer"],
        serde_json::json!(["A", "B"])
    );
}

#[actix_rt::test]
async fn test_text_question_analytics_excludes_empty() {
    let test_app = TestApp::new();
    let me = test_app.seed_user("testuser");
    let u2 = test_app.seed_user("u2");
    let u3 = test_app.seed_user("u3");
    let u4 = test_app.seed_user("u4");
    let survey_id = test_app.seed_survey(me, "Feedback", vec![text_question("Thoughts?")]);

    seed_response(&test_app, survey_id, me, vec![answer(0, single("good"))]);
    seed_response(&test_app, survey_id, u2, vec![answer(0, single(""))]);
    seed_response(&test_app, survey_id, u3, vec![answer(0, Selection::Empty)]);
    seed_response(&test_app, survey_id, u4, vec![answer(0, single("ok"))]);

    let app = init_app!(test_app);

    let req = test::TestRequest::get()
        .uri(&format!("/api/surveys/{survey_id}/analytics"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    let question = &body["questions"][0];
    assert_eq!(question["totalResponsesForQ"], 2);
    assert_eq!(
        question["textResponses"],
        serde_json::json!(["good", "ok"])
    );
    assert_eq!(question["processedOptions"].as_array().unwrap().len(), 0);
}

#[actix_rt::test]
async fn test_stale_answer_index_labelled_deleted_question() {
    let test_app = TestApp::new();
    let me = test_app.seed_user("testuser");
    let survey_id = test_app.seed_survey(
        me,
        "Edited survey",
        vec![text_question("Only question left")],
    );

    // Answer referencing a question index beyond the current list
    seed_response(
        &test_app,
        survey_id,
        me,
        vec![answer(5, single("orphaned answer"))],
    );

    let app = init_app!(test_app);

    let req = test::TestRequest::get()
        .uri(&format!("/api/surveys/{survey_id}/analytics"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    let answers = body["individualResponses"][0]["answers"].as_array().unwrap();
    assert_eq!(answers[0]["question"], "Deleted Question");
    assert_eq!(answers[0]["answer"], "orphaned answer");

    // The per-question pass simply never sees the stale index
    assert_eq!(body["questions"][0]["totalResponsesForQ"], 0);
}

#[actix_rt::test]
async fn test_analytics_forbidden_for_non_creator() {
    let test_app = TestApp::new();
    test_app.seed_user("testuser");
    let other = test_app.seed_user("other");
    let survey_id = test_app.seed_survey(other, "Not yours", Vec::new());

    let app = init_app!(test_app);

    let req = test::TestRequest::get()
        .uri(&format!("/api/surveys/{survey_id}/analytics"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_rt::test]
async fn test_analytics_for_survey_with_no_responses() {
    let test_app = TestApp::new();
    let me = test_app.seed_user("testuser");
    let survey_id = test_app.seed_survey(
        me,
        "Fresh survey",
        vec![choice_question(
            "Pick one",
            QuestionType::MultipleChoice,
            &["A", "B"],
        )],
    );

    let app = init_app!(test_app);

    let req = test::TestRequest::get()
        .uri(&format!("/api/surveys/{survey_id}/analytics"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["totalResponses"], 0);
    let options = body["questions"][0]["processedOptions"].as_array().unwrap();
    for option in options {
        assert_eq!(option["count"], 0);
        assert_eq!(option["percentage"], 0.0);
    }
    assert_eq!(body["individualResponses"].as_array().unwrap().len(), 0);
}

#[actix_rt::test]
async fn test_answers_accept_numeric_string_indices() {
    let test_app = TestApp::new();
    let me = test_app.seed_user("testuser");
    let survey_id = test_app.seed_survey(
        me,
        "Loose clients",
        vec![choice_question(
            "Pick one",
            QuestionType::MultipleChoice,
            &["A", "B"],
        )],
    );

    let app = init_app!(test_app);

    // Some clients send the index as a string; it must still tally.
    let submit = test::TestRequest::post()
        .uri(&format!("/api/surveys/{survey_id}/responses"))
        .set_json(serde_json::json!({
            "answers": [{"questionIndex": "0", "selectedOption": "B"}]
        }))
        .to_request();
    let resp = test::call_service(&app, submit).await;
    assert_eq!(resp.status(), 201);

    let req = test::TestRequest::get()
        .uri(&format!("/api/surveys/{survey_id}/analytics"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;

    assert_eq!(body["questions"][0]["totalResponsesForQ"], 1);
    assert_eq!(body["questions"][0]["processedOptions"][1]["count"], 1);
    assert_eq!(
        body["questions"][0]["processedOptions"][1]["percentage"],
        100.0
    );
}
