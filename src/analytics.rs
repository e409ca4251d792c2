//! Compute-on-read analytics over raw survey responses.
//!
//! The aggregation is a pure function of the survey definition and the stored
//! responses. Malformed or partial response data contributes zero to a tally
//! instead of failing: a corrupted record must never abort the whole report.

use crate::models::{
    AnalyticsReport, OptionStat, Question, QuestionStats, QuestionType, RespondentAnswer,
    RespondentIdentity, RespondentView, Selection, Survey, SurveyResponse,
};
use std::collections::{HashMap, HashSet};

const DELETED_QUESTION_LABEL: &str = "Deleted Question";
const ANONYMOUS_USERNAME: &str = "Anonymous";
const ANONYMOUS_EMAIL: &str = "N/A";

/// Build the per-question statistics and the per-respondent answer listing
/// for a survey. `identities` maps respondent ids to display fields; missing
/// entries (deleted users) fall back to placeholder values.
pub fn aggregate(
    survey: &Survey,
    responses: &[SurveyResponse],
    identities: &HashMap<i64, RespondentIdentity>,
) -> AnalyticsReport {
    let questions = survey
        .questions
        .iter()
        .enumerate()
        .map(|(q_idx, question)| match question.question_type {
            QuestionType::Text => aggregate_text_question(q_idx, question, responses),
            QuestionType::MultipleChoice | QuestionType::Checkbox => {
                aggregate_choice_question(q_idx, question, responses)
            }
        })
        .collect();

    let individual_responses = responses
        .iter()
        .map(|response| {
            let identity = identities.get(&response.respondent_id);
            RespondentView {
                username: identity
                    .map(|i| i.username.clone())
                    .unwrap_or_else(|| ANONYMOUS_USERNAME.to_string()),
                email: identity
                    .map(|i| i.email.clone())
                    .unwrap_or_else(|| ANONYMOUS_EMAIL.to_string()),
                submitted_at: response.created_at,
                answers: response
                    .answers
                    .iter()
                    .map(|answer| RespondentAnswer {
                        // Indices are resolved against the current question
                        // list; a stale index gets a sentinel label instead
                        // of erroring.
                        question: survey
                            .questions
                            .get(answer.question_index)
                            .map(|q| q.question_text.clone())
                            .unwrap_or_else(|| DELETED_QUESTION_LABEL.to_string()),
                        answer: answer.selection.clone(),
                    })
                    .collect(),
            }
        })
        .collect();

    AnalyticsReport {
        title: survey.title.clone(),
        total_responses: responses.len() as u32,
        questions,
        individual_responses,
    }
}

fn aggregate_choice_question(
    q_idx: usize,
    question: &Question,
    responses: &[SurveyResponse],
) -> QuestionStats {
    // Counters keyed by option text, so duplicate option texts share one
    // counter (each duplicate output row then reports the shared count).
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for option in &question.options {
        counts.insert(option.as_str(), 0);
    }

    let mut total_responses_for_q: u32 = 0;

    for response in responses {
        let Some(selection) = find_answer(response, q_idx) else {
            continue;
        };
        if selection.is_empty() {
            continue;
        }

        // One increment per participating respondent, no matter how many
        // options they ticked.
        total_responses_for_q += 1;

        match selection {
            Selection::Multiple(selected) => {
                // A repeated value in one submission raises its option's
                // count only once; otherwise a single respondent could push
                // a count past the question's respondent total.
                let mut seen: HashSet<&str> = HashSet::new();
                for value in selected {
                    if !seen.insert(value.as_str()) {
                        continue;
                    }
                    // Unrecognized values are ignored, not errors.
                    if let Some(count) = counts.get_mut(value.as_str()) {
                        *count += 1;
                    }
                }
            }
            Selection::Single(value) => {
                if let Some(count) = counts.get_mut(value.as_str()) {
                    *count += 1;
                }
            }
            // Filtered out above by is_empty.
            Selection::Empty => {}
        }
    }

    let processed_options = question
        .options
        .iter()
        .map(|option| {
            let count = counts.get(option.as_str()).copied().unwrap_or(0);
            OptionStat {
                text: option.clone(),
                count,
                percentage: percentage_of(count, total_responses_for_q),
            }
        })
        .collect();

    QuestionStats {
        question_text: question.question_text.clone(),
        question_type: question.question_type,
        total_responses_for_q,
        processed_options,
        text_responses: Vec::new(),
    }
}

fn aggregate_text_question(
    q_idx: usize,
    question: &Question,
    responses: &[SurveyResponse],
) -> QuestionStats {
    let text_responses: Vec<String> = responses
        .iter()
        .filter_map(|response| find_answer(response, q_idx))
        .filter_map(|selection| match selection {
            Selection::Single(text) if !text.is_empty() => Some(text.clone()),
            _ => None,
        })
        .collect();

    QuestionStats {
        question_text: question.question_text.clone(),
        question_type: question.question_type,
        total_responses_for_q: text_responses.len() as u32,
        processed_options: Vec::new(),
        text_responses,
    }
}

fn find_answer(response: &SurveyResponse, q_idx: usize) -> Option<&Selection> {
    response
        .answers
        .iter()
        .find(|answer| answer.question_index == q_idx)
        .map(|answer| &answer.selection)
}

/// Share of the question's own respondent count, rounded to one decimal.
/// Checkbox percentages need not sum to 100.
fn percentage_of(count: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}
