// src/models/attempt.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{flash::Flash, question::AnswerOption};

/// Represents the 'taken_quizzes' table in the database.
/// One row per completed attempt; UNIQUE(student_id, quiz_id).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TakenQuiz {
    pub id: i64,
    pub student_id: i64,
    pub quiz_id: i64,
    pub score: f64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One row of the taken-quiz results list, with the total broken down into
/// section scores over question `order` ranges.
#[derive(Debug, Serialize)]
pub struct TakenQuizSummary {
    pub quiz_id: i64,
    pub quiz_name: String,
    pub subject: String,
    pub subject_color: String,
    pub scores: Vec<f64>,
    pub total_score: f64,
}

/// Form submitted from the question page. Both fields are optional: a bare
/// answer selection carries no action, a skip carries no answer.
#[derive(Debug, Deserialize)]
pub struct TakeQuizForm {
    pub action: Option<String>,
    pub answer: Option<i64>,
}

/// Everything the question page needs to render one question of an
/// in-progress attempt.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub quiz_id: i64,
    pub quiz_name: String,
    pub question_id: i64,
    pub question_text: String,
    pub answers: Vec<AnswerOption>,
    /// Percentage of questions answered so far, rounded.
    pub progress: i64,
    pub remaining_seconds: i64,
    pub selected_answer_id: Option<i64>,
    pub answered_question_ids: Vec<i64>,
}

/// Outcome of entering a quiz from the list.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnterQuizPage {
    /// Fixed view rendered whenever a completed quiz is re-entered.
    AlreadyTaken,
    FirstQuestion { quiz_id: i64, question_id: i64 },
}

/// Outcome of a question-page request (GET view or POST submission).
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TakeQuizPage {
    AlreadyTaken,
    /// Sent back to the quiz list, e.g. on expiry or an attempt that never
    /// started.
    Redirect { to: String, flash: Flash },
    Question(QuestionView),
    /// Attempt finalized; the client goes back to the quiz list.
    Completed { flash: Flash },
    /// Navigation to another question of the same quiz.
    Navigate { quiz_id: i64, question_id: i64 },
}

/// Outcome of a discussion-page request.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiscussionPage {
    Redirect {
        to: String,
        flash: Flash,
    },
    Discussion {
        quiz_id: i64,
        quiz_name: String,
        /// question id -> the student's chosen answer id; unanswered
        /// questions are simply absent.
        student_answers: HashMap<i64, i64>,
    },
}
