// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,

    pub name: String,

    pub subject_id: i64,

    /// Time allowed for one attempt. Always positive (CHECK constraint).
    pub duration_minutes: i64,
}

/// One row of the available-quiz list: quiz joined with its subject and
/// question count. Only quizzes with at least one question are listed.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizSummary {
    pub id: i64,
    pub name: String,
    pub subject: String,
    pub subject_color: String,
    pub duration_minutes: i64,
    pub questions_count: i64,
}
