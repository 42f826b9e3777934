// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub quiz_id: i64,

    pub text: String,

    /// Position of the question inside the quiz. Used only to split scores
    /// into sections for the results page; navigation goes by `id`.
    pub order: i64,
}

/// Answer option as shown to the student (score withheld).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnswerOption {
    pub id: i64,
    pub text: String,
}
