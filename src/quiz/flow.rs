// src/quiz/flow.rs
//
// Database-backed attempt operations: recording answers, finalizing scores,
// and the expired-attempt sweep. Each mutation runs inside one transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::quiz::Quiz,
    quiz::{scoring, timer},
    session::SessionStore,
};

pub struct FinalizeOutcome {
    pub score: f64,
    /// False when another finalization won the race and the existing
    /// TakenQuiz row was kept.
    pub created: bool,
}

/// Whether the student has already completed this quiz.
pub async fn taken_exists(pool: &PgPool, student_id: i64, quiz_id: i64) -> Result<bool, AppError> {
    let row = sqlx::query("SELECT id FROM taken_quizzes WHERE student_id = $1 AND quiz_id = $2")
        .bind(student_id)
        .bind(quiz_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

/// All question ids of the quiz, ascending.
pub async fn question_ids(pool: &PgPool, quiz_id: i64) -> Result<Vec<i64>, AppError> {
    let ids: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM questions WHERE quiz_id = $1 ORDER BY id")
            .bind(quiz_id)
            .fetch_all(pool)
            .await?;

    Ok(ids)
}

/// Ids of the quiz's questions the student has answered, ascending.
pub async fn answered_question_ids(
    pool: &PgPool,
    student_id: i64,
    quiz_id: i64,
) -> Result<Vec<i64>, AppError> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT a.question_id FROM student_answers sa
         JOIN answers a ON a.id = sa.answer_id
         JOIN questions q ON q.id = a.question_id
         WHERE sa.student_id = $1 AND q.quiz_id = $2
         ORDER BY a.question_id",
    )
    .bind(student_id)
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

pub async fn unanswered_count(
    pool: &PgPool,
    student_id: i64,
    quiz_id: i64,
) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM questions q
         WHERE q.quiz_id = $1
           AND NOT EXISTS (
               SELECT 1 FROM student_answers sa
               JOIN answers a ON a.id = sa.answer_id
               WHERE a.question_id = q.id AND sa.student_id = $2
           )",
    )
    .bind(quiz_id)
    .bind(student_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// The answer the student currently has on file for this question, if any.
pub async fn selected_answer_id(
    pool: &PgPool,
    student_id: i64,
    question_id: i64,
) -> Result<Option<i64>, AppError> {
    let id: Option<i64> = sqlx::query_scalar(
        "SELECT sa.answer_id FROM student_answers sa
         JOIN answers a ON a.id = sa.answer_id
         WHERE sa.student_id = $1 AND a.question_id = $2",
    )
    .bind(student_id)
    .bind(question_id)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Records the student's choice for one question, replacing any prior choice.
///
/// The answer must belong to the question's answer set; a failed lookup is
/// logged and skipped so the rest of the submission still goes through.
/// Returns whether anything was recorded.
pub async fn record_answer(
    pool: &PgPool,
    student_id: i64,
    question_id: i64,
    answer_id: i64,
) -> Result<bool, AppError> {
    let valid = sqlx::query("SELECT id FROM answers WHERE id = $1 AND question_id = $2")
        .bind(answer_id)
        .bind(question_id)
        .fetch_optional(pool)
        .await?;

    if valid.is_none() {
        tracing::warn!(
            answer_id,
            question_id,
            "submitted answer does not belong to question, skipping"
        );
        return Ok(false);
    }

    let mut tx = pool.begin().await?;

    // No history is kept: delete-then-insert leaves exactly one choice.
    sqlx::query(
        "DELETE FROM student_answers sa USING answers a
         WHERE sa.answer_id = a.id AND sa.student_id = $1 AND a.question_id = $2",
    )
    .bind(student_id)
    .bind(question_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO student_answers (student_id, answer_id) VALUES ($1, $2)")
        .bind(student_id)
        .bind(answer_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(true)
}

/// Finalizes the attempt: sums the student's answer scores for the quiz,
/// records the TakenQuiz row and drops the timer state.
///
/// The insert is ON CONFLICT DO NOTHING against UNIQUE(student_id, quiz_id),
/// so concurrent finalizations agree on a single row. The score is computed
/// and returned either way, as the caller's flash reports it regardless.
pub async fn finalize_attempt(
    pool: &PgPool,
    sessions: &dyn SessionStore,
    student_id: i64,
    quiz_id: i64,
) -> Result<FinalizeOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let scores: Vec<f64> = sqlx::query_scalar(
        "SELECT a.score FROM student_answers sa
         JOIN answers a ON a.id = sa.answer_id
         JOIN questions q ON q.id = a.question_id
         WHERE sa.student_id = $1 AND q.quiz_id = $2",
    )
    .bind(student_id)
    .bind(quiz_id)
    .fetch_all(&mut *tx)
    .await?;

    let score = scoring::total_score(scores);

    let result = sqlx::query(
        "INSERT INTO taken_quizzes (student_id, quiz_id, score) VALUES ($1, $2, $3)
         ON CONFLICT (student_id, quiz_id) DO NOTHING",
    )
    .bind(student_id)
    .bind(quiz_id)
    .bind(score)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    sessions
        .delete(student_id, &timer::start_time_key(quiz_id))
        .await?;

    Ok(FinalizeOutcome {
        score,
        created: result.rows_affected() > 0,
    })
}

/// Auto-submits every quiz whose timer ran out while the student was away.
///
/// Runs on each quiz-list request. A failure on one quiz is logged and must
/// not stop the sweep for the others.
pub async fn sweep_expired_attempts(
    pool: &PgPool,
    sessions: &dyn SessionStore,
    student_id: i64,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let quizzes = sqlx::query_as::<_, Quiz>(
        "SELECT id, name, subject_id, duration_minutes FROM quizzes",
    )
    .fetch_all(pool)
    .await?;

    for quiz in quizzes {
        if let Err(err) = sweep_one(pool, sessions, student_id, &quiz, now).await {
            tracing::error!(
                quiz_id = quiz.id,
                error = %err,
                "auto-submit of expired attempt failed, continuing sweep"
            );
        }
    }

    Ok(())
}

async fn sweep_one(
    pool: &PgPool,
    sessions: &dyn SessionStore,
    student_id: i64,
    quiz: &Quiz,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let key = timer::start_time_key(quiz.id);

    let Some(raw) = sessions.get(student_id, &key).await? else {
        return Ok(());
    };
    let Some(start) = timer::parse_start_time(&raw) else {
        tracing::warn!(quiz_id = quiz.id, "unparseable start time in session, skipping");
        return Ok(());
    };

    if !timer::is_expired(start, quiz.duration_minutes, now) {
        return Ok(());
    }
    if taken_exists(pool, student_id, quiz.id).await? {
        return Ok(());
    }

    let outcome = finalize_attempt(pool, sessions, student_id, quiz.id).await?;
    tracing::info!(
        quiz_id = quiz.id,
        student_id,
        score = outcome.score,
        "auto-submitted expired attempt"
    );

    Ok(())
}
