// src/handlers/students.rs
//
// Student-facing quiz flow: listing, taking, finishing and reviewing
// quizzes. The timer/recorder/scorer/navigation logic itself lives in
// `crate::quiz`; these handlers do the HTTP and query plumbing around it.

use std::collections::HashMap;

use axum::{
    Extension, Form, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::{
            DiscussionPage, EnterQuizPage, QuestionView, TakeQuizForm, TakeQuizPage,
            TakenQuizSummary,
        },
        flash::Flash,
        question::{AnswerOption, Question},
        quiz::{Quiz, QuizSummary},
        student::UpdateInterestsRequest,
    },
    quiz::{
        flow,
        navigation::{self, Action},
        scoring, timer,
    },
    session::SessionStore,
    state::AppState,
    utils::jwt::Claims,
};

/// Redirect target used by every back-to-the-list response.
const QUIZ_LIST: &str = "quiz_list";

fn student_id(claims: &Claims) -> i64 {
    claims.sub.parse::<i64>().unwrap_or(0)
}

fn time_up_redirect(quiz_name: &str) -> TakeQuizPage {
    TakeQuizPage::Redirect {
        to: QUIZ_LIST.to_string(),
        flash: Flash::warning(format!("Time to take the quiz {quiz_name} has run out.")),
    }
}

async fn fetch_quiz(pool: &PgPool, quiz_id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        "SELECT id, name, subject_id, duration_minutes FROM quizzes WHERE id = $1",
    )
    .bind(quiz_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
}

/// Lookup scoped to the quiz: a question id from another quiz is a 404.
async fn fetch_question(pool: &PgPool, quiz_id: i64, question_id: i64) -> Result<Question, AppError> {
    sqlx::query_as::<_, Question>(
        "SELECT id, quiz_id, text, \"order\" FROM questions WHERE id = $1 AND quiz_id = $2",
    )
    .bind(question_id)
    .bind(quiz_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Question not found".to_string()))
}

/// Start time of the student's attempt, if one was stored and parses.
async fn stored_start_time(
    sessions: &dyn SessionStore,
    student_id: i64,
    quiz_id: i64,
) -> Result<Option<DateTime<Utc>>, AppError> {
    let raw = sessions
        .get(student_id, &timer::start_time_key(quiz_id))
        .await?;
    Ok(raw.as_deref().and_then(timer::parse_start_time))
}

async fn question_view(
    pool: &PgPool,
    student_id: i64,
    quiz: &Quiz,
    question: &Question,
    remaining_seconds: i64,
) -> Result<QuestionView, AppError> {
    let total_questions = flow::question_ids(pool, quiz.id).await?.len() as i64;
    let answered_question_ids = flow::answered_question_ids(pool, student_id, quiz.id).await?;
    let progress = scoring::progress_percent(answered_question_ids.len() as i64, total_questions);
    let selected_answer_id = flow::selected_answer_id(pool, student_id, question.id).await?;

    let answers = sqlx::query_as::<_, AnswerOption>(
        "SELECT id, text FROM answers WHERE question_id = $1 ORDER BY id",
    )
    .bind(question.id)
    .fetch_all(pool)
    .await?;

    Ok(QuestionView {
        quiz_id: quiz.id,
        quiz_name: quiz.name.clone(),
        question_id: question.id,
        question_text: question.text.clone(),
        answers,
        progress,
        remaining_seconds,
        selected_answer_id,
        answered_question_ids,
    })
}

/// Available quizzes for the student: within their interests, not yet taken,
/// and with at least one question, ordered by name.
///
/// Every render of this list first sweeps for attempts whose timer ran out
/// while the student was away and auto-submits them.
pub async fn list_quizzes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = student_id(&claims);

    flow::sweep_expired_attempts(&state.pool, state.sessions.as_ref(), student_id, Utc::now())
        .await?;

    let quizzes = sqlx::query_as::<_, QuizSummary>(
        "SELECT q.id, q.name, s.name AS subject, s.color AS subject_color,
                q.duration_minutes, COUNT(qq.id) AS questions_count
         FROM quizzes q
         JOIN subjects s ON s.id = q.subject_id
         JOIN questions qq ON qq.quiz_id = q.id
         WHERE q.subject_id IN (SELECT subject_id FROM student_interests WHERE student_id = $1)
           AND q.id NOT IN (SELECT quiz_id FROM taken_quizzes WHERE student_id = $1)
         GROUP BY q.id, q.name, s.name, s.color, q.duration_minutes
         ORDER BY q.name",
    )
    .bind(student_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(quizzes))
}

/// Helper struct for the taken-quiz list query.
#[derive(sqlx::FromRow)]
struct TakenRow {
    quiz_id: i64,
    quiz_name: String,
    subject: String,
    subject_color: String,
    total_score: f64,
}

/// Completed quizzes with the total score and a per-section breakdown.
pub async fn list_taken(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = student_id(&claims);

    let rows = sqlx::query_as::<_, TakenRow>(
        "SELECT t.quiz_id, q.name AS quiz_name, s.name AS subject,
                s.color AS subject_color, t.score AS total_score
         FROM taken_quizzes t
         JOIN quizzes q ON q.id = t.quiz_id
         JOIN subjects s ON s.id = q.subject_id
         WHERE t.student_id = $1
         ORDER BY q.name",
    )
    .bind(student_id)
    .fetch_all(&state.pool)
    .await?;

    let mut summaries = Vec::with_capacity(rows.len());
    for row in rows {
        let order_scores = sqlx::query_as::<_, (i64, f64)>(
            "SELECT qq.\"order\", a.score
             FROM student_answers sa
             JOIN answers a ON a.id = sa.answer_id
             JOIN questions qq ON qq.id = a.question_id
             WHERE sa.student_id = $1 AND qq.quiz_id = $2",
        )
        .bind(student_id)
        .bind(row.quiz_id)
        .fetch_all(&state.pool)
        .await?;

        summaries.push(TakenQuizSummary {
            quiz_id: row.quiz_id,
            quiz_name: row.quiz_name,
            subject: row.subject,
            subject_color: row.subject_color,
            scores: scoring::section_scores(&order_scores),
            total_score: row.total_score,
        });
    }

    Ok(Json(summaries))
}

/// Enter a quiz: start the timer (first entry only) and route to the first
/// question. A quiz that already has a TakenQuiz renders the fixed
/// already-taken view instead.
pub async fn take_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<Json<EnterQuizPage>, AppError> {
    let student_id = student_id(&claims);
    let quiz = fetch_quiz(&state.pool, quiz_id).await?;

    if flow::taken_exists(&state.pool, student_id, quiz.id).await? {
        return Ok(Json(EnterQuizPage::AlreadyTaken));
    }

    let key = timer::start_time_key(quiz.id);
    if state.sessions.get(student_id, &key).await?.is_none() {
        state
            .sessions
            .set(student_id, &key, &timer::encode_start_time(Utc::now()))
            .await?;
    }

    let ids = flow::question_ids(&state.pool, quiz.id).await?;
    let first = ids
        .first()
        .copied()
        .ok_or_else(|| AppError::NotFound("Quiz has no questions".to_string()))?;

    Ok(Json(EnterQuizPage::FirstQuestion {
        quiz_id: quiz.id,
        question_id: first,
    }))
}

/// Question view. Expiry is enforced here: an expired (or never-started)
/// attempt is sent back to the quiz list with a warning and nothing is
/// recorded.
pub async fn show_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((quiz_id, question_id)): Path<(i64, i64)>,
) -> Result<Json<TakeQuizPage>, AppError> {
    let student_id = student_id(&claims);
    let quiz = fetch_quiz(&state.pool, quiz_id).await?;
    let question = fetch_question(&state.pool, quiz.id, question_id).await?;

    if flow::taken_exists(&state.pool, student_id, quiz.id).await? {
        return Ok(Json(TakeQuizPage::AlreadyTaken));
    }

    let Some(start) = stored_start_time(state.sessions.as_ref(), student_id, quiz.id).await? else {
        return Ok(Json(time_up_redirect(&quiz.name)));
    };

    let remaining = timer::remaining_seconds(start, quiz.duration_minutes, Utc::now());
    if remaining <= 0 {
        return Ok(Json(time_up_redirect(&quiz.name)));
    }

    let view = question_view(&state.pool, student_id, &quiz, &question, remaining).await?;
    Ok(Json(TakeQuizPage::Question(view)))
}

/// Question submission: record the chosen answer, then finalize or navigate.
///
/// Expiry is deliberately NOT re-checked here: a submission already in
/// flight when the timer ran out is still accepted.
pub async fn submit_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((quiz_id, question_id)): Path<(i64, i64)>,
    Form(form): Form<TakeQuizForm>,
) -> Result<Json<TakeQuizPage>, AppError> {
    let student_id = student_id(&claims);
    let quiz = fetch_quiz(&state.pool, quiz_id).await?;
    let question = fetch_question(&state.pool, quiz.id, question_id).await?;

    if flow::taken_exists(&state.pool, student_id, quiz.id).await? {
        return Ok(Json(TakeQuizPage::AlreadyTaken));
    }

    let Some(start) = stored_start_time(state.sessions.as_ref(), student_id, quiz.id).await? else {
        return Ok(Json(time_up_redirect(&quiz.name)));
    };
    let remaining = timer::remaining_seconds(start, quiz.duration_minutes, Utc::now());

    if let Some(answer_id) = form.answer {
        flow::record_answer(&state.pool, student_id, question.id, answer_id).await?;
    }

    let action = form.action.as_deref().and_then(Action::parse);
    let finished = action.is_some_and(|a| a.is_finish());

    // Finish, timeout, or the last unanswered question just got answered.
    if finished || flow::unanswered_count(&state.pool, student_id, quiz.id).await? == 0 {
        let outcome =
            flow::finalize_attempt(&state.pool, state.sessions.as_ref(), student_id, quiz.id)
                .await?;
        if outcome.created {
            tracing::info!(student_id, quiz_id = quiz.id, score = outcome.score, "quiz completed");
        }
        return Ok(Json(TakeQuizPage::Completed {
            flash: scoring::result_flash(&quiz.name, outcome.score),
        }));
    }

    match action {
        Some(Action::Next) | Some(Action::Skip) => {
            let ids = flow::question_ids(&state.pool, quiz.id).await?;
            if let Some(next) = navigation::next_question_id(&ids, question.id) {
                return Ok(Json(TakeQuizPage::Navigate {
                    quiz_id: quiz.id,
                    question_id: next,
                }));
            }
            // Last question: stay put.
        }
        Some(Action::Goto(target)) => {
            // Membership is not checked here; the question GET scopes its
            // lookup to the quiz, so a foreign id 404s there.
            return Ok(Json(TakeQuizPage::Navigate {
                quiz_id: quiz.id,
                question_id: target,
            }));
        }
        _ => {}
    }

    let view = question_view(&state.pool, student_id, &quiz, &question, remaining).await?;
    Ok(Json(TakeQuizPage::Question(view)))
}

/// Post-completion review: the student's chosen answer per question.
pub async fn view_discussion(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<Json<DiscussionPage>, AppError> {
    let student_id = student_id(&claims);
    let quiz = fetch_quiz(&state.pool, quiz_id).await?;

    if !flow::taken_exists(&state.pool, student_id, quiz.id).await? {
        return Ok(Json(DiscussionPage::Redirect {
            to: QUIZ_LIST.to_string(),
            flash: Flash::warning("You have not completed this quiz yet.".to_string()),
        }));
    }

    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT a.question_id, sa.answer_id
         FROM student_answers sa
         JOIN answers a ON a.id = sa.answer_id
         JOIN questions q ON q.id = a.question_id
         WHERE sa.student_id = $1 AND q.quiz_id = $2",
    )
    .bind(student_id)
    .bind(quiz.id)
    .fetch_all(&state.pool)
    .await?;

    let student_answers: HashMap<i64, i64> = rows.into_iter().collect();

    Ok(Json(DiscussionPage::Discussion {
        quiz_id: quiz.id,
        quiz_name: quiz.name,
        student_answers,
    }))
}

/// Replace the student's subject interests.
pub async fn update_interests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateInterestsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let student_id = student_id(&claims);

    let mut tx = state.pool.begin().await?;

    sqlx::query("DELETE FROM student_interests WHERE student_id = $1")
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO student_interests (student_id, subject_id)
         SELECT $1, id FROM subjects WHERE id = ANY($2)",
    )
    .bind(student_id)
    .bind(&payload.subject_ids)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(serde_json::json!({
        "flash": Flash::success("Interests updated with success!"),
    })))
}
