//! Question services - Domande e risposte sotto i blog

use crate::core::{AppError, AppState};
use crate::dtos::{CreateAnswerDTO, CreateQuestionDTO, QuestionDTO};
use crate::entities::User;
use crate::repositories::{Create, Read};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

async fn ensure_blog_exists(state: &AppState, blog_id: i32) -> Result<(), AppError> {
    if state.blog.read(&blog_id).await?.is_none() {
        warn!("Blog not found: {}", blog_id);
        return Err(AppError::not_found("Blog not found"));
    }
    Ok(())
}

#[instrument(skip(state, current_user, body), fields(blog_id = %blog_id, user_id = %current_user.user_id))]
pub async fn ask_question(
    State(state): State<Arc<AppState>>,
    Path(blog_id): Path<i32>,
    Extension(current_user): Extension<User>,
    Json(mut body): Json<CreateQuestionDTO>,
) -> Result<(StatusCode, Json<QuestionDTO>), AppError> {
    body.validate()?;
    ensure_blog_exists(&state, blog_id).await?;

    body.blog_id = blog_id;
    body.asked_by = current_user.user_id;
    let question = state.question.create(&body).await?;

    info!(question_id = question.question_id, "Question posted");
    Ok((StatusCode::CREATED, Json(QuestionDTO::from(question))))
}

#[instrument(skip(state), fields(blog_id = %blog_id))]
pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    Path(blog_id): Path<i32>,
) -> Result<Json<Vec<QuestionDTO>>, AppError> {
    ensure_blog_exists(&state, blog_id).await?;
    let questions = state.question.find_many_by_blog(blog_id).await?;
    debug!("Found {} questions", questions.len());
    Ok(Json(questions.into_iter().map(QuestionDTO::from).collect()))
}

#[instrument(skip(state, current_user, body), fields(question_id = %question_id, user_id = %current_user.user_id))]
pub async fn answer_question(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<i32>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateAnswerDTO>,
) -> Result<(StatusCode, Json<QuestionDTO>), AppError> {
    body.validate()?;
    let question = state
        .question
        .add_answer(question_id, current_user.user_id, body.answer_text.trim())
        .await?;
    info!("Answer posted");
    Ok((StatusCode::CREATED, Json(QuestionDTO::from(question))))
}
