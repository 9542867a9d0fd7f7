//! Blog DTOs - Data Transfer Objects per blog, valutazioni e domande

use crate::entities::{Answer, BlogPost, Photo, Question};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BlogDTO {
    pub blog_id: i32,
    pub trip_id: i32,
    pub author_id: i32,
    pub caption: Option<String>,
    pub content: Option<String>,
    pub photos: Vec<Photo>,
    pub rating_count: usize,
    pub average_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl From<BlogPost> for BlogDTO {
    fn from(value: BlogPost) -> Self {
        Self {
            rating_count: value.rating_count(),
            average_rating: value.average_rating(),
            blog_id: value.blog_id,
            trip_id: value.trip_id,
            author_id: value.author_id,
            caption: value.caption,
            content: value.content,
            photos: value.photos,
            created_at: value.created_at,
        }
    }
}

/// DTO per creare un blog post; l'autore è l'utente autenticato
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateBlogDTO {
    #[serde(skip)]
    pub author_id: i32,

    pub trip_id: i32,

    #[validate(length(max = 300, message = "Caption must be at most 300 characters"))]
    pub caption: Option<String>,

    #[validate(length(max = 20000, message = "Content must be at most 20000 characters"))]
    pub content: Option<String>,

    #[serde(default)]
    pub photos: Vec<Photo>,
}

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct RateBlogDTO {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub value: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnswerDTO {
    pub answered_by: i32,
    pub answer_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<Answer> for AnswerDTO {
    fn from(value: Answer) -> Self {
        Self {
            answered_by: value.answered_by,
            answer_text: value.answer_text,
            created_at: value.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QuestionDTO {
    pub question_id: i32,
    pub blog_id: i32,
    pub asked_by: i32,
    pub question_text: String,
    pub answers: Vec<AnswerDTO>,
    pub created_at: DateTime<Utc>,
}

impl From<Question> for QuestionDTO {
    fn from(value: Question) -> Self {
        Self {
            question_id: value.question_id,
            blog_id: value.blog_id,
            asked_by: value.asked_by,
            question_text: value.question_text,
            answers: value.answers.into_iter().map(AnswerDTO::from).collect(),
            created_at: value.created_at,
        }
    }
}

/// DTO per una nuova domanda; blog e autore arrivano dal path e dall'autenticazione
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateQuestionDTO {
    #[serde(skip)]
    pub blog_id: i32,

    #[serde(skip)]
    pub asked_by: i32,

    #[validate(length(min = 1, max = 1000, message = "Question must be between 1 and 1000 characters"))]
    pub question_text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateAnswerDTO {
    #[validate(length(min = 1, max = 2000, message = "Answer must be between 1 and 2000 characters"))]
    pub answer_text: String,
}
