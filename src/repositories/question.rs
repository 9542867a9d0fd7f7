//! QuestionRepository - Repository per domande e risposte sui blog

use super::{Create, Document, DocumentStore, Read, StoreError};
use crate::dtos::CreateQuestionDTO;
use crate::entities::{Answer, Question};
use chrono::Utc;
use serde_json::json;

impl Document for Question {
    const COLLECTION: &'static str = "questions";

    fn id(&self) -> i32 {
        self.question_id
    }

    fn set_id(&mut self, id: i32) {
        self.question_id = id;
    }
}

// QUESTION REPO
pub struct QuestionRepository {
    store: DocumentStore,
}

impl QuestionRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Domande di un blog in ordine di creazione
    pub async fn find_many_by_blog(&self, blog_id: i32) -> Result<Vec<Question>, StoreError> {
        self.store.find_by_field("blog_id", json!(blog_id)).await
    }

    pub async fn add_answer(
        &self,
        question_id: i32,
        answered_by: i32,
        answer_text: &str,
    ) -> Result<Question, StoreError> {
        let (question, _) = self
            .store
            .modify::<Question, _, _, StoreError>(question_id, |question| {
                question.answers.push(Answer {
                    answered_by,
                    answer_text: answer_text.to_string(),
                    created_at: Utc::now(),
                });
                Ok(())
            })
            .await?;
        Ok(question)
    }
}

impl Create<Question, CreateQuestionDTO> for QuestionRepository {
    async fn create(&self, data: &CreateQuestionDTO) -> Result<Question, StoreError> {
        let question = Question {
            question_id: 0,
            blog_id: data.blog_id,
            asked_by: data.asked_by,
            question_text: data.question_text.trim().to_string(),
            answers: vec![],
            created_at: Utc::now(),
        };
        self.store.insert(question).await
    }
}

impl Read<Question, i32> for QuestionRepository {
    async fn read(&self, id: &i32) -> Result<Option<Question>, StoreError> {
        self.store.get(*id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_answers_are_appended() {
        let repo = QuestionRepository::new(DocumentStore::in_memory());
        let q = repo
            .create(&CreateQuestionDTO {
                blog_id: 3,
                asked_by: 1,
                question_text: "Best season?".to_string(),
            })
            .await
            .unwrap();

        repo.add_answer(q.question_id, 2, "Spring").await.unwrap();
        let q = repo.add_answer(q.question_id, 4, "Autumn").await.unwrap();
        assert_eq!(q.answers.len(), 2);
        assert_eq!(q.answers[1].answered_by, 4);

        assert_eq!(repo.find_many_by_blog(3).await.unwrap().len(), 1);
        assert!(repo.find_many_by_blog(4).await.unwrap().is_empty());
    }
}
