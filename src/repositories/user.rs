//! UserRepository - Repository per la gestione degli utenti

use super::{Create, Document, DocumentStore, Read, ReadMany, StoreError};
use crate::dtos::CreateUserDTO;
use crate::entities::User;
use chrono::Utc;
use serde_json::json;
use tracing::instrument;

/// Risultati massimi della ricerca per nome
const SEARCH_LIMIT: usize = 10;

impl Document for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> i32 {
        self.user_id
    }

    fn set_id(&mut self, id: i32) {
        self.user_id = id;
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.email.clone())
    }
}

// USER REPO
pub struct UserRepository {
    store: DocumentStore,
}

impl UserRepository {
    pub fn new(store: DocumentStore) -> UserRepository {
        Self { store }
    }

    /// L'email è univoca e salvata in minuscolo
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users: Vec<User> = self
            .store
            .find_by_field("email", json!(email.trim().to_lowercase()))
            .await?;
        Ok(users.into_iter().next())
    }

    /// Ricerca per prefisso del nome, case-insensitive
    pub async fn search_by_name_prefix(&self, prefix: &str) -> Result<Vec<User>, StoreError> {
        let prefix = prefix.trim().to_lowercase();
        let users: Vec<User> = self.store.find_all().await?;
        Ok(users
            .into_iter()
            .filter(|u| u.name.to_lowercase().starts_with(&prefix))
            .take(SEARCH_LIMIT)
            .collect())
    }

    /// Aggiunge il viaggio allo storico (idempotente)
    #[instrument(skip(self))]
    pub async fn add_trip_to_history(&self, user_id: i32, trip_id: i32) -> Result<(), StoreError> {
        self.store
            .modify::<User, _, _, StoreError>(user_id, |user| {
                if !user.trip_history.contains(&trip_id) {
                    user.trip_history.push(trip_id);
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove_trip_from_history(
        &self,
        user_id: i32,
        trip_id: i32,
    ) -> Result<(), StoreError> {
        self.store
            .modify::<User, _, _, StoreError>(user_id, |user| {
                user.trip_history.retain(|id| *id != trip_id);
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Sostituisce l'hash della password
    #[instrument(skip(self, password_hash))]
    pub async fn set_password(&self, user_id: i32, password_hash: String) -> Result<(), StoreError> {
        self.store
            .modify::<User, _, _, StoreError>(user_id, |user| {
                user.password = password_hash.clone();
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Registra un token push per il dispositivo (idempotente)
    pub async fn add_push_token(&self, user_id: i32, token: &str) -> Result<User, StoreError> {
        let (user, _) = self
            .store
            .modify::<User, _, _, StoreError>(user_id, |user| {
                if !user.push_tokens.iter().any(|t| t == token) {
                    user.push_tokens.push(token.to_string());
                }
                Ok(())
            })
            .await?;
        Ok(user)
    }

    /// Ritorna `false` se l'amico era già presente
    pub async fn add_friend(&self, user_id: i32, friend_id: i32) -> Result<bool, StoreError> {
        let (_, added) = self
            .store
            .modify::<User, _, _, StoreError>(user_id, |user| {
                if user.friends.contains(&friend_id) {
                    return Ok(false);
                }
                user.friends.push(friend_id);
                Ok(true)
            })
            .await?;
        Ok(added)
    }

    pub async fn add_public_post(&self, user_id: i32, blog_id: i32) -> Result<(), StoreError> {
        self.store
            .modify::<User, _, _, StoreError>(user_id, |user| {
                if !user.public_posts.contains(&blog_id) {
                    user.public_posts.push(blog_id);
                }
                Ok(())
            })
            .await?;
        Ok(())
    }
}

impl Create<User, CreateUserDTO> for UserRepository {
    async fn create(&self, data: &CreateUserDTO) -> Result<User, StoreError> {
        let user = User {
            user_id: 0,
            name: data.name.trim().to_string(),
            email: data.email.trim().to_lowercase(),
            password: data.password.clone(),
            photo: data.photo.clone(),
            friends: vec![],
            trip_history: vec![],
            public_posts: vec![],
            push_tokens: vec![],
            created_at: Utc::now(),
        };
        self.store.insert(user).await
    }
}

impl Read<User, i32> for UserRepository {
    async fn read(&self, id: &i32) -> Result<Option<User>, StoreError> {
        self.store.get(*id).await
    }
}

impl ReadMany<User, i32> for UserRepository {
    async fn read_many(&self, ids: &[i32]) -> Result<Vec<User>, StoreError> {
        self.store.get_many(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> CreateUserDTO {
        CreateUserDTO {
            name: name.to_string(),
            email: email.to_string(),
            password: "hash".to_string(),
            photo: None,
        }
    }

    #[tokio::test]
    async fn test_email_is_stored_lowercase() {
        let repo = UserRepository::new(DocumentStore::in_memory());
        let created = repo.create(&new_user("Ada", "Ada@Example.COM")).await.unwrap();
        assert_eq!(created.email, "ada@example.com");

        let found = repo.find_by_email("ADA@example.com").await.unwrap().unwrap();
        assert_eq!(found.user_id, created.user_id);
    }

    #[tokio::test]
    async fn test_email_is_unique_case_insensitive() {
        let repo = UserRepository::new(DocumentStore::in_memory());
        repo.create(&new_user("Ada", "ada@example.com")).await.unwrap();

        let result = repo.create(&new_user("Other Ada", "ADA@example.com")).await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
    }

    #[tokio::test]
    async fn test_search_by_name_prefix() {
        let repo = UserRepository::new(DocumentStore::in_memory());
        repo.create(&new_user("Marco", "m@example.com")).await.unwrap();
        repo.create(&new_user("Maria", "ma@example.com")).await.unwrap();
        repo.create(&new_user("Luca", "l@example.com")).await.unwrap();

        let found = repo.search_by_name_prefix("mar").await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_history_is_a_set() {
        let repo = UserRepository::new(DocumentStore::in_memory());
        let user = repo.create(&new_user("Ada", "a@example.com")).await.unwrap();

        repo.add_trip_to_history(user.user_id, 5).await.unwrap();
        repo.add_trip_to_history(user.user_id, 5).await.unwrap();
        repo.add_trip_to_history(user.user_id, 6).await.unwrap();
        repo.remove_trip_from_history(user.user_id, 5).await.unwrap();

        let user = repo.read(&user.user_id).await.unwrap().unwrap();
        assert_eq!(user.trip_history, vec![6]);
    }

    #[tokio::test]
    async fn test_add_friend_twice() {
        let repo = UserRepository::new(DocumentStore::in_memory());
        let user = repo.create(&new_user("Ada", "a@example.com")).await.unwrap();

        assert!(repo.add_friend(user.user_id, 9).await.unwrap());
        assert!(!repo.add_friend(user.user_id, 9).await.unwrap());
    }
}
