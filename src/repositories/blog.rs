//! BlogRepository - Repository per blog post e valutazioni

use super::{Create, Document, DocumentStore, Read, StoreError};
use crate::dtos::CreateBlogDTO;
use crate::entities::BlogPost;
use chrono::Utc;

impl Document for BlogPost {
    const COLLECTION: &'static str = "blogs";

    fn id(&self) -> i32 {
        self.blog_id
    }

    fn set_id(&mut self, id: i32) {
        self.blog_id = id;
    }
}

// BLOG REPO
pub struct BlogRepository {
    store: DocumentStore,
}

impl BlogRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Tutti i blog, dal più recente
    pub async fn find_all(&self) -> Result<Vec<BlogPost>, StoreError> {
        let mut blogs: Vec<BlogPost> = self.store.find_all().await?;
        blogs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.blog_id.cmp(&a.blog_id)));
        Ok(blogs)
    }

    /// Valutazione dell'utente, sostituisce quella precedente se presente
    pub async fn rate(&self, blog_id: i32, user_id: i32, value: u8) -> Result<BlogPost, StoreError> {
        let (blog, _) = self
            .store
            .modify::<BlogPost, _, _, StoreError>(blog_id, |blog| {
                blog.rate(user_id, value);
                Ok(())
            })
            .await?;
        Ok(blog)
    }
}

impl Create<BlogPost, CreateBlogDTO> for BlogRepository {
    async fn create(&self, data: &CreateBlogDTO) -> Result<BlogPost, StoreError> {
        let blog = BlogPost {
            blog_id: 0,
            trip_id: data.trip_id,
            author_id: data.author_id,
            caption: data.caption.clone(),
            content: data.content.clone(),
            photos: data.photos.clone(),
            ratings: vec![],
            created_at: Utc::now(),
        };
        self.store.insert(blog).await
    }
}

impl Read<BlogPost, i32> for BlogRepository {
    async fn read(&self, id: &i32) -> Result<Option<BlogPost>, StoreError> {
        self.store.get(*id).await
    }
}
