//! Blog entities - Post di viaggio, valutazioni e domande

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Photo {
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Rating {
    pub user_id: i32,
    pub value: u8, // 1..=5
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BlogPost {
    pub blog_id: i32,
    pub trip_id: i32,
    pub author_id: i32,
    pub caption: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
    pub created_at: DateTime<Utc>,
}

impl BlogPost {
    pub fn rating_count(&self) -> usize {
        self.ratings.len()
    }

    pub fn rating_sum(&self) -> u32 {
        self.ratings.iter().map(|r| r.value as u32).sum()
    }

    pub fn average_rating(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            None
        } else {
            Some(self.rating_sum() as f64 / self.ratings.len() as f64)
        }
    }

    /// Una sola valutazione per utente: una nuova valutazione sostituisce la precedente
    pub fn rate(&mut self, user_id: i32, value: u8) {
        match self.ratings.iter_mut().find(|r| r.user_id == user_id) {
            Some(existing) => existing.value = value,
            None => self.ratings.push(Rating { user_id, value }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Answer {
    pub answered_by: i32,
    pub answer_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Question {
    pub question_id: i32,
    pub blog_id: i32,
    pub asked_by: i32,
    pub question_text: String,
    #[serde(default)]
    pub answers: Vec<Answer>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog() -> BlogPost {
        BlogPost {
            blog_id: 1,
            trip_id: 1,
            author_id: 1,
            caption: None,
            content: None,
            photos: vec![],
            ratings: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_rate_replaces_previous_value() {
        let mut b = blog();
        b.rate(7, 2);
        b.rate(8, 4);
        b.rate(7, 5);

        assert_eq!(b.rating_count(), 2);
        assert_eq!(b.rating_sum(), 9);
        assert_eq!(b.average_rating(), Some(4.5));
    }

    #[test]
    fn test_average_without_ratings() {
        assert_eq!(blog().average_rating(), None);
    }
}
