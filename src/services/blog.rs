//! Blog services - Racconti di viaggio, valutazioni e classifica dei blog più apprezzati

use crate::core::{AppError, AppState};
use crate::dtos::{BlogDTO, CreateBlogDTO, RateBlogDTO, TrendingQuery};
use crate::entities::{BlogPost, User};
use crate::membership::has_view_access;
use crate::repositories::{Create, Read};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Peso della media globale nel punteggio bayesiano
const PRIOR_WEIGHT: f64 = 5.0;
const DEFAULT_TRENDING_LIMIT: usize = 10;
const MAX_TRENDING_LIMIT: usize = 50;

/// Media bayesiana `(C*m + somma) / (C + n)`
fn bayesian_score(blog: &BlogPost, global_mean: f64) -> f64 {
    (PRIOR_WEIGHT * global_mean + blog.rating_sum() as f64)
        / (PRIOR_WEIGHT + blog.rating_count() as f64)
}

/// Ordina i blog per punteggio bayesiano, a parità per numero di valutazioni e poi per data
pub fn rank_trending(blogs: Vec<BlogPost>, limit: usize) -> Vec<BlogPost> {
    let (sum, count) = blogs.iter().fold((0u64, 0u64), |(s, c), b| {
        (s + b.rating_sum() as u64, c + b.rating_count() as u64)
    });
    let global_mean = if count == 0 { 0.0 } else { sum as f64 / count as f64 };

    let mut scored: Vec<(f64, BlogPost)> = blogs
        .into_iter()
        .map(|b| (bayesian_score(&b, global_mean), b))
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then(b.rating_count().cmp(&a.rating_count()))
            .then(b.created_at.cmp(&a.created_at))
    });

    scored.into_iter().take(limit).map(|(_, b)| b).collect()
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, trip_id = %body.trip_id))]
pub async fn create_blog(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(mut body): Json<CreateBlogDTO>,
) -> Result<(StatusCode, Json<BlogDTO>), AppError> {
    debug!("Creating blog post");
    // 1. Validare il DTO
    // 2. Il viaggio deve esistere e l'autore deve esserne membro
    // 3. Salvare il blog e aggiungerlo ai post pubblici dell'autore

    body.validate()?;

    let trip = state.trip.read(&body.trip_id).await?.ok_or_else(|| {
        warn!("Trip not found");
        AppError::not_found("Trip not found")
    })?;
    if !has_view_access(&trip, current_user.user_id) {
        warn!("User is not a member of the trip");
        return Err(AppError::forbidden("Only trip members can write about this trip"));
    }

    body.author_id = current_user.user_id;
    let blog = state.blog.create(&body).await?;

    if let Err(e) = state
        .user
        .add_public_post(current_user.user_id, blog.blog_id)
        .await
    {
        warn!("Failed to add blog to public posts: {:?}", e);
    }

    info!(blog_id = blog.blog_id, "Blog post created");
    Ok((StatusCode::CREATED, Json(BlogDTO::from(blog))))
}

#[instrument(skip(state))]
pub async fn list_blogs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BlogDTO>>, AppError> {
    let blogs = state.blog.find_all().await?;
    Ok(Json(blogs.into_iter().map(BlogDTO::from).collect()))
}

#[instrument(skip(state), fields(blog_id = %blog_id))]
pub async fn get_blog(
    State(state): State<Arc<AppState>>,
    Path(blog_id): Path<i32>,
) -> Result<Json<BlogDTO>, AppError> {
    let blog = state
        .blog
        .read(&blog_id)
        .await?
        .ok_or_else(|| AppError::not_found("Blog not found"))?;
    Ok(Json(BlogDTO::from(blog)))
}

#[instrument(skip(state, current_user, body), fields(blog_id = %blog_id, user_id = %current_user.user_id))]
pub async fn rate_blog(
    State(state): State<Arc<AppState>>,
    Path(blog_id): Path<i32>,
    Extension(current_user): Extension<User>,
    Json(body): Json<RateBlogDTO>,
) -> Result<Json<BlogDTO>, AppError> {
    body.validate()?;
    let blog = state
        .blog
        .rate(blog_id, current_user.user_id, body.value)
        .await?;
    info!(value = body.value, "Blog rated");
    Ok(Json(BlogDTO::from(blog)))
}

#[instrument(skip(state, params))]
pub async fn trending_blogs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendingQuery>,
) -> Result<Json<Vec<BlogDTO>>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_TRENDING_LIMIT)
        .clamp(1, MAX_TRENDING_LIMIT);

    let blogs = state.blog.find_all().await?;
    let ranked = rank_trending(blogs, limit);

    debug!("Trending returned {} blogs", ranked.len());
    Ok(Json(ranked.into_iter().map(BlogDTO::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Rating;
    use chrono::{Duration, Utc};

    fn blog(blog_id: i32, values: &[u8], age_hours: i64) -> BlogPost {
        BlogPost {
            blog_id,
            trip_id: 1,
            author_id: 1,
            caption: None,
            content: None,
            photos: vec![],
            ratings: values
                .iter()
                .enumerate()
                .map(|(i, v)| Rating {
                    user_id: i as i32 + 1,
                    value: *v,
                })
                .collect(),
            created_at: Utc::now() - Duration::hours(age_hours),
        }
    }

    fn ids(blogs: &[BlogPost]) -> Vec<i32> {
        blogs.iter().map(|b| b.blog_id).collect()
    }

    #[test]
    fn test_single_perfect_rating_does_not_win() {
        // il blog con un solo 5 resta vicino alla media globale
        let blogs = vec![
            blog(1, &[5], 0),
            blog(2, &[5, 5, 5, 5, 5, 5, 5, 5, 4, 5], 0),
            blog(3, &[2, 2, 3], 0),
        ];
        let ranked = rank_trending(blogs, 10);
        assert_eq!(ids(&ranked), vec![2, 1, 3]);
    }

    #[test]
    fn test_ties_broken_by_count_then_recency() {
        let blogs = vec![blog(1, &[], 2), blog(2, &[], 1), blog(3, &[], 3)];
        let ranked = rank_trending(blogs, 10);
        assert_eq!(ids(&ranked), vec![2, 1, 3]);

        // stesso punteggio (tutti 4), vince chi ha più valutazioni
        let blogs = vec![blog(1, &[4], 0), blog(2, &[4, 4, 4], 5)];
        assert_eq!(ids(&rank_trending(blogs, 10)), vec![2, 1]);
    }

    #[test]
    fn test_limit_is_applied() {
        let blogs = (1..=5).map(|i| blog(i, &[3], i as i64)).collect();
        assert_eq!(rank_trending(blogs, 2).len(), 2);
    }
}
