use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use common_auth::AuthContext;
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::query_as;

use crate::api_error::ApiError;
use crate::app_state::AppState;
use crate::pagination::{self, PageQuery, PAGE_SIZE};
use crate::validate::{self, MovieInput, MovieUpdateBody, NewMovieBody};

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_year: i32,
}

async fn fetch_movie(state: &AppState, id: i64) -> Result<Movie, ApiError> {
    query_as::<_, Movie>("SELECT id, title, release_year FROM movies WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("movie not found"))
}

pub async fn list_movies(
    State(state): State<AppState>,
    auth: AuthContext,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    auth.require("get:movies")?;
    let Query(query) = query.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let offset = pagination::offset_for(query.page)?;

    let movies = query_as::<_, Movie>(
        "SELECT id, title, release_year FROM movies ORDER BY id LIMIT $1 OFFSET $2",
    )
    .bind(PAGE_SIZE)
    .bind(offset)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::internal)?;

    Ok(Json(json!({ "success": true, "movies": movies })))
}

pub async fn get_movie(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    auth.require("get:movies")?;
    // An unparsable id is an unroutable URL, not bad input.
    let Path(movie_id) = path.map_err(|_| ApiError::NotFound("movie not found"))?;
    let movie = fetch_movie(&state, movie_id).await?;
    Ok(Json(json!({ "success": true, "movie": movie })))
}

pub async fn create_movie(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<NewMovieBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    auth.require("post:movies")?;
    let Json(body) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let input = validate::new_movie(body)?;

    let existing = query_as::<_, Movie>(
        "SELECT id, title, release_year FROM movies WHERE title = $1 AND release_year = $2",
    )
    .bind(&input.title)
    .bind(input.release_year)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::internal)?;
    if existing.is_some() {
        return Err(ApiError::Duplicate("movie already exists"));
    }

    let movie = query_as::<_, Movie>(
        "INSERT INTO movies (title, release_year) VALUES ($1, $2)
         RETURNING id, title, release_year",
    )
    .bind(&input.title)
    .bind(input.release_year)
    .fetch_one(&state.db)
    .await
    .map_err(|err| ApiError::from_db(err, "movie already exists"))?;

    Ok(Json(json!({ "success": true, "movie": movie })))
}

pub async fn update_movie(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<MovieUpdateBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    auth.require("patch:movies")?;
    let Path(movie_id) = path.map_err(|_| ApiError::NotFound("movie not found"))?;
    let Json(body) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;

    let existing = fetch_movie(&state, movie_id).await?;
    let merged = validate::merged_movie(
        MovieInput {
            title: existing.title,
            release_year: existing.release_year,
        },
        body,
    );

    let movie = query_as::<_, Movie>(
        "UPDATE movies SET title = $1, release_year = $2 WHERE id = $3
         RETURNING id, title, release_year",
    )
    .bind(&merged.title)
    .bind(merged.release_year)
    .bind(movie_id)
    .fetch_one(&state.db)
    .await
    .map_err(|err| ApiError::from_db(err, "movie already exists"))?;

    Ok(Json(json!({ "success": true, "movie": movie })))
}

pub async fn delete_movie(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    auth.require("delete:movies")?;
    let Path(movie_id) = path.map_err(|_| ApiError::NotFound("movie not found"))?;
    let movie = fetch_movie(&state, movie_id).await?;

    // Dependent actors go with the movie (ON DELETE CASCADE).
    sqlx::query("DELETE FROM movies WHERE id = $1")
        .bind(movie_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({ "success": true, "movie": movie })))
}
