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
use crate::validate::{self, ActorInput, ActorUpdateBody, NewActorBody};

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Actor {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub movie_id: i64,
}

async fn fetch_actor(state: &AppState, id: i64) -> Result<Actor, ApiError> {
    query_as::<_, Actor>("SELECT id, name, age, gender, movie_id FROM actors WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("actor not found"))
}

/// A missing referenced movie is bad input (422), not a missing target
/// actor (404).
async fn ensure_movie_exists(state: &AppState, movie_id: i64) -> Result<(), ApiError> {
    let found = sqlx::query_scalar::<_, i64>("SELECT id FROM movies WHERE id = $1")
        .bind(movie_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::internal)?;

    match found {
        Some(_) => Ok(()),
        None => Err(ApiError::validation(
            "movie_id must reference an existing movie",
        )),
    }
}

pub async fn list_actors(
    State(state): State<AppState>,
    auth: AuthContext,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    auth.require("get:actors")?;
    let Query(query) = query.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let offset = pagination::offset_for(query.page)?;

    let actors = query_as::<_, Actor>(
        "SELECT id, name, age, gender, movie_id FROM actors ORDER BY id LIMIT $1 OFFSET $2",
    )
    .bind(PAGE_SIZE)
    .bind(offset)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::internal)?;

    Ok(Json(json!({ "success": true, "actors": actors })))
}

pub async fn get_actor(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    auth.require("get:actors")?;
    let Path(actor_id) = path.map_err(|_| ApiError::NotFound("actor not found"))?;
    let actor = fetch_actor(&state, actor_id).await?;
    Ok(Json(json!({ "success": true, "actor": actor })))
}

pub async fn create_actor(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<NewActorBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    auth.require("post:actors")?;
    let Json(body) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let input = validate::new_actor(body)?;

    ensure_movie_exists(&state, input.movie_id).await?;

    let existing = query_as::<_, Actor>(
        "SELECT id, name, age, gender, movie_id FROM actors
         WHERE name = $1 AND age = $2 AND gender = $3 AND movie_id = $4",
    )
    .bind(&input.name)
    .bind(input.age)
    .bind(&input.gender)
    .bind(input.movie_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::internal)?;
    if existing.is_some() {
        return Err(ApiError::Duplicate("actor already exists"));
    }

    let actor = query_as::<_, Actor>(
        "INSERT INTO actors (name, age, gender, movie_id) VALUES ($1, $2, $3, $4)
         RETURNING id, name, age, gender, movie_id",
    )
    .bind(&input.name)
    .bind(input.age)
    .bind(&input.gender)
    .bind(input.movie_id)
    .fetch_one(&state.db)
    .await
    .map_err(|err| ApiError::from_db(err, "actor already exists"))?;

    Ok(Json(json!({ "success": true, "actor": actor })))
}

pub async fn update_actor(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ActorUpdateBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    auth.require("patch:actors")?;
    let Path(actor_id) = path.map_err(|_| ApiError::NotFound("actor not found"))?;
    let Json(body) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;

    let existing = fetch_actor(&state, actor_id).await?;
    let merged = validate::merged_actor(
        ActorInput {
            name: existing.name,
            age: existing.age,
            gender: existing.gender,
            movie_id: existing.movie_id,
        },
        body,
    );

    if merged.movie_id != existing.movie_id {
        ensure_movie_exists(&state, merged.movie_id).await?;
    }

    let actor = query_as::<_, Actor>(
        "UPDATE actors SET name = $1, age = $2, gender = $3, movie_id = $4 WHERE id = $5
         RETURNING id, name, age, gender, movie_id",
    )
    .bind(&merged.name)
    .bind(merged.age)
    .bind(&merged.gender)
    .bind(merged.movie_id)
    .bind(actor_id)
    .fetch_one(&state.db)
    .await
    .map_err(|err| ApiError::from_db(err, "actor already exists"))?;

    Ok(Json(json!({ "success": true, "actor": actor })))
}

pub async fn delete_actor(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    auth.require("delete:actors")?;
    let Path(actor_id) = path.map_err(|_| ApiError::NotFound("actor not found"))?;
    let actor = fetch_actor(&state, actor_id).await?;

    sqlx::query("DELETE FROM actors WHERE id = $1")
        .bind(actor_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({ "success": true, "actor": actor })))
}
