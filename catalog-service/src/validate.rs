use serde::Deserialize;

use crate::api_error::ApiError;

/// Field presence rules applied before any persistence mutation. Type
/// mismatches are caught earlier by JSON deserialization and mapped to the
/// same 422 by the handlers.

#[derive(Debug, Deserialize)]
pub struct NewMovieBody {
    pub title: Option<String>,
    pub release_year: Option<i32>,
}

#[derive(Debug)]
pub struct MovieInput {
    pub title: String,
    pub release_year: i32,
}

pub fn new_movie(body: NewMovieBody) -> Result<MovieInput, ApiError> {
    let title = body
        .title
        .filter(|title| !title.is_empty())
        .ok_or_else(|| ApiError::validation("title must be a non-empty string"))?;
    let release_year = body
        .release_year
        .ok_or_else(|| ApiError::validation("release_year is required"))?;

    Ok(MovieInput {
        title,
        release_year,
    })
}

#[derive(Debug, Deserialize)]
pub struct NewActorBody {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub movie_id: Option<i64>,
}

#[derive(Debug)]
pub struct ActorInput {
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub movie_id: i64,
}

pub fn new_actor(body: NewActorBody) -> Result<ActorInput, ApiError> {
    let name = body
        .name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::validation("name must be a non-empty string"))?;
    let age = body
        .age
        .ok_or_else(|| ApiError::validation("age is required"))?;
    let gender = body
        .gender
        .filter(|gender| !gender.is_empty())
        .ok_or_else(|| ApiError::validation("gender must be a non-empty string"))?;
    let movie_id = body
        .movie_id
        .ok_or_else(|| ApiError::validation("movie_id is required"))?;

    Ok(ActorInput {
        name,
        age,
        gender,
        movie_id,
    })
}

/// Partial-update bodies: absent or empty fields leave the stored value
/// untouched.

#[derive(Debug, Deserialize)]
pub struct MovieUpdateBody {
    pub title: Option<String>,
    pub release_year: Option<i32>,
}

pub fn merged_movie(current: MovieInput, update: MovieUpdateBody) -> MovieInput {
    MovieInput {
        title: update
            .title
            .filter(|title| !title.is_empty())
            .unwrap_or(current.title),
        release_year: update.release_year.unwrap_or(current.release_year),
    }
}

#[derive(Debug, Deserialize)]
pub struct ActorUpdateBody {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub movie_id: Option<i64>,
}

pub fn merged_actor(current: ActorInput, update: ActorUpdateBody) -> ActorInput {
    ActorInput {
        name: update
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or(current.name),
        age: update.age.unwrap_or(current.age),
        gender: update
            .gender
            .filter(|gender| !gender.is_empty())
            .unwrap_or(current.gender),
        movie_id: update.movie_id.unwrap_or(current.movie_id),
    }
}
