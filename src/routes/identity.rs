//! Caller identity carried by request headers.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header naming the identified player.
pub const USER_ID_HEADER: &str = "x-user-id";

fn user_id(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Player behind the request, `None` for anonymous play.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<String>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(user_id(parts)))
    }
}

/// Player behind the request, rejecting anonymous callers.
#[derive(Debug, Clone)]
pub struct RequiredUser(pub String);

impl<S> FromRequestParts<S> for RequiredUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_id(parts).map(Self).ok_or_else(|| {
            AppError::Unauthorized(format!("missing player header `{USER_ID_HEADER}`"))
        })
    }
}
