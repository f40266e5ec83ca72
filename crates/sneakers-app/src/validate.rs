use axum::extract::{FromRequest, Request};
use garde::Validate;
use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor wrapper that runs garde validation on the extracted payload,
/// both extraction and validation failures end as `ApiError::Validation`
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<E>(pub E);

impl<E> Deref for Valid<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<E> DerefMut for Valid<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<E: Display> Display for Valid<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<E> Valid<E> {
    pub fn into_inner(self) -> E {
        self.0
    }
}

/// Validates already extracted payload
pub fn validate<T>(payload: &T) -> Result<(), ApiError>
where
    T: Validate<Context = ()>,
{
    payload.validate().map_err(ApiError::from)
}

impl<Extractor, T> FromRequest<AppState> for Valid<Extractor>
where
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequest<AppState>,
    ApiError: From<<Extractor as FromRequest<AppState>>::Rejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request(req, state).await?;
        validate(inner.deref())?;
        Ok(Valid(inner))
    }
}
