//! Request-body validation.
//!
//! Bodies are deserialized and checked before any service code runs. Both
//! malformed JSON and constraint violations surface as
//! `AppError::Validation` (HTTP 422). Transport-level rejections (missing
//! content type, oversized body) keep the status axum assigns them.

use crate::errors::AppError;
use crate::models::{AskRequest, Lead};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

pub const LEAD_NAME_MIN_CHARS: usize = 2;
pub const LEAD_MESSAGE_MAX_CHARS: usize = 2000;
pub const QUESTION_MIN_CHARS: usize = 2;

/// Field-level constraints of a request body.
pub trait Validate {
    /// Returns every violated constraint, or `Ok(())`.
    fn validate(&self) -> Result<(), AppError>;
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    // RFC 5322 simplified: local@label(.label)+
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
        )
        .unwrap()
    })
}

/// Validate email address syntax.
///
/// Checks for:
/// - a single `@` with a non-empty local part
/// - a dotted domain made of valid labels
/// - no leading, trailing or doubled dots in the local part
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 || !email_regex().is_match(email) {
        return false;
    }

    let Some((local, _domain)) = email.split_once('@') else {
        return false;
    };

    if local.len() > 64 || local.starts_with('.') || local.ends_with('.') || local.contains("..")
    {
        return false;
    }

    true
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn finish(errors: Vec<String>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors.join("; ")))
    }
}

impl Validate for Lead {
    fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();

        // Counted as sent; whitespace is not stripped
        if char_len(&self.name) < LEAD_NAME_MIN_CHARS {
            errors.push(format!(
                "name: must be at least {} characters",
                LEAD_NAME_MIN_CHARS
            ));
        }

        if !is_valid_email(&self.email) {
            errors.push("email: value is not a valid email address".to_string());
        }

        if let Some(budget) = self.monthly_budget {
            if !budget.is_finite() || budget < 0.0 {
                errors.push("monthly_budget: must be greater than or equal to 0".to_string());
            }
        }

        if let Some(message) = &self.message {
            if char_len(message) > LEAD_MESSAGE_MAX_CHARS {
                errors.push(format!(
                    "message: must be at most {} characters",
                    LEAD_MESSAGE_MAX_CHARS
                ));
            }
        }

        finish(errors)
    }
}

impl Validate for AskRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();

        if char_len(&self.question) < QUESTION_MIN_CHARS {
            errors.push(format!(
                "question: must be at least {} characters",
                QUESTION_MIN_CHARS
            ));
        }

        finish(errors)
    }
}

/// JSON extractor that also runs [`Validate`].
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                    AppError::Validation(rejection.body_text())
                }
                other => AppError::Rejected {
                    status: other.status(),
                    message: other.body_text(),
                },
            })?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}
