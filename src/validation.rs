//! Input validation for users, films, reviews and directors.
//!
//! Every check is a pure function of its input and reports through the returned
//! [`ValidationResult`].

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::{FilmRecord, ReviewPayload, User},
};

pub const DESCRIPTION_MAX_CHARS: usize = 200;

/// Release dates must fall strictly after the first public film screening
pub const CINEMA_BIRTHDAY: NaiveDate = match NaiveDate::from_ymd_opt(1895, 12, 28) {
    Some(date) => date,
    None => panic!("invalid cinema birthday"),
};

/// Outcome of a validation check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub error_message: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error_message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error_message: Some(message.into()),
        }
    }

    pub fn into_result(self) -> AppResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(AppError::Validation(
                self.error_message
                    .unwrap_or_else(|| "invalid input".to_string()),
            ))
        }
    }
}

pub fn validate_film(film: &FilmRecord) -> ValidationResult {
    if film.name.trim().is_empty() {
        return ValidationResult::fail("film name must not be blank");
    }

    if film.description.chars().count() > DESCRIPTION_MAX_CHARS {
        return ValidationResult::fail(format!(
            "film description must not exceed {} characters",
            DESCRIPTION_MAX_CHARS
        ));
    }

    if film.release_date <= CINEMA_BIRTHDAY {
        return ValidationResult::fail(format!(
            "release date must be after {}",
            CINEMA_BIRTHDAY
        ));
    }

    if film.duration < 0 {
        return ValidationResult::fail("film duration must not be negative");
    }

    ValidationResult::ok()
}

/// Checks a user against `today`, the date future birthdays are measured from
pub fn validate_user(user: &User, today: NaiveDate) -> ValidationResult {
    let email = user.email.trim();
    if email.is_empty() || !email.contains('@') || email.chars().any(char::is_whitespace) {
        return ValidationResult::fail("email is malformed");
    }

    if user.login.trim().is_empty() || user.login.chars().any(char::is_whitespace) {
        return ValidationResult::fail("login must not be blank or contain whitespace");
    }

    if let Some(birthday) = user.birthday {
        if birthday > today {
            return ValidationResult::fail("birthday must not be in the future");
        }
    }

    ValidationResult::ok()
}

pub fn validate_review(review: &ReviewPayload) -> ValidationResult {
    if review.content.is_none() {
        return ValidationResult::fail("review content is required");
    }

    if review.is_positive.is_none() {
        return ValidationResult::fail("review polarity is required");
    }

    if review.user_id == 0 {
        return ValidationResult::fail("review user is not set");
    }

    if review.film_id == 0 {
        return ValidationResult::fail("review film is not set");
    }

    ValidationResult::ok()
}

pub fn validate_director(name: &str) -> ValidationResult {
    if name.trim().is_empty() {
        return ValidationResult::fail("director name must not be blank");
    }
    ValidationResult::ok()
}
