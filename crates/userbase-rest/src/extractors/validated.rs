//! Validated JSON extractor for automatic request validation.
//!
//! `ValidatedJson<T>` deserializes a JSON body and runs the `validator`
//! rules on it. Both failures come back as a [`ValidatedJsonRejection`],
//! which a handler turns into its own error envelope.

use crate::responses::{AppError, REQUEST_FAILED};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use userbase_core::{field_errors, validation_errors_to_userbase_error, UserbaseError};
use validator::{Validate, ValidationErrors};

/// JSON extractor that automatically validates the deserialized value.
///
/// # Example
///
/// ```ignore
/// use userbase_rest::extractors::ValidatedJson;
///
/// async fn register(ValidatedJson(request): ValidatedJson<RegisterRequest>) {
///     // request passed its validation rules here
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T> std::ops::Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Rejection type for validated JSON extraction.
#[derive(Debug)]
pub enum ValidatedJsonRejection {
    /// JSON parsing/deserialization error.
    JsonError(JsonRejection),
    /// Validation error with field-level details.
    ValidationError(ValidationErrors),
}

impl ValidatedJsonRejection {
    /// Converts the rejection into an error envelope under `message`.
    #[must_use]
    pub fn into_app_error(self, message: &'static str) -> AppError {
        match self {
            Self::JsonError(rejection) => AppError::new(
                message,
                UserbaseError::validation(format!("Invalid JSON: {}", rejection.body_text())),
            ),
            Self::ValidationError(errors) => {
                AppError::new(message, validation_errors_to_userbase_error(&errors))
                    .with_details(field_errors(&errors))
            }
        }
    }
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        self.into_app_error(REQUEST_FAILED).into_response()
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::JsonError)?;

        value
            .validate()
            .map_err(ValidatedJsonRejection::ValidationError)?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header::CONTENT_TYPE, http::StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct TestRequest {
        #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
        name: String,
        #[validate(email(message = "Invalid email format"))]
        email: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_request_passes() {
        let request = json_request(r#"{"name": "Valid Name", "email": "valid@example.com"}"#);
        let ValidatedJson(value) = ValidatedJson::<TestRequest>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(value.name, "Valid Name");
    }

    #[tokio::test]
    async fn test_invalid_fields_are_reported() {
        let request = json_request(r#"{"name": "ab", "email": "invalid"}"#);
        let rejection = ValidatedJson::<TestRequest>::from_request(request, &())
            .await
            .unwrap_err();

        let ValidatedJsonRejection::ValidationError(ref errors) = rejection else {
            panic!("expected a validation rejection");
        };
        let fields = field_errors(errors);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "email");
        assert_eq!(fields[1].message, "Name must be at least 3 characters");

        let error = rejection.into_app_error("failed");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() {
        let request = json_request(r#"{"name": "#);
        let rejection = ValidatedJson::<TestRequest>::from_request(request, &())
            .await
            .unwrap_err();

        assert!(matches!(rejection, ValidatedJsonRejection::JsonError(_)));
        let error = rejection.into_app_error("failed");
        assert!(matches!(error.error(), UserbaseError::Validation(m) if m.starts_with("Invalid JSON")));
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }
}
