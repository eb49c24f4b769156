use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::ServiceError;

/// Header carrying the authenticated operator identity, injected by the
/// upstream gateway after it has performed authentication.
pub const OPERATOR_HEADER: &str = "x-operator-id";

/// Authenticated operator identity required on every mutating endpoint.
/// Identity verification itself is external; this extractor only insists
/// the gateway attached one.
#[derive(Debug, Clone)]
pub struct Operator(pub String);

impl Operator {
    pub fn id(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Operator
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OPERATOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ServiceError::Unauthorized(format!("Missing {} header", OPERATOR_HEADER))
            })?;

        Ok(Operator(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn extracts_operator_from_header() {
        let request = Request::builder()
            .header(OPERATOR_HEADER, "ops-7")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let operator = Operator::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(operator.id(), "ops-7");
    }

    #[tokio::test]
    async fn missing_or_blank_header_is_unauthorized() {
        let request = Request::builder().body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        assert!(Operator::from_request_parts(&mut parts, &()).await.is_err());

        let request = Request::builder()
            .header(OPERATOR_HEADER, "   ")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        assert!(Operator::from_request_parts(&mut parts, &()).await.is_err());
    }
}
