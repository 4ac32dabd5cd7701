use thiserror::Error;

#[derive(Debug, Error)]
pub enum MercadoApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Marketplace API call failed. Error {status}. {message}")]
    UpstreamStatus { status: u16, message: String },
    #[error("No usable access token: {0}")]
    TokenUnavailable(String),
}

impl MercadoApiError {
    /// Whether the client should retry the call after a fixed delay. Only rate limiting (429) and
    /// server-side failures (5xx) qualify; everything else is surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            MercadoApiError::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::MercadoApiError;

    #[test]
    fn only_rate_limits_and_server_errors_are_retryable() {
        let too_many = MercadoApiError::UpstreamStatus { status: 429, message: "local_rate_limited".into() };
        let unavailable = MercadoApiError::UpstreamStatus { status: 503, message: "maintenance".into() };
        let not_found = MercadoApiError::UpstreamStatus { status: 404, message: "order not found".into() };
        let forbidden = MercadoApiError::UpstreamStatus { status: 403, message: "invalid token".into() };
        assert!(too_many.is_retryable());
        assert!(unavailable.is_retryable());
        assert!(!not_found.is_retryable());
        assert!(!forbidden.is_retryable());
        assert!(!MercadoApiError::JsonError("bad payload".into()).is_retryable());
    }
}
