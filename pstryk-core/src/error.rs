use reqwest::StatusCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by [`PstrykClient`](crate::PstrykClient).
///
/// Configuration variants are raised while constructing the client and never
/// involve the network. Everything that goes wrong during a request is passed
/// through as the underlying [`reqwest::Error`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "No API key provided.\n\
         Hint: run `pstryk configure` or set PSTRYK_API_KEY."
    )]
    MissingApiKey,

    #[error("API key contains characters that cannot be sent in an HTTP header")]
    InvalidApiKey,

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn is_config(&self) -> bool {
        !matches!(self, Error::Http(_))
    }

    /// HTTP status of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Http(err) if err.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_have_no_status() {
        let err = Error::MissingApiKey;
        assert!(err.is_config());
        assert_eq!(err.status(), None);
        assert!(!err.is_timeout());
    }

    #[test]
    fn missing_api_key_message_has_hint() {
        let msg = Error::MissingApiKey.to_string();
        assert!(msg.contains("No API key provided"));
        assert!(msg.contains("pstryk configure"));
    }

    #[test]
    fn invalid_base_url_message_names_url() {
        let err = Error::InvalidBaseUrl { url: "nope".into(), reason: "relative URL without a base".into() };
        assert_eq!(err.to_string(), "Invalid base URL 'nope': relative URL without a base");
    }
}
