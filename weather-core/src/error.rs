//! Classification of transport and provider failures into the stable,
//! user-facing error taxonomy reported on the event channel.

use crate::transport::TransportError;

/// Closed set of user-facing error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport-level failure, including timeouts.
    Network,
    /// The provider answered with a non-success status.
    Api,
    /// The payload was not decodable as the expected structure.
    Parsing,
    /// Caller input or parsed data failed a sanity check.
    Validation,
    /// Missing or malformed API credential.
    Configuration,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Api => "api",
            ErrorCategory::Parsing => "parsing",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Configuration => "configuration",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a transport failure to a category and a human-readable message.
pub fn classify_transport_error(err: &TransportError) -> (ErrorCategory, String) {
    let message = match err {
        TransportError::ConnectionRefused => "connection refused - check your internet connection",
        TransportError::RemoteHostClosed => "weather server unavailable",
        TransportError::HostNotFound => "weather server not found",
        TransportError::Timeout => "request timed out",
        TransportError::TlsHandshake => "TLS handshake failed",
        TransportError::Other(_) => "unknown network error",
    };

    (ErrorCategory::Network, message.to_string())
}

/// Map a non-success provider status to a category and message.
///
/// Known statuses carry fixed messages; anything else falls back to the
/// provider-supplied message text.
pub fn classify_provider_error(status: u16, provider_message: &str) -> (ErrorCategory, String) {
    match status {
        401 => (ErrorCategory::Configuration, "invalid credentials".to_string()),
        404 => (ErrorCategory::Api, "location not found".to_string()),
        429 => (ErrorCategory::Api, "rate limit exceeded".to_string()),
        500..=599 => (ErrorCategory::Api, "provider unavailable".to_string()),
        _ => {
            let message = if provider_message.is_empty() {
                "unknown provider error".to_string()
            } else {
                provider_message.to_string()
            };
            (ErrorCategory::Api, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_network_category() {
        for err in [
            TransportError::ConnectionRefused,
            TransportError::RemoteHostClosed,
            TransportError::HostNotFound,
            TransportError::Timeout,
            TransportError::TlsHandshake,
            TransportError::Other("socket closed".to_string()),
        ] {
            let (category, message) = classify_transport_error(&err);
            assert_eq!(category, ErrorCategory::Network);
            assert!(!message.is_empty());
        }
    }

    #[test]
    fn unknown_transport_error_gets_generic_message() {
        let (_, message) = classify_transport_error(&TransportError::Other("x".to_string()));
        assert_eq!(message, "unknown network error");
    }

    #[test]
    fn timeout_maps_to_network() {
        let (category, message) = classify_transport_error(&TransportError::Timeout);
        assert_eq!(category, ErrorCategory::Network);
        assert_eq!(message, "request timed out");
    }

    #[test]
    fn known_provider_statuses_map_to_fixed_messages() {
        assert_eq!(
            classify_provider_error(401, ""),
            (ErrorCategory::Configuration, "invalid credentials".to_string())
        );
        assert_eq!(
            classify_provider_error(404, "city not found"),
            (ErrorCategory::Api, "location not found".to_string())
        );
        assert_eq!(
            classify_provider_error(429, ""),
            (ErrorCategory::Api, "rate limit exceeded".to_string())
        );
        for status in [500, 502, 503, 599] {
            assert_eq!(
                classify_provider_error(status, ""),
                (ErrorCategory::Api, "provider unavailable".to_string())
            );
        }
    }

    #[test]
    fn unmapped_status_falls_back_to_provider_message() {
        let (category, message) = classify_provider_error(418, "short and stout");
        assert_eq!(category, ErrorCategory::Api);
        assert_eq!(message, "short and stout");
    }

    #[test]
    fn unmapped_status_with_empty_message_is_generic() {
        let (_, message) = classify_provider_error(418, "");
        assert_eq!(message, "unknown provider error");
    }

    #[test]
    fn category_strings_are_stable() {
        assert_eq!(ErrorCategory::Network.as_str(), "network");
        assert_eq!(ErrorCategory::Api.as_str(), "api");
        assert_eq!(ErrorCategory::Parsing.as_str(), "parsing");
        assert_eq!(ErrorCategory::Validation.as_str(), "validation");
        assert_eq!(ErrorCategory::Configuration.as_str(), "configuration");
    }
}
