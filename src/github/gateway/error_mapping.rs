//! Error mapping helpers for the Octocrab gateway implementation.

use http::StatusCode;

use crate::github::error::SyncError;

/// Checks if a GitHub error status indicates an authentication failure.
pub(super) const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Checks if an octocrab error represents a network/transport issue.
pub(super) const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// Checks whether the GitHub error represents a rate limit error based on the
/// HTTP status and message / documentation URL content.
pub(super) fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    rate_limit_signals(
        source.status_code,
        &source.message,
        source.documentation_url.as_deref(),
    )
}

fn rate_limit_signals(status: StatusCode, message: &str, documentation_url: Option<&str>) -> bool {
    let is_rate_limit_status = matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS);

    let message_indicates_rate_limit = message.to_lowercase().contains("rate limit")
        || documentation_url.is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status && message_indicates_rate_limit
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> SyncError {
    if let octocrab::Error::GitHub { source, .. } = error {
        if is_rate_limit_error(source) {
            return SyncError::RateLimited {
                message: format!(
                    "{operation} failed: GitHub returned {status} {message}",
                    status = source.status_code,
                    message = source.message
                ),
            };
        }

        if source.status_code == StatusCode::NOT_FOUND {
            return SyncError::NotFound {
                message: format!("{operation} failed: {message}", message = source.message),
            };
        }

        return if is_auth_failure(source.status_code) {
            SyncError::Authentication {
                message: format!(
                    "{operation} failed: GitHub returned {status} {message}",
                    status = source.status_code,
                    message = source.message
                ),
            }
        } else {
            SyncError::Api {
                message: format!(
                    "{operation} failed with status {status}: {message}",
                    status = source.status_code,
                    message = source.message
                ),
            }
        };
    }

    if is_network_error(error) {
        return SyncError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    SyncError::Api {
        message: format!("{operation} failed: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::{is_auth_failure, rate_limit_signals};

    #[test]
    fn forbidden_with_rate_limit_message_is_rate_limited() {
        assert!(rate_limit_signals(
            StatusCode::FORBIDDEN,
            "API rate limit exceeded",
            None
        ));
    }

    #[test]
    fn forbidden_without_rate_limit_hint_is_an_auth_failure() {
        assert!(!rate_limit_signals(
            StatusCode::FORBIDDEN,
            "Resource not accessible",
            None
        ));
        assert!(is_auth_failure(StatusCode::FORBIDDEN));
    }

    #[test]
    fn documentation_url_alone_marks_a_rate_limit() {
        assert!(rate_limit_signals(
            StatusCode::TOO_MANY_REQUESTS,
            "slow down",
            Some("https://docs.github.com/rest/overview/rate-limits-for-the-rest-api"),
        ));
    }
}
