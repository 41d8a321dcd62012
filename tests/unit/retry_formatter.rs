use fontshare_downloader::downloader::retry::{FailureKind, RetryClassification, RetryContext};
use fontshare_downloader::fetcher::FetcherError;

fn sample_context(kind: FailureKind) -> RetryContext<'static> {
    RetryContext {
        attempt: 2,
        max_attempts: 4,
        identifier: "clash-display",
        kind,
    }
}

#[test]
fn format_retry_names_next_attempt_and_cause() {
    let message = sample_context(FailureKind::RateLimit).format_retry();
    assert!(message.contains("clash-display"));
    assert!(message.contains("attempt 3/4"));
    assert!(message.contains("rate limit exceeded (HTTP 429)"));
}

#[test]
fn format_failure_reports_attempts_for_transient_failures() {
    let message = sample_context(FailureKind::ServerError(503)).format_failure();
    assert!(message.contains("failed after 2 attempt(s)"));
    assert!(message.contains("service unavailable (HTTP 503)"));
}

#[test]
fn format_failure_without_retry_for_permanent_first_attempt() {
    let ctx = RetryContext {
        attempt: 1,
        ..sample_context(FailureKind::NotFound(404))
    };
    let message = ctx.format_failure();
    assert!(message.contains("failed without retry"));
    assert!(message.contains("resource not found (HTTP 404)"));
}

#[test]
fn transport_errors_are_classified() {
    assert_eq!(
        FailureKind::from_fetcher_error(&FetcherError::Timeout("t".into())),
        FailureKind::NetworkTimeout
    );
    assert_eq!(
        FailureKind::from_fetcher_error(&FetcherError::Connect("refused".into())),
        FailureKind::NetworkOffline
    );
    assert_eq!(
        FailureKind::from_fetcher_error(&FetcherError::Body("reset".into())),
        FailureKind::BodyInterrupted
    );
    assert_eq!(FailureKind::NetworkOffline.to_string(), "connection failed");
}

#[test]
fn classification_policies_differ_only_on_permanent_kinds() {
    let kinds = [
        FailureKind::NetworkTimeout,
        FailureKind::RateLimit,
        FailureKind::ServerError(500),
        FailureKind::NotFound(404),
        FailureKind::AccessDenied(403),
        FailureKind::UnexpectedStatus(400),
    ];
    for kind in kinds {
        assert!(RetryClassification::Uniform.is_retryable(kind));
        assert_eq!(
            RetryClassification::ByStatus.is_retryable(kind),
            kind.is_transient()
        );
    }
    assert!(!RetryClassification::ByStatus.is_retryable(FailureKind::NotFound(410)));
}
