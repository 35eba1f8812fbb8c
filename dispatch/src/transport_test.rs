use super::*;

#[test]
fn backstop_outlasts_any_attempt_timeout() {
    for secs in [1, 20, 60, 600] {
        let attempt = Duration::from_secs(secs);
        assert!(backstop_timeout(attempt) > attempt, "attempt timeout {secs}s is capped");
    }
    assert_eq!(backstop_timeout(Duration::MAX), Duration::MAX);
}

#[test]
fn builds_with_long_attempt_timeout() {
    assert!(ReqwestTransport::new(Duration::from_secs(1), Duration::from_secs(300)).is_ok());
}

#[test]
fn response_success_range() {
    assert!(RawResponse::new(204, "").is_success());
    assert!(!RawResponse::new(301, "").is_success());
    assert!(!RawResponse::new(199, "").is_success());
}
