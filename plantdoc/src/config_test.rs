use super::*;
use crate::test_helpers::env_guard;

const VARS: &[&str] = &[
    "PLANT_ID_API_KEY",
    "PLANT_ID_BASE_URL",
    "PLANT_ID_THRESHOLD",
    "PLANT_ID_TOP_ONLY",
    "GEMINI_API_KEY",
    "GEMINI_MODEL",
    "GEMINI_BASE_URL",
    "DISPATCH_MAX_ATTEMPTS",
    "DISPATCH_RETRY_BASE_MS",
    "DISPATCH_ATTEMPT_TIMEOUT_SECS",
    "DISPATCH_CONNECT_TIMEOUT_SECS",
    "SYMPTOM_THRESHOLD",
];

/// # Safety
/// Callers hold `env_guard()` so no other test reads the environment concurrently.
unsafe fn clear_env() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

// =============================================================================
// env_parse
// =============================================================================

#[test]
fn env_parse_missing_returns_default() {
    let val: u32 = env_parse("__PLANTDOC_TEST_MISSING__", 42);
    assert_eq!(val, 42);
}

#[test]
fn env_parse_invalid_returns_default() {
    let _guard = env_guard();
    unsafe { std::env::set_var("__PLANTDOC_TEST_INVALID__", "many") };
    let val: u64 = env_parse("__PLANTDOC_TEST_INVALID__", 7);
    assert_eq!(val, 7);
    unsafe { std::env::remove_var("__PLANTDOC_TEST_INVALID__") };
}

// =============================================================================
// DispatchConfig
// =============================================================================

#[test]
fn dispatch_defaults_match_policy_defaults() {
    let _guard = env_guard();
    unsafe { clear_env() };

    let cfg = DispatchConfig::from_env();
    assert_eq!(cfg.max_attempts, DEFAULT_MAX_ATTEMPTS);
    assert_eq!(cfg.retry_base_ms, DEFAULT_RETRY_BASE_MS);
    assert_eq!(cfg.retry_policy(), RetryPolicy::default());
    assert_eq!(cfg.connect_timeout(), Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));
}

#[test]
fn dispatch_overrides() {
    let _guard = env_guard();
    unsafe {
        clear_env();
        std::env::set_var("DISPATCH_MAX_ATTEMPTS", "5");
        std::env::set_var("DISPATCH_RETRY_BASE_MS", "250");
        std::env::set_var("DISPATCH_ATTEMPT_TIMEOUT_SECS", "15");
    }

    let policy = DispatchConfig::from_env().retry_policy();
    assert_eq!(policy.max_attempts(), 5);
    assert_eq!(policy.next_delay(2), Duration::from_millis(1000));
    assert_eq!(policy.attempt_timeout(), Duration::from_secs(15));

    unsafe { clear_env() };
}

// =============================================================================
// PlantIdConfig / GeminiConfig
// =============================================================================

#[test]
fn plant_id_requires_key() {
    let _guard = env_guard();
    unsafe { clear_env() };

    let err = PlantIdConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::MissingApiKey { ref var } if var == "PLANT_ID_API_KEY"));
}

#[test]
fn plant_id_defaults_and_trimmed_url() {
    let _guard = env_guard();
    unsafe {
        clear_env();
        std::env::set_var("PLANT_ID_API_KEY", "pid");
        std::env::set_var("PLANT_ID_BASE_URL", "http://localhost:9000/v2/");
        std::env::set_var("PLANT_ID_TOP_ONLY", "true");
    }

    let cfg = PlantIdConfig::from_env().unwrap();
    assert_eq!(cfg.api_key, "pid");
    assert_eq!(cfg.base_url, "http://localhost:9000/v2");
    assert!((cfg.threshold - DEFAULT_DIAGNOSIS_THRESHOLD).abs() < f64::EPSILON);
    assert!(cfg.top_only);

    unsafe { clear_env() };
}

#[test]
fn plant_id_rejects_out_of_range_threshold() {
    let _guard = env_guard();
    unsafe {
        clear_env();
        std::env::set_var("PLANT_ID_API_KEY", "pid");
        std::env::set_var("PLANT_ID_THRESHOLD", "1.5");
    }

    let err = PlantIdConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("PLANT_ID_THRESHOLD"));

    unsafe { clear_env() };
}

#[test]
fn gemini_defaults() {
    let _guard = env_guard();
    unsafe {
        clear_env();
        std::env::set_var("GEMINI_API_KEY", "g-key");
    }

    let cfg = GeminiConfig::from_env().unwrap();
    assert_eq!(cfg.model, DEFAULT_GEMINI_MODEL);
    assert_eq!(cfg.base_url, DEFAULT_GEMINI_BASE_URL);

    unsafe { clear_env() };
}

#[test]
fn blank_key_counts_as_missing() {
    let _guard = env_guard();
    unsafe {
        clear_env();
        std::env::set_var("GEMINI_API_KEY", "   ");
    }

    assert!(GeminiConfig::from_env().is_err());

    unsafe { clear_env() };
}

#[test]
fn symptom_threshold_default() {
    let _guard = env_guard();
    unsafe { clear_env() };
    assert!((symptom_threshold().unwrap() - DEFAULT_SYMPTOM_THRESHOLD).abs() < f64::EPSILON);
}

#[test]
fn validate_threshold_bounds() {
    assert_eq!(validate_threshold(0.0), Ok(0.0));
    assert_eq!(validate_threshold(1.0), Ok(1.0));
    assert!(validate_threshold(-0.1).is_err());
    assert!(validate_threshold(f64::NAN).is_err());
}
