// ═══════════════════════════════════════════════════════════════════
// Error Tests: CoreError variants, Display formatting, From impls
// ═══════════════════════════════════════════════════════════════════

use fund_valuation_core::errors::CoreError;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn provider_unavailable() {
        let err = CoreError::ProviderUnavailable {
            provider: "Tencent".into(),
            message: "timed out".into(),
        };
        assert_eq!(err.to_string(), "Provider unavailable (Tencent): timed out");
    }

    #[test]
    fn malformed_response() {
        let err = CoreError::MalformedResponse {
            provider: "Eastmoney".into(),
            message: "bad NAV change 'x'".into(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed response (Eastmoney): bad NAV change 'x'"
        );
    }

    #[test]
    fn network() {
        let err = CoreError::Network("connection refused".into());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn deserialization() {
        let err = CoreError::Deserialization("expected value".into());
        assert_eq!(err.to_string(), "Deserialization error: expected value");
    }

    #[test]
    fn unresolvable_fund() {
        let err = CoreError::UnresolvableFund("999999".into());
        assert_eq!(
            err.to_string(),
            "Fund 999999 could not be resolved to any metadata"
        );
    }

    #[test]
    fn invalid_config() {
        let err = CoreError::InvalidConfig("max_depth must be at least 1".into());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: max_depth must be at least 1"
        );
    }

    #[test]
    fn file_io() {
        let err = CoreError::FileIO("not found".into());
        assert_eq!(err.to_string(), "File I/O error: not found");
    }
}

// ── Recoverability ──────────────────────────────────────────────────

mod recoverable {
    use super::*;

    #[test]
    fn provider_failures_are_recoverable() {
        assert!(CoreError::ProviderUnavailable {
            provider: "p".into(),
            message: "m".into()
        }
        .is_recoverable());
        assert!(CoreError::MalformedResponse {
            provider: "p".into(),
            message: "m".into()
        }
        .is_recoverable());
        assert!(CoreError::Network("down".into()).is_recoverable());
        assert!(CoreError::Deserialization("bad".into()).is_recoverable());
    }

    #[test]
    fn resolution_and_config_errors_are_not() {
        assert!(!CoreError::UnresolvableFund("1".into()).is_recoverable());
        assert!(!CoreError::InvalidConfig("x".into()).is_recoverable());
        assert!(!CoreError::FileIO("x".into()).is_recoverable());
    }
}

// ── From impls ──────────────────────────────────────────────────────

mod conversions {
    use super::*;

    #[test]
    fn from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::FileIO(ref m) if m.contains("missing.json")));
    }

    #[test]
    fn from_serde_json_error() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CoreError = bad.into();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }

    #[test]
    fn errors_are_debug_and_send() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CoreError>();
        let err = CoreError::Network("x".into());
        assert!(format!("{err:?}").contains("Network"));
    }
}
