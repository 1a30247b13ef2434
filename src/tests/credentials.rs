// Credential resolution: looked up on every request, never cached.

#[cfg(test)]
mod test {
    use std::fs;

    use serial_test::serial;
    use tempfile::tempdir;

    use crate::auth::{ConfiguredTokenProvider, NoCredential, TokenProvider};
    use crate::config::credentials::{CredentialConfig, CredentialValue};
    use crate::error::{Phase, RpError};

    #[tokio::test]
    async fn literal_value_defaults_to_authorization_header() {
        let provider = ConfiguredTokenProvider::from_config(&CredentialConfig {
            header: None,
            prefix: Some("Bearer ".into()),
            value: CredentialValue::Literal { value: "abc".into() },
        });

        let header = provider.auth_header().await.unwrap().unwrap();
        assert_eq!(header.name, "Authorization");
        assert_eq!(header.value, "Bearer abc");
        assert!(!format!("{header:?}").contains("abc"));
    }

    #[tokio::test]
    #[serial]
    async fn env_value_is_read_on_every_call() {
        std::env::set_var("RP_TEST_TOKEN", "first");
        let provider = ConfiguredTokenProvider::new(
            "x-ms-authorization-auxiliary",
            None,
            CredentialValue::FromEnv { from_env: "RP_TEST_TOKEN".into() },
        );

        assert_eq!(provider.auth_header().await.unwrap().unwrap().value, "first");
        std::env::set_var("RP_TEST_TOKEN", "second");
        let header = provider.auth_header().await.unwrap().unwrap();
        assert_eq!(header.name, "x-ms-authorization-auxiliary");
        assert_eq!(header.value, "second");

        std::env::remove_var("RP_TEST_TOKEN");
        let err = provider.auth_header().await.unwrap_err();
        assert!(matches!(err, RpError::Credential(_)));
    }

    #[tokio::test]
    async fn file_value_follows_rotation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "token-one\n").unwrap();

        let provider = ConfiguredTokenProvider::new(
            "Authorization",
            Some("Bearer ".into()),
            CredentialValue::FromFile { path: path.to_string_lossy().into_owned() },
        );

        assert_eq!(provider.auth_header().await.unwrap().unwrap().value, "Bearer token-one");
        fs::write(&path, "token-two").unwrap();
        assert_eq!(provider.auth_header().await.unwrap().unwrap().value, "Bearer token-two");
    }

    #[tokio::test]
    async fn empty_value_is_a_credential_error() {
        let provider = ConfiguredTokenProvider::new(
            "Authorization",
            None,
            CredentialValue::Literal { value: String::new() },
        );

        let err = provider.auth_header().await.unwrap_err();
        assert_eq!(err.phase(), Phase::Credential);
        assert!(err.to_string().contains("no authority token provided"));
    }

    #[tokio::test]
    async fn no_credential_sends_nothing() {
        assert!(NoCredential.auth_header().await.unwrap().is_none());
    }

    #[test]
    fn credential_value_shapes_deserialize() {
        let literal: CredentialValue = serde_yaml::from_str("value: abc").unwrap();
        let env: CredentialValue = serde_yaml::from_str("from_env: TOKEN").unwrap();
        let file: CredentialValue = serde_yaml::from_str("path: /var/run/token").unwrap();

        assert_eq!(literal, CredentialValue::Literal { value: "abc".into() });
        assert_eq!(env, CredentialValue::FromEnv { from_env: "TOKEN".into() });
        assert_eq!(file, CredentialValue::FromFile { path: "/var/run/token".into() });
    }
}
