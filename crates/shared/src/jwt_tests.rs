//! Unit tests for JWT functionality.

#[cfg(test)]
mod tests {
    use crate::auth::{Claims, TokenKind};
    use crate::jwt::{JwtConfig, JwtError, JwtService};
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-for-testing-only!";

    fn create_test_service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: SECRET.to_string(),
            access_token_expires_secs: 900,
            refresh_token_expires_secs: 3600,
        })
    }

    fn ids() -> (Uuid, Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = create_test_service();
        let (user, tenant, session) = ids();

        let issued = service
            .generate_access_token(user, tenant, session)
            .unwrap();
        let claims = service.validate_token(&issued.token).unwrap();

        assert_eq!(claims.user_id(), user);
        assert_eq!(claims.tenant_id(), tenant);
        assert_eq!(claims.session_id(), session);
        assert_eq!(claims.typ, TokenKind::Access);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_refresh_token_lifetime() {
        let service = create_test_service();
        let (user, tenant, session) = ids();
        let before = Utc::now().timestamp();

        let issued = service
            .generate_refresh_token(user, tenant, session)
            .unwrap();
        let claims = service.validate_token(&issued.token).unwrap();

        assert_eq!(claims.typ, TokenKind::Refresh);
        assert!(claims.exp >= before + 3600);
        assert!(claims.exp <= Utc::now().timestamp() + 3600);
    }

    #[test]
    fn test_validate_token_kind_rejects_refresh_as_access() {
        let service = create_test_service();
        let (user, tenant, session) = ids();
        let refresh = service
            .generate_refresh_token(user, tenant, session)
            .unwrap();

        let result = service.validate_token_kind(&refresh.token, TokenKind::Access);
        assert!(matches!(
            result,
            Err(JwtError::WrongKind {
                expected: TokenKind::Access,
                actual: TokenKind::Refresh
            })
        ));

        assert!(
            service
                .validate_token_kind(&refresh.token, TokenKind::Refresh)
                .is_ok()
        );
    }

    #[test]
    fn test_expired_token() {
        let service = create_test_service();
        let (user, tenant, session) = ids();
        let claims = Claims::new(
            user,
            tenant,
            session,
            TokenKind::Access,
            Utc::now() - Duration::minutes(5),
        );
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_token_signed_with_other_secret() {
        let service = create_test_service();
        let other = JwtService::new(JwtConfig {
            secret: "another-secret-key-for-testing-only".to_string(),
            ..JwtConfig::default()
        });
        let (user, tenant, session) = ids();
        let issued = other.generate_access_token(user, tenant, session).unwrap();

        assert!(matches!(
            service.validate_token(&issued.token),
            Err(JwtError::DecodingError(_))
        ));
    }

    #[test]
    fn test_invalid_token() {
        let service = create_test_service();
        assert!(service.validate_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_expires_in_accessors() {
        let service = create_test_service();
        assert_eq!(service.access_token_expires_in(), 900);
        assert_eq!(service.refresh_token_expires_in(), 3600);
    }

    #[test]
    fn test_debug_hides_secret() {
        let service = create_test_service();
        let debug = format!("{service:?}");
        assert!(!debug.contains(SECRET));
    }

    #[test]
    fn test_config_lifetime_is_capped_not_wrapped() {
        use crate::config::{JwtConfig as JwtSettings, MAX_TOKEN_EXPIRY_SECS};

        let settings = JwtSettings {
            secret: SECRET.to_string(),
            access_token_expiry_secs: u64::MAX,
            refresh_token_expiry_secs: 604_800,
        };
        let config = JwtConfig::from(&settings);

        assert_eq!(
            config.access_token_expires_secs,
            i64::try_from(MAX_TOKEN_EXPIRY_SECS).unwrap()
        );
        assert_eq!(config.refresh_token_expires_secs, 604_800);

        let service = JwtService::new(config);
        let (user, tenant, session) = ids();
        let issued = service.generate_access_token(user, tenant, session).unwrap();
        assert!(issued.expires_at > Utc::now() + Duration::days(364));
    }
}

