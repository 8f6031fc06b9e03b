use chrono::{Duration, Utc};
use garagemap_api::error::AppError;
use garagemap_api::identity::{Claims, JwtVerifier, TokenVerifier};
use garagemap_api::services::identity_service::split_display_name;
use jsonwebtoken::{EncodingKey, Header, encode};

#[test]
fn display_name_splits_at_the_first_whitespace() {
    assert_eq!(
        split_display_name("Asha Rao"),
        ("Asha".into(), "Rao".into())
    );
    assert_eq!(
        split_display_name("Ravi Kumar Swamy"),
        ("Ravi".into(), "Kumar Swamy".into())
    );
    assert_eq!(split_display_name("Madonna"), ("Madonna".into(), String::new()));
    assert_eq!(split_display_name(""), (String::new(), String::new()));
    assert_eq!(
        split_display_name("  spaced   out  "),
        ("spaced".into(), "out".into())
    );
}

fn token(secret: &str, sub: &str, email: Option<&str>, name: Option<&str>) -> String {
    let claims = Claims {
        sub: sub.into(),
        email: email.map(Into::into),
        name: name.map(Into::into),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[tokio::test]
async fn verifier_accepts_a_well_formed_token() {
    let verifier = JwtVerifier::new("test-secret");
    let token = token("test-secret", "uid-123", Some("asha@example.com"), Some("Asha Rao"));

    let identity = verifier.verify(&token).await.unwrap();
    assert_eq!(identity.subject_id, "uid-123");
    assert_eq!(identity.email.as_deref(), Some("asha@example.com"));
    assert_eq!(identity.display_name.as_deref(), Some("Asha Rao"));
}

#[tokio::test]
async fn verifier_rejects_a_token_signed_with_another_secret() {
    let verifier = JwtVerifier::new("test-secret");
    let token = token("other-secret", "uid-123", None, None);

    let err = verifier.verify(&token).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
}

#[tokio::test]
async fn verifier_rejects_an_empty_subject() {
    let verifier = JwtVerifier::new("test-secret");
    let token = token("test-secret", "", None, None);

    let err = verifier.verify(&token).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
}

#[tokio::test]
async fn verifier_rejects_garbage() {
    let verifier = JwtVerifier::new("test-secret");
    let err = verifier.verify("not-a-token").await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
}
