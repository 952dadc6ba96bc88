use std::sync::Arc;

use auth_adapters::{AnonymousIdentity, Claims, JwtVerifier};
use chrono::{Duration, Utc};
use configs::AppConfig;
use domains::{ContentStatus, DomainError, Role};
use integration_tests::{fields, Harness};
use jsonwebtoken::{encode, EncodingKey, Header};
use services::ContentService;
use tokio_test::{assert_err, assert_ok};

const SECRET: &str = "integration-secret-0123456789abcdef";

fn config() -> AppConfig {
    AppConfig::from_toml(&format!(
        "[auth]\njwt_secret = \"{SECRET}\"\nissuer = \"school-desk\"\n"
    ))
    .unwrap()
}

fn verifier() -> Arc<JwtVerifier> {
    let config = config();
    let secret = config.auth.jwt_secret.as_ref().unwrap();
    Arc::new(JwtVerifier::new(secret, config.auth.issuer.as_deref()))
}

fn bearer(sub: &str, role: Role, issuer: &str) -> String {
    let claims = Claims {
        sub: sub.into(),
        name: format!("User {sub}"),
        role: role.as_str().into(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as u64,
        iss: Some(issuer.into()),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

fn content_for(h: &Harness, verifier: &Arc<JwtVerifier>, header: Option<&str>) -> ContentService {
    ContentService::new(h.content.clone(), Arc::new(verifier.for_request(header)))
}

#[tokio::test]
async fn token_roles_drive_the_workflow() {
    let h = Harness::new();
    let verifier = verifier();
    let teacher_header = bearer("t-7", Role::Teacher, "school-desk");
    let admin_header = bearer("a-3", Role::Admin, "school-desk");

    let author = content_for(&h, &verifier, Some(&teacher_header));
    let moderator = content_for(&h, &verifier, Some(&admin_header));

    let draft = assert_ok!(author.create_content(fields("Token post")).await);
    assert_eq!(draft.author_id, "t-7");
    assert_eq!(draft.author_name, "User t-7");
    assert_ok!(author.submit(draft.id).await);

    let err = assert_err!(author.approve(draft.id).await);
    assert!(matches!(err, DomainError::Unauthorized(_)));

    let approved = assert_ok!(moderator.approve(draft.id).await);
    assert_eq!(approved.status, ContentStatus::Approved);
    assert_eq!(approved.reviewed_by.as_deref(), Some("a-3"));
}

#[tokio::test]
async fn foreign_issuer_and_garbage_are_refused() {
    let h = Harness::new();
    let verifier = verifier();
    let foreign = bearer("t-7", Role::Admin, "someone-else");

    for header in [Some(foreign.as_str()), Some("Bearer not-a-jwt"), None] {
        let service = content_for(&h, &verifier, header);
        let err = assert_err!(service.create_content(fields("Nope")).await);
        assert!(matches!(err, DomainError::Unauthorized(_)), "{header:?}");
    }
}

#[tokio::test]
async fn anonymous_callers_still_read_the_public_feed() {
    let h = Harness::new();
    let admin_header = bearer("a-3", Role::Admin, "school-desk");
    let moderator = content_for(&h, &verifier(), Some(&admin_header));
    let post = assert_ok!(moderator.create_content(fields("Open to all")).await);
    assert_ok!(moderator.publish(post.id).await);

    let anonymous = ContentService::new(h.content.clone(), Arc::new(AnonymousIdentity));
    let feed = assert_ok!(anonymous.list_published(None, None, 0).await);
    assert_eq!(feed.total, 1);
    assert_ok!(anonymous.get_published(&post.slug).await);

    let err = assert_err!(anonymous.create_content(fields("Spam")).await);
    assert!(matches!(err, DomainError::Unauthorized(_)));
}
