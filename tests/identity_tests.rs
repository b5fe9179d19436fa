use std::path::PathBuf;

use campadmin::db::{Store, WriteOutcome};
use campadmin::domain::{ApplicantRole, BaseIdentity, Credentialed, Identity, IdentityKind};
use campadmin::services::credentials::{authenticate, hash_with_salt};
use campadmin::services::username::UsernameError;
use campadmin::services::{
    BootcampService, IdentityError, IdentityService, NewBootcamp, NewIdentity, ProviderProfile,
    SeaOrmBootcampService, SeaOrmIdentityService,
};
use serde_json::json;

struct TestDb {
    path: PathBuf,
    store: Store,
}

impl TestDb {
    async fn new() -> Self {
        let path = std::env::temp_dir().join(format!("campadmin-test-{}.db", uuid::Uuid::new_v4()));
        let store = Store::new(&format!("sqlite:{}", path.display()))
            .await
            .expect("Failed to open test database");
        Self { path, store }
    }

    fn identities(&self, max_attempts: Option<u32>) -> SeaOrmIdentityService {
        SeaOrmIdentityService::new(self.store.clone(), max_attempts)
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        std::fs::remove_file(&self.path).ok();
    }
}

fn new_identity(username: &str, password: &str) -> NewIdentity {
    NewIdentity {
        first_name: "Test".to_string(),
        last_name: "Person".to_string(),
        email: format!("{username}@example.com"),
        username: username.to_string(),
        password: password.to_string(),
        test_score: Some(50.0),
    }
}

fn github_profile(subject: &str, provider_data: serde_json::Value) -> ProviderProfile {
    ProviderProfile {
        provider: "github".to_string(),
        subject: subject.to_string(),
        username: "octo".to_string(),
        first_name: "Octo".to_string(),
        last_name: "Cat".to_string(),
        email: "octo@example.com".to_string(),
        provider_data,
    }
}

#[tokio::test]
async fn test_register_stores_hash_not_plaintext() {
    let db = TestDb::new().await;
    let service = db.identities(None);

    let created = service
        .register(IdentityKind::Applicant, new_identity("ada", "difference-engine"))
        .await
        .unwrap();

    let stored = db.store.get_identity(created.id()).await.unwrap().unwrap();
    let base = stored.identity();
    let salt = base.salt.as_deref().expect("salt should be set");

    assert_ne!(base.password, "difference-engine");
    assert_eq!(base.password, hash_with_salt("difference-engine", Some(salt)));
    assert!(authenticate(&stored, "difference-engine"));

    let signed_in = service.sign_in("ada", "difference-engine").await.unwrap();
    assert_eq!(signed_in.id(), created.id());

    assert!(matches!(
        service.sign_in("ada", "Difference-engine").await,
        Err(IdentityError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_updates_do_not_rehash() {
    let db = TestDb::new().await;
    let service = db.identities(None);

    let created = service
        .register(IdentityKind::Applicant, new_identity("grace", "compiler-first"))
        .await
        .unwrap();
    let before = db.store.get_identity(created.id()).await.unwrap().unwrap();

    service
        .change_applicant_role(created.id(), ApplicantRole::Fellow)
        .await
        .unwrap();

    let after = db.store.get_identity(created.id()).await.unwrap().unwrap();
    assert_eq!(after.identity().password, before.identity().password);
    assert_eq!(after.identity().salt, before.identity().salt);
    assert!(after.identity().updated.is_some());
    assert_eq!(
        after.as_applicant().unwrap().details.role,
        Some(ApplicantRole::Fellow)
    );
}

#[tokio::test]
async fn test_change_password_rotates_salt() {
    let db = TestDb::new().await;
    let service = db.identities(None);

    let created = service
        .register(IdentityKind::User, new_identity("linus", "first-kernel"))
        .await
        .unwrap();
    let old_salt = created.identity().salt.clone();

    let err = service
        .change_password(created.id(), "wrong-current", "second-kernel")
        .await
        .unwrap_err();
    match err {
        IdentityError::Validation(report) => assert!(report.has_error("currentPassword")),
        other => panic!("expected validation error, got {other:?}"),
    }

    service
        .change_password(created.id(), "first-kernel", "second-kernel")
        .await
        .unwrap();

    let stored = db.store.get_identity(created.id()).await.unwrap().unwrap();
    assert_ne!(stored.identity().salt, old_salt);
    assert!(authenticate(&stored, "second-kernel"));
    assert!(!authenticate(&stored, "first-kernel"));
}

#[tokio::test]
async fn test_stale_revision_is_rejected() {
    let db = TestDb::new().await;
    let service = db.identities(None);

    let created = service
        .register(IdentityKind::User, new_identity("race", "condition-pass"))
        .await
        .unwrap();

    let mut first = db.store.get_identity(created.id()).await.unwrap().unwrap();
    let mut second = first.clone();

    first.identity_mut().first_name = "First".to_string();
    second.identity_mut().first_name = "Second".to_string();

    assert_eq!(
        db.store.update_identity(&first).await.unwrap(),
        WriteOutcome::Written
    );
    assert_eq!(
        db.store.update_identity(&second).await.unwrap(),
        WriteOutcome::Stale
    );

    let stored = db.store.get_identity(created.id()).await.unwrap().unwrap();
    assert_eq!(stored.identity().first_name, "First");
}

#[tokio::test]
async fn test_resolve_username_against_database() {
    let db = TestDb::new().await;
    let service = db.identities(None);

    assert_eq!(service.resolve_username("alex").await.unwrap(), "alex");

    service
        .register(IdentityKind::User, new_identity("alex", "password-one"))
        .await
        .unwrap();
    service
        .register(IdentityKind::Applicant, new_identity("alex1", "password-two"))
        .await
        .unwrap();

    assert_eq!(service.resolve_username("alex").await.unwrap(), "alex2");
    assert_eq!(service.resolve_username("  alex ").await.unwrap(), "alex2");

    let capped = db.identities(Some(2));
    assert!(matches!(
        capped.resolve_username("alex").await,
        Err(IdentityError::Username(UsernameError::Exhausted { attempts: 2, .. }))
    ));
}

#[tokio::test]
async fn test_duplicate_username_across_kinds() {
    let db = TestDb::new().await;
    let service = db.identities(None);

    service
        .register(IdentityKind::User, new_identity("shared", "password-one"))
        .await
        .unwrap();

    let err = service
        .register(IdentityKind::Applicant, new_identity("shared", "password-two"))
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::Conflict(_)));
}

#[tokio::test]
async fn test_rate_skill_rejects_plain_users() {
    let db = TestDb::new().await;
    let service = db.identities(None);

    let user = service
        .register(IdentityKind::User, new_identity("plain", "plain-password"))
        .await
        .unwrap();

    assert!(matches!(
        service.rate_skill(user.id(), "Rust", 3.0).await,
        Err(IdentityError::KindMismatch {
            found: IdentityKind::User,
            ..
        })
    ));

    service.delete(user.id()).await.unwrap();
    assert!(matches!(
        service.delete(user.id()).await,
        Err(IdentityError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_embedded_applicant_hashes_like_top_level() {
    let db = TestDb::new().await;
    let camps = SeaOrmBootcampService::new(db.store.clone());

    let camp = camps
        .create(
            NewBootcamp {
                name: "Cohort 3".to_string(),
                start_date: None,
                end_date: None,
            },
            None,
        )
        .await
        .unwrap();

    let enrolled = camps
        .enroll_applicant(&camp.id, new_identity("dorothy", "vaughan-fortran"))
        .await
        .unwrap();

    let stored = camps.get(&camp.id).await.unwrap();
    let embedded = stored.applicant(&enrolled.identity.id).unwrap();
    let salt = embedded.identity.salt.as_deref().unwrap();

    assert_eq!(
        embedded.identity.password,
        hash_with_salt("vaughan-fortran", Some(salt))
    );
    assert!(authenticate(embedded, "vaughan-fortran"));
    assert_eq!(embedded.details.camp_id.as_ref(), Some(&camp.id));

    let top_level = db.store.get_identity(&enrolled.identity.id).await.unwrap().unwrap();
    assert_eq!(top_level.identity().password, embedded.identity.password);
    assert_eq!(top_level.identity().salt, embedded.identity.salt);
}

#[tokio::test]
async fn test_enrolled_username_is_taken_everywhere() {
    let db = TestDb::new().await;
    let camps = SeaOrmBootcampService::new(db.store.clone());
    let service = db.identities(None);

    let mut ids = Vec::new();
    for name in ["Cohort A", "Cohort B"] {
        let camp = camps
            .create(
                NewBootcamp {
                    name: name.to_string(),
                    start_date: None,
                    end_date: None,
                },
                None,
            )
            .await
            .unwrap();
        ids.push(camp.id);
    }

    camps
        .enroll_applicant(&ids[0], new_identity("bob", "builder-pass"))
        .await
        .unwrap();

    assert!(matches!(
        camps
            .enroll_applicant(&ids[1], new_identity("bob", "builder-pass"))
            .await,
        Err(campadmin::services::BootcampError::Conflict(_))
    ));
    assert!(matches!(
        service
            .register(IdentityKind::User, new_identity("bob", "another-pass"))
            .await,
        Err(IdentityError::Conflict(_))
    ));
    assert_eq!(service.resolve_username("bob").await.unwrap(), "bob1");

    let signed_in = service.sign_in("bob", "builder-pass").await.unwrap();
    assert_eq!(signed_in.kind(), IdentityKind::Applicant);
    assert!(camps.get(&ids[1]).await.unwrap().applicants.is_empty());
}

#[tokio::test]
async fn test_returning_provider_login_finds_same_account() {
    let db = TestDb::new().await;
    let service = db.identities(None);

    let profile = github_profile("42", json!({ "id": "gh-node-abc", "login": "octo" }));

    let first = service.sign_in_with_provider(profile.clone()).await.unwrap();
    let second = service.sign_in_with_provider(profile).await.unwrap();

    assert_eq!(first.id(), second.id());
    assert_eq!(second.username(), "octo");
    assert_eq!(second.identity().provider_data["id"], "42");
    assert_eq!(service.resolve_username("octo").await.unwrap(), "octo1");
}

#[tokio::test]
async fn test_provider_account_cannot_sign_in_with_password() {
    let db = TestDb::new().await;
    let service = db.identities(None);

    let identity = service
        .sign_in_with_provider(github_profile("7", json!({})))
        .await
        .unwrap();
    assert!(identity.identity().salt.is_none());

    for candidate in ["", "anything-long"] {
        assert!(matches!(
            service.sign_in("octo", candidate).await,
            Err(IdentityError::InvalidCredentials)
        ));
    }

    match service.change_password(identity.id(), "", "brand-new-pass").await {
        Err(IdentityError::Validation(report)) => assert!(report.has_error("currentPassword")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_provider_subject_is_unique_per_provider() {
    let db = TestDb::new().await;

    let mut first = BaseIdentity::new("one", "github");
    first.provider_data = json!({ "id": "99" });
    let mut second = BaseIdentity::new("two", "github");
    second.provider_data = json!({ "id": "99" });
    let mut other_provider = BaseIdentity::new("three", "gitlab");
    other_provider.provider_data = json!({ "id": "99" });

    assert_eq!(
        db.store.insert_identity(&Identity::User(first)).await.unwrap(),
        WriteOutcome::Written
    );
    assert_eq!(
        db.store.insert_identity(&Identity::User(second)).await.unwrap(),
        WriteOutcome::Duplicate
    );
    assert_eq!(
        db.store
            .insert_identity(&Identity::User(other_provider))
            .await
            .unwrap(),
        WriteOutcome::Written
    );

    // Local accounts carry no subject and never collide on it.
    let service = db.identities(None);
    service
        .register(IdentityKind::User, new_identity("local-a", "password-a"))
        .await
        .unwrap();
    service
        .register(IdentityKind::User, new_identity("local-b", "password-b"))
        .await
        .unwrap();
}
