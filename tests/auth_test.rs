//! Integration tests for the chat authorization handshake.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use id_history::auth::{generate_secret, ChatAuthorizer, ChatMembership, SECRET_ALPHABET};
use id_history::db::Database;
use id_history::error::{AuthFailure, IdHistoryError, Result};
use id_history::models::ChatStanding;
use tempfile::tempdir;

const SUPERADMIN: i64 = 1000;
const ADMIN: i64 = 7;
const CHAT: i64 = -42;
const TITLE: &str = "Group 1234567890 Chat";

struct StubMembership(ChatStanding);

#[async_trait]
impl ChatMembership for StubMembership {
    async fn standing(&self, _chat_id: i64, _user_id: i64) -> Result<ChatStanding> {
        Ok(self.0)
    }
}

struct FailingMembership;

#[async_trait]
impl ChatMembership for FailingMembership {
    async fn standing(&self, _chat_id: i64, _user_id: i64) -> Result<ChatStanding> {
        Err(IdHistoryError::Other("platform unreachable".to_string()))
    }
}

struct SlowMembership;

#[async_trait]
impl ChatMembership for SlowMembership {
    async fn standing(&self, _chat_id: i64, _user_id: i64) -> Result<ChatStanding> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(ChatStanding::Owner)
    }
}

fn setup(dir: &tempfile::TempDir) -> (Arc<Database>, ChatAuthorizer) {
    let db_path = dir.path().join("test.db");
    let db = Arc::new(
        Database::new(&format!("sqlite://{}", db_path.display()))
            .expect("Failed to create database"),
    );
    db.add_admin(ADMIN).expect("add admin");
    let authorizer = ChatAuthorizer::new(Arc::clone(&db), SUPERADMIN, Duration::from_secs(5));
    (db, authorizer)
}

fn auth_failure(result: std::result::Result<String, IdHistoryError>) -> AuthFailure {
    match result {
        Err(IdHistoryError::Auth(failure)) => failure,
        other => panic!("expected authorization failure, got {other:?}"),
    }
}

#[test]
fn test_secret_shape() {
    for _ in 0..50 {
        let secret = generate_secret();
        assert_eq!(secret.len(), 8);
        assert!(secret.bytes().all(|b| SECRET_ALPHABET.contains(&b)));
        // the ambiguous characters are not in the alphabet at all
        assert!(!secret.contains(|c| matches!(c, 'O' | '0' | 'I' | '1')));
    }
}

#[test]
fn test_issue_requires_admin_standing() {
    let dir = tempdir().expect("temp dir");
    let (_db, authorizer) = setup(&dir);

    assert!(matches!(
        authorizer.issue_secret(55),
        Err(IdHistoryError::Auth(AuthFailure::AdminsOnly))
    ));
    assert!(authorizer.issue_secret(ADMIN).is_ok());
    // the superadmin needs no admin row
    assert!(authorizer.issue_secret(SUPERADMIN).is_ok());
}

#[tokio::test]
async fn test_claim_happy_path() {
    let dir = tempdir().expect("temp dir");
    let (db, authorizer) = setup(&dir);
    let membership = StubMembership(ChatStanding::Administrator);

    let secret = authorizer.issue_secret(ADMIN).expect("issue");
    let female_id = authorizer
        .claim(ADMIN, CHAT, TITLE, Some(&secret), &membership)
        .await
        .expect("claim");
    assert_eq!(female_id, "1234567890");

    let chat = db
        .get_authorized_chat(CHAT)
        .expect("get")
        .expect("chat recorded");
    assert_eq!(chat.female_id, "1234567890");
    assert_eq!(chat.title, TITLE);
    assert_eq!(chat.added_by, ADMIN);

    // a successful claim consumes the secret
    let failure = auth_failure(
        authorizer
            .claim(ADMIN, CHAT, TITLE, Some(&secret), &membership)
            .await,
    );
    assert!(matches!(failure, AuthFailure::BadOrExpiredToken));
}

#[tokio::test]
async fn test_member_standing_is_rejected_even_with_matching_token() {
    let dir = tempdir().expect("temp dir");
    let (db, authorizer) = setup(&dir);

    let secret = authorizer.issue_secret(ADMIN).expect("issue");
    let failure = auth_failure(
        authorizer
            .claim(
                ADMIN,
                CHAT,
                TITLE,
                Some(&secret),
                &StubMembership(ChatStanding::Member),
            )
            .await,
    );
    assert!(matches!(failure, AuthFailure::NotChatAdmin));
    assert!(db.get_authorized_chat(CHAT).expect("get").is_none());

    // rejection does not consume the secret; retry with owner standing works
    let female_id = authorizer
        .claim(
            ADMIN,
            CHAT,
            TITLE,
            Some(&secret),
            &StubMembership(ChatStanding::Owner),
        )
        .await
        .expect("retry claim");
    assert_eq!(female_id, "1234567890");
}

#[tokio::test]
async fn test_wrong_token_does_not_consume_secret() {
    let dir = tempdir().expect("temp dir");
    let (_db, authorizer) = setup(&dir);
    let membership = StubMembership(ChatStanding::Administrator);

    let secret = authorizer.issue_secret(ADMIN).expect("issue");
    let failure = auth_failure(
        authorizer
            .claim(ADMIN, CHAT, TITLE, Some("WRONGTOK"), &membership)
            .await,
    );
    assert!(matches!(failure, AuthFailure::BadOrExpiredToken));

    // the stored secret survived the bad guess
    assert!(authorizer
        .claim(ADMIN, CHAT, TITLE, Some(&secret), &membership)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let dir = tempdir().expect("temp dir");
    let (_db, authorizer) = setup(&dir);
    let membership = StubMembership(ChatStanding::Administrator);

    authorizer.issue_secret(ADMIN).expect("issue");
    let failure = auth_failure(authorizer.claim(ADMIN, CHAT, TITLE, None, &membership).await);
    assert!(matches!(failure, AuthFailure::MissingToken));

    let failure = auth_failure(
        authorizer
            .claim(ADMIN, CHAT, TITLE, Some("   "), &membership)
            .await,
    );
    assert!(matches!(failure, AuthFailure::MissingToken));
}

#[tokio::test]
async fn test_claim_without_admin_standing_is_rejected() {
    let dir = tempdir().expect("temp dir");
    let (_db, authorizer) = setup(&dir);

    let failure = auth_failure(
        authorizer
            .claim(
                55,
                CHAT,
                TITLE,
                Some("ABCDEFGH"),
                &StubMembership(ChatStanding::Owner),
            )
            .await,
    );
    assert!(matches!(failure, AuthFailure::AdminsOnly));
}

#[tokio::test]
async fn test_title_without_identifier_is_rejected() {
    let dir = tempdir().expect("temp dir");
    let (db, authorizer) = setup(&dir);
    let membership = StubMembership(ChatStanding::Administrator);

    let secret = authorizer.issue_secret(ADMIN).expect("issue");
    let failure = auth_failure(
        authorizer
            .claim(ADMIN, CHAT, "Friendly Chat", Some(&secret), &membership)
            .await,
    );
    assert!(matches!(failure, AuthFailure::NoIdentifierInTitle));
    assert!(db.get_authorized_chat(CHAT).expect("get").is_none());

    // an 11-digit run is not an identifier either
    let failure = auth_failure(
        authorizer
            .claim(
                ADMIN,
                CHAT,
                "Group 12345678901 Chat",
                Some(&secret),
                &membership,
            )
            .await,
    );
    assert!(matches!(failure, AuthFailure::NoIdentifierInTitle));
}

#[tokio::test]
async fn test_membership_failure_rejects_attempt() {
    let dir = tempdir().expect("temp dir");
    let (db, authorizer) = setup(&dir);

    let secret = authorizer.issue_secret(ADMIN).expect("issue");
    let failure = auth_failure(
        authorizer
            .claim(ADMIN, CHAT, TITLE, Some(&secret), &FailingMembership)
            .await,
    );
    assert!(matches!(failure, AuthFailure::Membership(_)));
    assert!(db.get_authorized_chat(CHAT).expect("get").is_none());
}

#[tokio::test]
async fn test_membership_timeout_rejects_attempt() {
    let dir = tempdir().expect("temp dir");
    let db_path = dir.path().join("test.db");
    let db = Arc::new(
        Database::new(&format!("sqlite://{}", db_path.display()))
            .expect("Failed to create database"),
    );
    db.add_admin(ADMIN).expect("add admin");
    let authorizer =
        ChatAuthorizer::new(Arc::clone(&db), SUPERADMIN, Duration::from_millis(20));

    let secret = authorizer.issue_secret(ADMIN).expect("issue");
    let failure = auth_failure(
        authorizer
            .claim(ADMIN, CHAT, TITLE, Some(&secret), &SlowMembership)
            .await,
    );
    assert!(matches!(failure, AuthFailure::Membership(_)));
}

#[tokio::test]
async fn test_reauthorization_replaces_binding() {
    let dir = tempdir().expect("temp dir");
    let (db, authorizer) = setup(&dir);
    let membership = StubMembership(ChatStanding::Owner);

    let secret = authorizer.issue_secret(ADMIN).expect("issue");
    authorizer
        .claim(ADMIN, CHAT, TITLE, Some(&secret), &membership)
        .await
        .expect("first claim");

    // the chat was renamed and gets re-authorized by the superadmin
    let secret = authorizer.issue_secret(SUPERADMIN).expect("issue");
    let female_id = authorizer
        .claim(
            SUPERADMIN,
            CHAT,
            "Group 9999999999 Chat",
            Some(&secret),
            &membership,
        )
        .await
        .expect("second claim");
    assert_eq!(female_id, "9999999999");

    let chat = db
        .get_authorized_chat(CHAT)
        .expect("get")
        .expect("chat present");
    assert_eq!(chat.female_id, "9999999999");
    assert_eq!(chat.added_by, SUPERADMIN);
}

#[test]
fn test_revoke_is_superadmin_only() {
    let dir = tempdir().expect("temp dir");
    let (db, authorizer) = setup(&dir);

    db.add_authorized_chat(CHAT, TITLE, "1234567890", ADMIN)
        .expect("seed chat");

    // an ordinary bot admin cannot revoke
    assert!(matches!(
        authorizer.revoke(CHAT, ADMIN),
        Err(IdHistoryError::Auth(AuthFailure::SuperadminOnly))
    ));
    assert!(db.get_authorized_chat(CHAT).expect("get").is_some());

    assert!(authorizer.revoke(CHAT, SUPERADMIN).expect("revoke"));
    assert!(db.get_authorized_chat(CHAT).expect("get").is_none());
    // revoking an unknown chat succeeds without removing anything
    assert!(!authorizer.revoke(CHAT, SUPERADMIN).expect("revoke again"));
}
