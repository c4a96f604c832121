use super::*;

// =============================================================================
// bytes_to_hex / generate_token
// =============================================================================

#[test]
fn bytes_to_hex_leading_zero() {
    assert_eq!(bytes_to_hex(&[0x0a, 0xff]), "0aff");
}

#[test]
fn bytes_to_hex_empty() {
    assert_eq!(bytes_to_hex(&[]), "");
}

#[test]
fn generate_token_is_64_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn generate_token_two_calls_differ() {
    assert_ne!(generate_token(), generate_token());
}

// =============================================================================
// MockCredentialExchange
// =============================================================================

#[tokio::test]
async fn exchange_fabricates_admin_with_wildcard() {
    let backend = MockCredentialExchange::new(Duration::ZERO);
    let grant = backend.exchange("alice", "x").await.unwrap();

    assert_eq!(grant.user.username, "alice");
    assert_eq!(grant.user.email, "alice@skywatch.local");
    assert_eq!(grant.user.role, Role::Admin);
    assert!(grant.user.has_permission("anything"));
    assert_eq!(grant.user.last_login, None);
    assert_eq!(grant.token.len(), 64);
}

#[tokio::test]
async fn exchange_trims_username() {
    let backend = MockCredentialExchange::new(Duration::ZERO);
    let grant = backend.exchange("  bob ", "pw").await.unwrap();
    assert_eq!(grant.user.username, "bob");
}

#[tokio::test]
async fn exchange_issues_distinct_identities() {
    let backend = MockCredentialExchange::new(Duration::ZERO);
    let a = backend.exchange("alice", "x").await.unwrap();
    let b = backend.exchange("alice", "x").await.unwrap();
    assert_ne!(a.user.id, b.user.id);
    assert_ne!(a.token, b.token);
}

#[tokio::test]
async fn exchange_rejects_blank_credentials() {
    let backend = MockCredentialExchange::new(Duration::ZERO);
    assert_eq!(backend.exchange("   ", "x").await, Err(AuthError::MissingCredentials));
    assert_eq!(backend.exchange("alice", "").await, Err(AuthError::MissingCredentials));
}

#[tokio::test(start_paused = true)]
async fn exchange_waits_for_latency() {
    let backend = MockCredentialExchange::new(Duration::from_secs(1));
    let started = tokio::time::Instant::now();
    backend.exchange("alice", "x").await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn validate_accepts_non_empty_token() {
    let backend = MockCredentialExchange::new(Duration::ZERO);
    assert_eq!(backend.validate(&generate_token()).await, Ok(()));
}

#[tokio::test]
async fn validate_rejects_empty_token() {
    let backend = MockCredentialExchange::new(Duration::ZERO);
    assert!(matches!(backend.validate("").await, Err(AuthError::TokenRejected(_))));
}
