//! Share-token access control tests
//!
//! Private orders are invisible without a matching token; revoked and
//! expired tokens produce distinct gone-style errors so a client can
//! tell the difference.

mod common;

use chrono::{Duration, Utc};
use server::error::ApiError;
use server::models::Order;
use server::services::OrderService;

use common::{private_order, seed_user, test_pool};

const ALICE: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const BOB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

#[tokio::test]
async fn private_order_requires_matching_token() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let service = OrderService::new(pool);

    let created = service.create(private_order(), alice.id).await.unwrap();
    let order_id = created.order.id;
    let token = created.order.share_token.clone().expect("token on creation");

    // No token, no session.
    let err = service.get_detail(order_id, None, None).await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    // Wrong token.
    let err = service
        .get_detail(order_id, Some("not-the-token".to_string()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    // Matching token.
    let fetched = service
        .get_detail(order_id, Some(token), None)
        .await
        .unwrap();
    assert_eq!(fetched.order.id, order_id);
}

#[tokio::test]
async fn listing_never_exposes_share_tokens() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let service = OrderService::new(pool);

    let created = service.create(private_order(), alice.id).await.unwrap();
    assert!(created.order.share_token.is_some());

    // Even with private rows included, the listing redacts the token.
    let page = service
        .list(server::models::order::OrderListFilter {
            status: None,
            include_private: true,
            limit: 20,
            offset: 0,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert!(page.orders[0].order.is_private);
    assert!(page.orders[0].order.share_token.is_none());
}

#[tokio::test]
async fn parties_bypass_the_token_gate() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let bob = seed_user(&pool, BOB);
    let service = OrderService::new(pool);

    let created = service.create(private_order(), alice.id).await.unwrap();
    let order_id = created.order.id;

    // Creator needs no token.
    service
        .get_detail(order_id, None, Some(alice.id))
        .await
        .unwrap();

    // A random session does.
    let err = service
        .get_detail(order_id, None, Some(bob.id))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    // Once bob accepts he is a party and needs no token either.
    service.accept(order_id, bob.id).await.unwrap();
    service
        .get_detail(order_id, None, Some(bob.id))
        .await
        .unwrap();
}

#[tokio::test]
async fn revoked_token_is_gone_not_forbidden() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let service = OrderService::new(pool.clone());

    let created = service.create(private_order(), alice.id).await.unwrap();
    let order_id = created.order.id;
    let token = created.order.share_token.clone().unwrap();

    service.revoke_share_token(order_id, alice.id).await.unwrap();

    let err = service
        .get_detail(order_id, Some(token), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Revoked(_)));
}

#[tokio::test]
async fn expired_token_is_gone() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let service = OrderService::new(pool.clone());

    let created = service.create(private_order(), alice.id).await.unwrap();
    let order_id = created.order.id;

    // Backdate the expiry directly.
    let past = Utc::now().naive_utc() - Duration::days(1);
    let token = {
        let mut conn = pool.get().unwrap();
        Order::set_share_token(&mut conn, order_id, "backdated-token", Some(past)).unwrap();
        "backdated-token".to_string()
    };

    let err = service
        .get_detail(order_id, Some(token), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Expired(_)));
}

#[tokio::test]
async fn revocation_beats_expiry() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let service = OrderService::new(pool.clone());

    let created = service.create(private_order(), alice.id).await.unwrap();
    let order_id = created.order.id;

    let past = Utc::now().naive_utc() - Duration::days(1);
    {
        let mut conn = pool.get().unwrap();
        Order::set_share_token(&mut conn, order_id, "stale-token", Some(past)).unwrap();
        Order::revoke_share_token(&mut conn, order_id).unwrap();
    }

    // Both revoked and expired: revocation wins.
    let err = service
        .get_detail(order_id, Some("stale-token".to_string()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Revoked(_)));
}

#[tokio::test]
async fn regenerating_clears_revocation_and_rotates_token() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let bob = seed_user(&pool, BOB);
    let service = OrderService::new(pool);

    let created = service.create(private_order(), alice.id).await.unwrap();
    let order_id = created.order.id;
    let old_token = created.order.share_token.clone().unwrap();

    service.revoke_share_token(order_id, alice.id).await.unwrap();

    // Only the creator may mint a new link.
    let err = service
        .generate_share_token(order_id, bob.id, Some(3))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    let updated = service
        .generate_share_token(order_id, alice.id, Some(3))
        .await
        .unwrap();
    let new_token = updated.share_token.clone().unwrap();
    assert_ne!(new_token, old_token);
    assert!(!updated.share_token_revoked);
    assert!(updated.share_token_expires_at.is_some());

    // Old token no longer matches; new one works.
    let err = service
        .get_detail(order_id, Some(old_token), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));
    service
        .get_detail(order_id, Some(new_token), None)
        .await
        .unwrap();
}
