//! Escrow lifecycle integration tests
//!
//! Exercises PENDING → FUNDED → ACCEPTED → COMPLETED and asserts after
//! every transition that the denormalized mirror columns on the order
//! agree with the escrow record.

mod common;

use barter_marketplace_common::{AssetType, EscrowStatus, OrderStatus};
use server::error::ApiError;
use server::models::Order;
use server::services::escrow::CreateEscrowInput;
use server::services::{EscrowService, OrderService};

use common::{book_for_ipad, seed_user, test_chain_config, test_pool};

const ALICE: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const BOB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const CAROL: &str = "0xcccccccccccccccccccccccccccccccccccccccc";

fn tx(seed: u8) -> String {
    format!("0x{}", format!("{seed:02x}").repeat(32))
}

fn eth_escrow(order_id: i32) -> CreateEscrowInput {
    CreateEscrowInput {
        order_id,
        asset_type: AssetType::Eth,
        token_address: None,
        amount: "1000000000000000000".to_string(),
        accepter: None,
    }
}

fn assert_mirror(pool: &server::db::DbPool, order_id: i32, record: &server::models::EscrowRecord) {
    let mut conn = pool.get().unwrap();
    let order = Order::find_by_id(&mut conn, order_id).unwrap().unwrap();
    assert_eq!(order.escrow_id, Some(record.id));
    assert_eq!(order.escrow_address.as_deref(), Some(record.contract_address.as_str()));
    assert_eq!(order.escrow_status.as_deref(), Some(record.status.as_str()));
    assert_eq!(order.escrow_tx_hash, record.tx_hash);
}

#[tokio::test]
async fn full_escrow_lifecycle_mirrors_onto_order() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let bob = seed_user(&pool, BOB);
    let orders = OrderService::new(pool.clone());
    let escrow = EscrowService::new(pool.clone(), test_chain_config());

    let order = orders.create(book_for_ipad(), alice.id).await.unwrap();
    let order_id = order.order.id;

    // Create: PENDING, mirrored.
    let record = escrow.create(eth_escrow(order_id), alice.id).await.unwrap();
    assert_eq!(record.status, EscrowStatus::Pending.as_str());
    assert_eq!(record.creator, ALICE);
    assert_mirror(&pool, order_id, &record);

    // Fund: creator reports the deposit, chain id arrives.
    let record = escrow
        .fund(record.id, ALICE, &tx(0x11), Some(42))
        .await
        .unwrap();
    assert_eq!(record.status, EscrowStatus::Funded.as_str());
    assert_eq!(record.chain_escrow_id, 42);
    assert!(record.funded_at.is_some());
    assert_mirror(&pool, order_id, &record);

    // Accept: binds bob and advances the order itself.
    let record = escrow
        .accept(record.id, bob.id, BOB, Some(&tx(0x22)))
        .await
        .unwrap();
    assert_eq!(record.status, EscrowStatus::Accepted.as_str());
    assert_eq!(record.accepter.as_deref(), Some(BOB));
    assert_mirror(&pool, order_id, &record);
    {
        let mut conn = pool.get().unwrap();
        let order = Order::find_by_id(&mut conn, order_id).unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Accepted.as_str());
        assert_eq!(order.accepter_id, Some(bob.id));
    }

    // Complete: terminal for both record and order.
    let record = escrow.complete(record.id, BOB, &tx(0x33)).await.unwrap();
    assert_eq!(record.status, EscrowStatus::Completed.as_str());
    assert!(record.completed_at.is_some());
    assert_mirror(&pool, order_id, &record);
    {
        let mut conn = pool.get().unwrap();
        let order = Order::find_by_id(&mut conn, order_id).unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Completed.as_str());
        assert!(order.completed_at.is_some());
    }
}

#[tokio::test]
async fn create_is_creator_only_and_unique_per_order() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let bob = seed_user(&pool, BOB);
    let orders = OrderService::new(pool.clone());
    let escrow = EscrowService::new(pool, test_chain_config());

    let order = orders.create(book_for_ipad(), alice.id).await.unwrap();
    let order_id = order.order.id;

    let err = escrow.create(eth_escrow(order_id), bob.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    escrow.create(eth_escrow(order_id), alice.id).await.unwrap();
    let err = escrow
        .create(eth_escrow(order_id), alice.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidState(_)));
}

#[tokio::test]
async fn erc20_requires_token_address_and_eth_forbids_it() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let orders = OrderService::new(pool.clone());
    let escrow = EscrowService::new(pool, test_chain_config());

    let order = orders.create(book_for_ipad(), alice.id).await.unwrap();

    let mut input = eth_escrow(order.order.id);
    input.asset_type = AssetType::Erc20;
    let err = escrow.create(input, alice.id).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    let mut input = eth_escrow(order.order.id);
    input.token_address = Some("0xdddddddddddddddddddddddddddddddddddddddd".to_string());
    let err = escrow.create(input, alice.id).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn amount_must_be_integer_string() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let orders = OrderService::new(pool.clone());
    let escrow = EscrowService::new(pool, test_chain_config());

    let order = orders.create(book_for_ipad(), alice.id).await.unwrap();

    for bad in ["", "1.5", "-3", "1e18", "abc"] {
        let mut input = eth_escrow(order.order.id);
        input.amount = bad.to_string();
        let err = escrow.create(input, alice.id).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)), "amount {bad:?}");
    }

    // Zero is a valid (non-negative) amount.
    let order = orders.create(book_for_ipad(), alice.id).await.unwrap();
    let mut input = eth_escrow(order.order.id);
    input.amount = "0".to_string();
    let record = escrow.create(input, alice.id).await.unwrap();
    assert_eq!(record.amount, "0");
}

#[tokio::test]
async fn order_with_escrow_cannot_be_deleted() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let orders = OrderService::new(pool.clone());
    let escrow = EscrowService::new(pool, test_chain_config());

    let order = orders.create(book_for_ipad(), alice.id).await.unwrap();
    let order_id = order.order.id;
    escrow.create(eth_escrow(order_id), alice.id).await.unwrap();

    // Still PENDING and the creator is asking, but the escrow record
    // pins the order row.
    let err = orders.delete(order_id, alice.id).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidState(_)));

    orders.get_detail(order_id, None, None).await.unwrap();
}

#[tokio::test]
async fn fund_requires_creator_wallet_and_pending_status() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    seed_user(&pool, BOB);
    let orders = OrderService::new(pool.clone());
    let escrow = EscrowService::new(pool, test_chain_config());

    let order = orders.create(book_for_ipad(), alice.id).await.unwrap();
    let record = escrow
        .create(eth_escrow(order.order.id), alice.id)
        .await
        .unwrap();

    let err = escrow
        .fund(record.id, BOB, &tx(0x11), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    let err = escrow
        .fund(record.id, ALICE, "0x1234", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    escrow.fund(record.id, ALICE, &tx(0x11), None).await.unwrap();
    let err = escrow
        .fund(record.id, ALICE, &tx(0x12), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidState(_)));
}

#[tokio::test]
async fn accept_honors_preset_accepter_and_rejects_creator() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let bob = seed_user(&pool, BOB);
    let carol = seed_user(&pool, CAROL);
    let orders = OrderService::new(pool.clone());
    let escrow = EscrowService::new(pool, test_chain_config());

    let order = orders.create(book_for_ipad(), alice.id).await.unwrap();
    let mut input = eth_escrow(order.order.id);
    input.accepter = Some(BOB.to_string());
    let record = escrow.create(input, alice.id).await.unwrap();

    escrow.fund(record.id, ALICE, &tx(0x11), None).await.unwrap();

    // The creator cannot take their own escrow.
    let err = escrow
        .accept(record.id, alice.id, ALICE, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    // Reserved for bob: carol is turned away.
    let err = escrow
        .accept(record.id, carol.id, CAROL, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    let record = escrow.accept(record.id, bob.id, BOB, None).await.unwrap();
    assert_eq!(record.accepter.as_deref(), Some(BOB));
}

#[tokio::test]
async fn accept_requires_funded_and_complete_requires_accepted() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let bob = seed_user(&pool, BOB);
    let orders = OrderService::new(pool.clone());
    let escrow = EscrowService::new(pool, test_chain_config());

    let order = orders.create(book_for_ipad(), alice.id).await.unwrap();
    let record = escrow
        .create(eth_escrow(order.order.id), alice.id)
        .await
        .unwrap();

    // Still PENDING: cannot accept or complete.
    let err = escrow
        .accept(record.id, bob.id, BOB, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidState(_)));
    let err = escrow
        .complete(record.id, ALICE, &tx(0x33))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidState(_)));

    escrow.fund(record.id, ALICE, &tx(0x11), None).await.unwrap();
    escrow.accept(record.id, bob.id, BOB, None).await.unwrap();

    // A stranger cannot complete.
    let err = escrow
        .complete(record.id, CAROL, &tx(0x33))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    escrow.complete(record.id, ALICE, &tx(0x33)).await.unwrap();
}

#[tokio::test]
async fn status_lookups_by_record_and_order() {
    let pool = test_pool();
    let alice = seed_user(&pool, ALICE);
    let orders = OrderService::new(pool.clone());
    let escrow = EscrowService::new(pool, test_chain_config());

    let order = orders.create(book_for_ipad(), alice.id).await.unwrap();

    let err = escrow.status_by_order(order.order.id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let record = escrow
        .create(eth_escrow(order.order.id), alice.id)
        .await
        .unwrap();

    let by_record = escrow.status_by_record(record.id).await.unwrap();
    let by_order = escrow.status_by_order(order.order.id).await.unwrap();
    assert_eq!(by_record.id, by_order.id);
    assert_eq!(by_order.status, EscrowStatus::Pending.as_str());
}
