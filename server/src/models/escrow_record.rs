//! Escrow record model
//!
//! Off-chain bookkeeping for an on-chain escrow, 1:1 with an order. The
//! server records caller-reported transaction hashes; it never submits
//! transactions itself. `chain_escrow_id` is the contract-side numeric
//! id, 0 until the chain assigns one.

use anyhow::{Context, Result};
use barter_marketplace_common::EscrowStatus;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::escrow_records;

#[derive(Debug, Clone, Serialize, Queryable, Identifiable)]
#[diesel(table_name = escrow_records)]
#[serde(rename_all = "camelCase")]
pub struct EscrowRecord {
    pub id: i32,
    pub order_id: i32,
    #[serde(rename = "escrowId")]
    pub chain_escrow_id: i64,
    pub contract_address: String,
    pub chain: String,
    pub asset_type: String,
    pub token_address: Option<String>,
    /// Base-10 integer string in the asset's smallest unit (wei).
    pub amount: String,
    /// Creator wallet, lowercase.
    pub creator: String,
    /// Accepter wallet, lowercase; bound at escrow acceptance if not preset.
    pub accepter: Option<String>,
    pub status: String,
    pub tx_hash: Option<String>,
    pub created_at: NaiveDateTime,
    pub funded_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = escrow_records)]
pub struct NewEscrowRecord {
    pub order_id: i32,
    pub chain_escrow_id: i64,
    pub contract_address: String,
    pub chain: String,
    pub asset_type: String,
    pub token_address: Option<String>,
    pub amount: String,
    pub creator: String,
    pub accepter: Option<String>,
    pub status: String,
}

impl EscrowRecord {
    pub fn create(conn: &mut SqliteConnection, new_record: &NewEscrowRecord) -> Result<EscrowRecord> {
        diesel::insert_into(escrow_records::table)
            .values(new_record)
            .get_result(conn)
            .context("Failed to insert escrow record")
    }

    pub fn find_by_id(conn: &mut SqliteConnection, record_id: i32) -> Result<Option<EscrowRecord>> {
        escrow_records::table
            .find(record_id)
            .first(conn)
            .optional()
            .context("Failed to load escrow record")
    }

    pub fn find_by_order(conn: &mut SqliteConnection, order_id: i32) -> Result<Option<EscrowRecord>> {
        escrow_records::table
            .filter(escrow_records::order_id.eq(order_id))
            .first(conn)
            .optional()
            .context("Failed to load escrow record by order")
    }

    /// PENDING → FUNDED, recording the deposit transaction.
    pub fn mark_funded(
        conn: &mut SqliteConnection,
        record_id: i32,
        tx_hash: &str,
        now: NaiveDateTime,
    ) -> Result<usize> {
        diesel::update(
            escrow_records::table
                .find(record_id)
                .filter(escrow_records::status.eq(EscrowStatus::Pending.as_str())),
        )
        .set((
            escrow_records::status.eq(EscrowStatus::Funded.as_str()),
            escrow_records::tx_hash.eq(tx_hash),
            escrow_records::funded_at.eq(now),
        ))
        .execute(conn)
        .context("Failed to mark escrow funded")
    }

    /// Record the contract-assigned escrow id once the chain reports it.
    pub fn set_chain_escrow_id(
        conn: &mut SqliteConnection,
        record_id: i32,
        chain_escrow_id: i64,
    ) -> Result<usize> {
        diesel::update(escrow_records::table.find(record_id))
            .set(escrow_records::chain_escrow_id.eq(chain_escrow_id))
            .execute(conn)
            .context("Failed to set chain escrow id")
    }

    /// FUNDED → ACCEPTED, binding the accepter wallet.
    pub fn mark_accepted(
        conn: &mut SqliteConnection,
        record_id: i32,
        accepter_wallet: &str,
        tx_hash: Option<&str>,
    ) -> Result<usize> {
        let target = escrow_records::table
            .find(record_id)
            .filter(escrow_records::status.eq(EscrowStatus::Funded.as_str()));

        match tx_hash {
            Some(tx) => diesel::update(target)
                .set((
                    escrow_records::status.eq(EscrowStatus::Accepted.as_str()),
                    escrow_records::accepter.eq(accepter_wallet),
                    escrow_records::tx_hash.eq(tx),
                ))
                .execute(conn),
            None => diesel::update(target)
                .set((
                    escrow_records::status.eq(EscrowStatus::Accepted.as_str()),
                    escrow_records::accepter.eq(accepter_wallet),
                ))
                .execute(conn),
        }
        .context("Failed to mark escrow accepted")
    }

    /// ACCEPTED → COMPLETED, recording the release transaction.
    pub fn mark_completed(
        conn: &mut SqliteConnection,
        record_id: i32,
        tx_hash: &str,
        now: NaiveDateTime,
    ) -> Result<usize> {
        diesel::update(
            escrow_records::table
                .find(record_id)
                .filter(escrow_records::status.eq(EscrowStatus::Accepted.as_str())),
        )
        .set((
            escrow_records::status.eq(EscrowStatus::Completed.as_str()),
            escrow_records::tx_hash.eq(tx_hash),
            escrow_records::completed_at.eq(now),
        ))
        .execute(conn)
        .context("Failed to mark escrow completed")
    }
}
