//! Escrow lifecycle service
//!
//! Off-chain bookkeeping for the on-chain escrow flow:
//! PENDING →(fund)→ FUNDED →(accept)→ ACCEPTED →(complete)→ COMPLETED.
//! Every mutation updates the escrow record and the denormalized mirror
//! columns on its order in one transaction, so the two views never
//! disagree. Transaction hashes are caller-reported and recorded as-is;
//! chain verification is out of scope for this service.

use barter_marketplace_common::{AssetType, EscrowStatus};
use chrono::Utc;
use diesel::prelude::*;
use tracing::info;

use crate::config::ChainConfig;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::{EscrowRecord, NewEscrowRecord, Order, User};
use crate::services::get_conn;
use crate::validation::{is_amount_string, is_tx_hash, normalize_eth_address};
use crate::{log_address, log_txid};

#[derive(Debug, Clone)]
pub struct CreateEscrowInput {
    pub order_id: i32,
    pub asset_type: AssetType,
    pub token_address: Option<String>,
    /// Base-10 integer string in the asset's smallest unit.
    pub amount: String,
    /// Optional pre-designated accepter wallet.
    pub accepter: Option<String>,
}

#[derive(Clone)]
pub struct EscrowService {
    pool: DbPool,
    chain: ChainConfig,
}

impl EscrowService {
    pub fn new(pool: DbPool, chain: ChainConfig) -> Self {
        Self { pool, chain }
    }

    /// Create the escrow record for an order. Creator only, one per order.
    pub async fn create(
        &self,
        input: CreateEscrowInput,
        acting_user_id: i32,
    ) -> Result<EscrowRecord, ApiError> {
        if !is_amount_string(&input.amount) {
            return Err(ApiError::BadRequest(
                "Amount must be a non-negative integer string in smallest units".to_string(),
            ));
        }

        let token_address = match (input.asset_type, input.token_address.as_deref()) {
            (AssetType::Erc20, Some(addr)) => Some(normalize_eth_address(addr).map_err(|_| {
                ApiError::BadRequest("Token address is not a valid Ethereum address".to_string())
            })?),
            (AssetType::Erc20, None) => {
                return Err(ApiError::BadRequest(
                    "Token address is required for ERC20 escrows".to_string(),
                ))
            }
            (AssetType::Eth, Some(_)) => {
                return Err(ApiError::BadRequest(
                    "Token address must be omitted for ETH escrows".to_string(),
                ))
            }
            (AssetType::Eth, None) => None,
        };

        let accepter = input
            .accepter
            .as_deref()
            .map(|addr| {
                normalize_eth_address(addr).map_err(|_| {
                    ApiError::BadRequest(
                        "Accepter address is not a valid Ethereum address".to_string(),
                    )
                })
            })
            .transpose()?;

        let contract_address = self.chain.contract_address.clone().ok_or_else(|| {
            ApiError::Internal("Escrow contract address is not configured".to_string())
        })?;
        let chain = self.chain.chain.clone();

        let pool = self.pool.clone();
        let record = tokio::task::spawn_blocking(move || -> Result<EscrowRecord, ApiError> {
            let mut conn = get_conn(&pool)?;

            conn.transaction::<EscrowRecord, ApiError, _>(|conn| {
                let order = Order::find_by_id(conn, input.order_id)?
                    .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

                if order.creator_id != acting_user_id {
                    return Err(ApiError::Forbidden(
                        "Only the order creator can create an escrow".to_string(),
                    ));
                }
                if EscrowRecord::find_by_order(conn, order.id)?.is_some() {
                    return Err(ApiError::InvalidState(
                        "Order already has an escrow".to_string(),
                    ));
                }

                let creator = User::find_by_id(conn, order.creator_id)?
                    .ok_or_else(|| ApiError::NotFound("Creator not found".to_string()))?;

                let record = EscrowRecord::create(
                    conn,
                    &NewEscrowRecord {
                        order_id: order.id,
                        chain_escrow_id: 0,
                        contract_address: contract_address.clone(),
                        chain,
                        asset_type: input.asset_type.as_str().to_string(),
                        token_address,
                        amount: input.amount.clone(),
                        creator: creator.wallet_address,
                        accepter,
                        status: EscrowStatus::Pending.as_str().to_string(),
                    },
                )?;

                Order::mirror_escrow_created(
                    conn,
                    order.id,
                    record.id,
                    &contract_address,
                    EscrowStatus::Pending.as_str(),
                )?;

                Ok(record)
            })
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))??;

        info!(
            escrow_record_id = record.id,
            order_id = record.order_id,
            asset_type = %record.asset_type,
            contract = %log_address!(&record.contract_address),
            "Escrow record created"
        );
        Ok(record)
    }

    /// PENDING → FUNDED. Only the escrow creator may report the deposit.
    pub async fn fund(
        &self,
        record_id: i32,
        acting_wallet: &str,
        tx_hash: &str,
        chain_escrow_id: Option<i64>,
    ) -> Result<EscrowRecord, ApiError> {
        let tx_hash = validate_tx_hash(tx_hash)?;
        let acting_wallet = acting_wallet.to_lowercase();

        let pool = self.pool.clone();
        let record = tokio::task::spawn_blocking(move || -> Result<EscrowRecord, ApiError> {
            let mut conn = get_conn(&pool)?;

            conn.transaction::<EscrowRecord, ApiError, _>(|conn| {
                let record = EscrowRecord::find_by_id(conn, record_id)?
                    .ok_or_else(|| ApiError::NotFound("Escrow record not found".to_string()))?;

                if record.creator != acting_wallet {
                    return Err(ApiError::Forbidden(
                        "Only the escrow creator can fund it".to_string(),
                    ));
                }

                let now = Utc::now().naive_utc();
                let updated = EscrowRecord::mark_funded(conn, record_id, &tx_hash, now)?;
                if updated == 0 {
                    return Err(ApiError::InvalidState(format!(
                        "Cannot fund escrow in {} status",
                        record.status
                    )));
                }
                if let Some(chain_id) = chain_escrow_id {
                    EscrowRecord::set_chain_escrow_id(conn, record_id, chain_id)?;
                }

                Order::mirror_escrow_status(
                    conn,
                    record.order_id,
                    EscrowStatus::Funded.as_str(),
                    Some(&tx_hash),
                )?;

                EscrowRecord::find_by_id(conn, record_id)?
                    .ok_or_else(|| ApiError::NotFound("Escrow record not found".to_string()))
            })
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))??;

        info!(
            escrow_record_id = record.id,
            order_id = record.order_id,
            tx = %log_txid!(record.tx_hash.as_deref().unwrap_or("")),
            "Escrow funded"
        );
        Ok(record)
    }

    /// FUNDED → ACCEPTED. If the record carries a preset accepter, only
    /// that wallet may accept; otherwise the caller's wallet is bound.
    /// Also advances the order itself to ACCEPTED in the same transaction.
    pub async fn accept(
        &self,
        record_id: i32,
        acting_user_id: i32,
        acting_wallet: &str,
        tx_hash: Option<&str>,
    ) -> Result<EscrowRecord, ApiError> {
        let tx_hash = tx_hash.map(validate_tx_hash).transpose()?;
        let acting_wallet = acting_wallet.to_lowercase();

        let pool = self.pool.clone();
        let record = tokio::task::spawn_blocking(move || -> Result<EscrowRecord, ApiError> {
            let mut conn = get_conn(&pool)?;

            conn.transaction::<EscrowRecord, ApiError, _>(|conn| {
                let record = EscrowRecord::find_by_id(conn, record_id)?
                    .ok_or_else(|| ApiError::NotFound("Escrow record not found".to_string()))?;

                if record.creator == acting_wallet {
                    return Err(ApiError::BadRequest(
                        "Cannot accept your own escrow".to_string(),
                    ));
                }
                if let Some(preset) = record.accepter.as_deref() {
                    if preset != acting_wallet {
                        return Err(ApiError::Forbidden(
                            "This escrow is reserved for a different wallet".to_string(),
                        ));
                    }
                }

                let updated = EscrowRecord::mark_accepted(
                    conn,
                    record_id,
                    &acting_wallet,
                    tx_hash.as_deref(),
                )?;
                if updated == 0 {
                    return Err(ApiError::InvalidState(format!(
                        "Cannot accept escrow in {} status",
                        record.status
                    )));
                }

                let now = Utc::now().naive_utc();
                Order::mirror_escrow_accepted(
                    conn,
                    record.order_id,
                    acting_user_id,
                    now,
                    tx_hash.as_deref(),
                )?;

                EscrowRecord::find_by_id(conn, record_id)?
                    .ok_or_else(|| ApiError::NotFound("Escrow record not found".to_string()))
            })
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))??;

        info!(
            escrow_record_id = record.id,
            order_id = record.order_id,
            accepter = %log_address!(record.accepter.as_deref().unwrap_or("")),
            "Escrow accepted"
        );
        Ok(record)
    }

    /// ACCEPTED → COMPLETED. Either party may report the release; the
    /// order moves to COMPLETED in the same transaction.
    pub async fn complete(
        &self,
        record_id: i32,
        acting_wallet: &str,
        tx_hash: &str,
    ) -> Result<EscrowRecord, ApiError> {
        let tx_hash = validate_tx_hash(tx_hash)?;
        let acting_wallet = acting_wallet.to_lowercase();

        let pool = self.pool.clone();
        let record = tokio::task::spawn_blocking(move || -> Result<EscrowRecord, ApiError> {
            let mut conn = get_conn(&pool)?;

            conn.transaction::<EscrowRecord, ApiError, _>(|conn| {
                let record = EscrowRecord::find_by_id(conn, record_id)?
                    .ok_or_else(|| ApiError::NotFound("Escrow record not found".to_string()))?;

                let is_party = record.creator == acting_wallet
                    || record.accepter.as_deref() == Some(acting_wallet.as_str());
                if !is_party {
                    return Err(ApiError::Forbidden(
                        "Only the escrow creator or accepter can complete it".to_string(),
                    ));
                }

                let now = Utc::now().naive_utc();
                let updated = EscrowRecord::mark_completed(conn, record_id, &tx_hash, now)?;
                if updated == 0 {
                    return Err(ApiError::InvalidState(format!(
                        "Cannot complete escrow in {} status",
                        record.status
                    )));
                }

                Order::mirror_escrow_completed(conn, record.order_id, now, &tx_hash)?;

                EscrowRecord::find_by_id(conn, record_id)?
                    .ok_or_else(|| ApiError::NotFound("Escrow record not found".to_string()))
            })
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))??;

        info!(
            escrow_record_id = record.id,
            order_id = record.order_id,
            tx = %log_txid!(record.tx_hash.as_deref().unwrap_or("")),
            "Escrow completed"
        );
        Ok(record)
    }

    pub async fn status_by_record(&self, record_id: i32) -> Result<EscrowRecord, ApiError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<EscrowRecord, ApiError> {
            let mut conn = get_conn(&pool)?;
            EscrowRecord::find_by_id(&mut conn, record_id)?
                .ok_or_else(|| ApiError::NotFound("Escrow record not found".to_string()))
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))?
    }

    pub async fn status_by_order(&self, order_id: i32) -> Result<EscrowRecord, ApiError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<EscrowRecord, ApiError> {
            let mut conn = get_conn(&pool)?;
            EscrowRecord::find_by_order(&mut conn, order_id)?
                .ok_or_else(|| ApiError::NotFound("No escrow exists for this order".to_string()))
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Database task panicked: {e}")))?
    }
}

fn validate_tx_hash(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    if !is_tx_hash(trimmed) {
        return Err(ApiError::BadRequest(
            "Transaction hash must be 0x-prefixed 32-byte hex".to_string(),
        ));
    }
    Ok(trimmed.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_hash_validation_normalizes_case() {
        let hash = format!("0x{}", "AB".repeat(32));
        let validated = validate_tx_hash(&hash).unwrap();
        assert_eq!(validated, hash.to_lowercase());
        assert!(validate_tx_hash("0x1234").is_err());
        assert!(validate_tx_hash("not-a-hash").is_err());
    }
}
