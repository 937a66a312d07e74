//! User model
//!
//! Users are keyed by wallet address (stored lowercase, unique) and come
//! into existence the first time an address asks for a SIWE nonce. The
//! `nonce` column holds the current single-use sign-in challenge; it is
//! cleared by a conditional update so a replayed nonce can never verify
//! twice.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::users;

#[derive(Debug, Clone, Serialize, Queryable, Identifiable)]
#[diesel(table_name = users)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub wallet_address: String,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Pending SIWE challenge; never serialized into API responses.
    #[serde(skip_serializing)]
    pub nonce: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub wallet_address: &'a str,
}

impl User {
    pub fn find_by_id(conn: &mut SqliteConnection, user_id: i32) -> Result<Option<User>> {
        users::table
            .find(user_id)
            .first(conn)
            .optional()
            .context("Failed to load user by id")
    }

    /// Look up a user by wallet address. `wallet` must already be lowercase.
    pub fn find_by_wallet(conn: &mut SqliteConnection, wallet: &str) -> Result<Option<User>> {
        users::table
            .filter(users::wallet_address.eq(wallet))
            .first(conn)
            .optional()
            .context("Failed to load user by wallet address")
    }

    /// Fetch the user for a wallet address, creating the row on first sight.
    pub fn get_or_create_by_wallet(conn: &mut SqliteConnection, wallet: &str) -> Result<User> {
        if let Some(user) = Self::find_by_wallet(conn, wallet)? {
            return Ok(user);
        }

        diesel::insert_into(users::table)
            .values(&NewUser {
                wallet_address: wallet,
            })
            .get_result(conn)
            .context("Failed to create user")
    }

    /// Store a fresh sign-in nonce on the user row, replacing any previous one.
    pub fn issue_nonce(conn: &mut SqliteConnection, user_id: i32, nonce: &str) -> Result<()> {
        diesel::update(users::table.find(user_id))
            .set(users::nonce.eq(nonce))
            .execute(conn)
            .context("Failed to store sign-in nonce")?;
        Ok(())
    }

    /// Consume the nonce if it matches the stored one.
    ///
    /// Conditional update: the nonce is cleared and `true` returned only
    /// when the stored value equals `nonce`. A second call with the same
    /// value returns `false`, which is what defeats replay.
    pub fn consume_nonce(conn: &mut SqliteConnection, user_id: i32, nonce: &str) -> Result<bool> {
        let updated = diesel::update(
            users::table
                .find(user_id)
                .filter(users::nonce.eq(nonce)),
        )
        .set(users::nonce.eq(None::<String>))
        .execute(conn)
        .context("Failed to consume sign-in nonce")?;

        Ok(updated == 1)
    }

    pub fn update_name(conn: &mut SqliteConnection, user_id: i32, name: &str) -> Result<User> {
        diesel::update(users::table.find(user_id))
            .set(users::name.eq(name))
            .get_result(conn)
            .context("Failed to update user name")
    }
}
