use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::str::FromStr;

use crate::db_helpers;
use crate::types::{ActionType, HoldType, TransferType};

/// Collections whose rows carry a `block_num` tag and may be rolled back on a
/// fork. Reviewed configuration: extending the reversible set means adding a
/// variant here and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReversibleCollection {
    Transfers,
    History,
    Claims,
}

impl ReversibleCollection {
    pub(crate) fn table(&self) -> &'static str {
        match self {
            Self::Transfers => "transfers",
            Self::History => "history",
            Self::Claims => "claims",
        }
    }
}

pub const REVERSIBLE_COLLECTIONS: &[ReversibleCollection] = &[
    ReversibleCollection::Transfers,
    ReversibleCollection::History,
    ReversibleCollection::Claims,
];

#[derive(Debug, Clone)]
pub struct TransferRow {
    pub sender: String,
    pub receiver: String,
    pub quantity: String,
    pub symbol: String,
    pub memo: Option<String>,
    pub block_num: u64,
    pub trx_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub sender: String,
    pub receiver: String,
    pub quantity: String,
    pub symbol: String,
    pub memo: Option<String>,
    pub action_type: ActionType,
    pub transfer_type: Option<TransferType>,
    pub hold_type: Option<HoldType>,
    pub exchange_amount: Option<String>,
    pub fee_amount: Option<String>,
    pub fee_percent: Option<String>,
    pub tracery: Option<String>,
    pub referral_initiator: Option<String>,
    pub referral_data: Option<serde_json::Value>,
    pub block_num: u64,
    pub trx_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ClaimRow {
    pub user_id: String,
    pub quantity: String,
    pub symbol: String,
    pub block_num: u64,
    pub trx_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DonationRow {
    pub community_id: String,
    pub user_id: String,
    pub permlink: String,
    pub sender: String,
    pub quantity: String,
    pub symbol: String,
    pub trx_id: String,
}

#[derive(Debug, Clone)]
pub struct NewPoint {
    pub symbol: String,
    pub decs: u32,
    pub issuer: String,
    pub maximum_supply: String,
    pub cw: u32,
    pub fee: u32,
}

/// Authoritative state carried by a chain `currency` event.
#[derive(Debug, Clone)]
pub struct CurrencyUpdate {
    pub symbol: String,
    pub supply: String,
    pub reserve: String,
    pub maximum_supply: String,
    pub cw: u32,
    pub fee: u32,
    pub issuer: Option<String>,
    pub transfer_fee: Option<u32>,
    pub min_transfer_fee_points: Option<u64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PointRecord {
    pub symbol: String,
    pub supply: Option<String>,
    pub reserve: Option<String>,
    pub cw: i64,
    pub fee: i64,
    pub logo: Option<String>,
    pub name: Option<String>,
}

impl PointRecord {
    /// Curve inputs, once the chain has reported supply and reserve for the
    /// point. Freshly created points have neither and cannot be priced yet.
    pub(crate) fn curve_state(&self) -> Option<crate::curve::PointState> {
        let supply = self.supply.as_deref()?;
        let reserve = self.reserve.as_deref()?;
        crate::curve::PointState::from_assets(
            supply,
            reserve,
            u32::try_from(self.cw).ok()?,
            u32::try_from(self.fee).ok()?,
        )
        .ok()
    }
}

#[derive(Debug, Clone)]
pub struct SubLogEntry {
    pub quantity: String,
    pub memo: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The engine's durable read position.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub block_num: u64,
    pub block_id: String,
    pub block_time: DateTime<Utc>,
    pub last_irreversible: u64,
    pub last_fork: u64,
}

/// Partial checkpoint write: only the observed fields advance. A fork rewinds
/// `block_num` alone, since the base block's id is not part of the
/// notification.
#[derive(Debug, Clone, Default)]
pub struct CheckpointPatch {
    pub block_num: Option<u64>,
    pub block_id: Option<String>,
    pub block_time: Option<DateTime<Utc>>,
    pub last_irreversible: Option<u64>,
    pub last_fork: Option<u64>,
}

/// The per-collection operations the projection needs from the document
/// store. The writer is the only mutator; read-API queries go through
/// `modules::wallet` directly and never through this trait.
#[async_trait]
pub trait ProjectedStore: Send + Sync {
    async fn upsert_balance(
        &self,
        user_id: &str,
        symbol: &str,
        balance: &str,
    ) -> crate::Result<()>;

    /// Creates a zero entry unless one already exists.
    async fn open_balance(&self, user_id: &str, symbol: &str) -> crate::Result<()>;

    /// Returns false when the (user, symbol) entry does not exist.
    async fn set_frozen(&self, user_id: &str, symbol: &str, frozen: &str) -> crate::Result<bool>;

    async fn get_frozen(&self, user_id: &str, symbol: &str) -> crate::Result<Option<String>>;

    async fn create_point(&self, point: &NewPoint) -> crate::Result<()>;

    async fn get_point(&self, symbol: &str) -> crate::Result<Option<PointRecord>>;

    /// Returns false when the point does not exist.
    async fn apply_currency_update(&self, update: &CurrencyUpdate) -> crate::Result<bool>;

    async fn push_issue_entry(&self, symbol: &str, entry: &SubLogEntry) -> crate::Result<()>;

    async fn push_restock_entry(
        &self,
        symbol: &str,
        entry: &SubLogEntry,
        new_reserve: &str,
    ) -> crate::Result<()>;

    async fn set_point_info(
        &self,
        symbol: &str,
        logo: Option<&str>,
        name: Option<&str>,
    ) -> crate::Result<bool>;

    async fn set_point_params(
        &self,
        symbol: &str,
        fee: Option<u32>,
        transfer_fee: Option<u32>,
        min_transfer_fee_points: Option<u64>,
    ) -> crate::Result<bool>;

    async fn create_transfer(&self, row: &TransferRow) -> crate::Result<()>;

    async fn create_history(&self, row: &HistoryRow) -> crate::Result<()>;

    async fn create_claim(&self, row: &ClaimRow) -> crate::Result<()>;

    async fn create_donation(&self, row: &DonationRow) -> crate::Result<()>;

    /// Hold type of the earliest hold row written for the tuple, if any.
    async fn find_hold_type(
        &self,
        symbol: &str,
        sender: &str,
        receiver: &str,
        tracery: &str,
    ) -> crate::Result<Option<HoldType>>;

    async fn upsert_username(&self, user_id: &str, username: &str) -> crate::Result<()>;

    async fn upsert_avatar(&self, user_id: &str, avatar_url: &str) -> crate::Result<()>;

    async fn mark_irreversible(
        &self,
        collection: ReversibleCollection,
        block_num: u64,
    ) -> crate::Result<u64>;

    async fn delete_past_fork(
        &self,
        collection: ReversibleCollection,
        base_block_num: u64,
    ) -> crate::Result<u64>;

    async fn load_checkpoint(&self) -> crate::Result<Option<Checkpoint>>;

    async fn save_checkpoint(&self, patch: &CheckpointPatch) -> crate::Result<()>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: sqlx::Pool<sqlx::Postgres>,
}

impl PgStore {
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FrozenView {
    frozen: String,
}

#[derive(sqlx::FromRow)]
struct HoldTypeView {
    hold_type: Option<String>,
}

#[derive(sqlx::FromRow)]
struct CheckpointView {
    block_num: i64,
    block_id: String,
    block_time: DateTime<Utc>,
    last_irreversible: i64,
    last_fork: i64,
}

#[async_trait]
impl ProjectedStore for PgStore {
    async fn upsert_balance(
        &self,
        user_id: &str,
        symbol: &str,
        balance: &str,
    ) -> crate::Result<()> {
        sqlx::query(
            r"INSERT INTO balances (user_id, symbol, balance, frozen)
              VALUES ($1, $2, $3, '0')
              ON CONFLICT (user_id, symbol) DO UPDATE SET balance = EXCLUDED.balance",
        )
        .bind(user_id)
        .bind(symbol)
        .bind(balance)
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(())
    }

    async fn open_balance(&self, user_id: &str, symbol: &str) -> crate::Result<()> {
        sqlx::query(
            r"INSERT INTO balances (user_id, symbol, balance, frozen)
              VALUES ($1, $2, '0', '0')
              ON CONFLICT (user_id, symbol) DO NOTHING",
        )
        .bind(user_id)
        .bind(symbol)
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(())
    }

    async fn set_frozen(&self, user_id: &str, symbol: &str, frozen: &str) -> crate::Result<bool> {
        let done = sqlx::query(
            r"UPDATE balances SET frozen = $3 WHERE user_id = $1 AND symbol = $2",
        )
        .bind(user_id)
        .bind(symbol)
        .bind(frozen)
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(done.rows_affected() > 0)
    }

    async fn get_frozen(&self, user_id: &str, symbol: &str) -> crate::Result<Option<String>> {
        let rows = db_helpers::select_retry_or_panic::<FrozenView>(
            &self.pool,
            r"SELECT frozen FROM balances WHERE user_id = $1 AND symbol = $2",
            &[user_id.to_string(), symbol.to_string()],
        )
        .await?;
        Ok(rows.into_iter().next().map(|row| row.frozen))
    }

    async fn create_point(&self, point: &NewPoint) -> crate::Result<()> {
        sqlx::query(
            r"INSERT INTO points (symbol, decs, issuer, maximum_supply, cw, fee)
              VALUES ($1, $2, $3, $4, $5, $6)
              ON CONFLICT (symbol) DO NOTHING",
        )
        .bind(&point.symbol)
        .bind(point.decs as i64)
        .bind(&point.issuer)
        .bind(&point.maximum_supply)
        .bind(point.cw as i64)
        .bind(point.fee as i64)
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(())
    }

    async fn get_point(&self, symbol: &str) -> crate::Result<Option<PointRecord>> {
        let rows = db_helpers::select_retry_or_panic::<PointRecord>(
            &self.pool,
            r"SELECT symbol, supply, reserve, cw, fee, logo, name
              FROM points WHERE symbol = $1",
            &[symbol.to_string()],
        )
        .await?;
        Ok(rows.into_iter().next())
    }

    async fn apply_currency_update(&self, update: &CurrencyUpdate) -> crate::Result<bool> {
        let done = sqlx::query(
            r"UPDATE points SET
                supply = $2,
                reserve = $3,
                maximum_supply = $4,
                cw = $5,
                fee = $6,
                issuer = COALESCE($7, issuer),
                transfer_fee = COALESCE($8, transfer_fee),
                min_transfer_fee_points = COALESCE($9, min_transfer_fee_points)
              WHERE symbol = $1",
        )
        .bind(&update.symbol)
        .bind(&update.supply)
        .bind(&update.reserve)
        .bind(&update.maximum_supply)
        .bind(update.cw as i64)
        .bind(update.fee as i64)
        .bind(update.issuer.as_deref())
        .bind(update.transfer_fee.map(|v| v as i64))
        .bind(update.min_transfer_fee_points.map(|v| v as i64))
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(done.rows_affected() > 0)
    }

    async fn push_issue_entry(&self, symbol: &str, entry: &SubLogEntry) -> crate::Result<()> {
        sqlx::query(
            r"INSERT INTO point_issue_history (symbol, quantity, memo, timestamp)
              VALUES ($1, $2, $3, $4)",
        )
        .bind(symbol)
        .bind(&entry.quantity)
        .bind(entry.memo.as_deref())
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(())
    }

    async fn push_restock_entry(
        &self,
        symbol: &str,
        entry: &SubLogEntry,
        new_reserve: &str,
    ) -> crate::Result<()> {
        sqlx::query(
            r"INSERT INTO point_restock_history (symbol, quantity, memo, timestamp)
              VALUES ($1, $2, $3, $4)",
        )
        .bind(symbol)
        .bind(&entry.quantity)
        .bind(entry.memo.as_deref())
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;

        sqlx::query(r"UPDATE points SET reserve = $2 WHERE symbol = $1")
            .bind(symbol)
            .bind(new_reserve)
            .execute(&self.pool)
            .await
            .map_err(db_helpers::db_error)?;
        Ok(())
    }

    async fn set_point_info(
        &self,
        symbol: &str,
        logo: Option<&str>,
        name: Option<&str>,
    ) -> crate::Result<bool> {
        let done = sqlx::query(
            r"UPDATE points SET logo = COALESCE($2, logo), name = COALESCE($3, name)
              WHERE symbol = $1",
        )
        .bind(symbol)
        .bind(logo)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(done.rows_affected() > 0)
    }

    async fn set_point_params(
        &self,
        symbol: &str,
        fee: Option<u32>,
        transfer_fee: Option<u32>,
        min_transfer_fee_points: Option<u64>,
    ) -> crate::Result<bool> {
        let done = sqlx::query(
            r"UPDATE points SET
                fee = COALESCE($2, fee),
                transfer_fee = COALESCE($3, transfer_fee),
                min_transfer_fee_points = COALESCE($4, min_transfer_fee_points)
              WHERE symbol = $1",
        )
        .bind(symbol)
        .bind(fee.map(|v| v as i64))
        .bind(transfer_fee.map(|v| v as i64))
        .bind(min_transfer_fee_points.map(|v| v as i64))
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(done.rows_affected() > 0)
    }

    async fn create_transfer(&self, row: &TransferRow) -> crate::Result<()> {
        sqlx::query(
            r"INSERT INTO transfers
                (sender, receiver, quantity, symbol, memo, block_num, trx_id, timestamp, is_irreversible)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE)",
        )
        .bind(&row.sender)
        .bind(&row.receiver)
        .bind(&row.quantity)
        .bind(&row.symbol)
        .bind(row.memo.as_deref())
        .bind(row.block_num as i64)
        .bind(&row.trx_id)
        .bind(row.timestamp)
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(())
    }

    async fn create_history(&self, row: &HistoryRow) -> crate::Result<()> {
        sqlx::query(
            r"INSERT INTO history
                (sender, receiver, quantity, symbol, memo, action_type, transfer_type, hold_type,
                 exchange_amount, fee_amount, fee_percent, tracery, referral_initiator, referral_data,
                 block_num, trx_id, timestamp, is_irreversible)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, FALSE)",
        )
        .bind(&row.sender)
        .bind(&row.receiver)
        .bind(&row.quantity)
        .bind(&row.symbol)
        .bind(row.memo.as_deref())
        .bind(row.action_type.to_string())
        .bind(row.transfer_type.map(|t| t.to_string()))
        .bind(row.hold_type.map(|t| t.to_string()))
        .bind(row.exchange_amount.as_deref())
        .bind(row.fee_amount.as_deref())
        .bind(row.fee_percent.as_deref())
        .bind(row.tracery.as_deref())
        .bind(row.referral_initiator.as_deref())
        .bind(row.referral_data.clone())
        .bind(row.block_num as i64)
        .bind(&row.trx_id)
        .bind(row.timestamp)
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(())
    }

    async fn create_claim(&self, row: &ClaimRow) -> crate::Result<()> {
        sqlx::query(
            r"INSERT INTO claims
                (user_id, quantity, symbol, block_num, trx_id, timestamp, is_irreversible)
              VALUES ($1, $2, $3, $4, $5, $6, FALSE)",
        )
        .bind(&row.user_id)
        .bind(&row.quantity)
        .bind(&row.symbol)
        .bind(row.block_num as i64)
        .bind(&row.trx_id)
        .bind(row.timestamp)
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(())
    }

    async fn create_donation(&self, row: &DonationRow) -> crate::Result<()> {
        sqlx::query(
            r"INSERT INTO donations
                (community_id, user_id, permlink, sender, quantity, symbol, trx_id)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&row.community_id)
        .bind(&row.user_id)
        .bind(&row.permlink)
        .bind(&row.sender)
        .bind(&row.quantity)
        .bind(&row.symbol)
        .bind(&row.trx_id)
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(())
    }

    async fn find_hold_type(
        &self,
        symbol: &str,
        sender: &str,
        receiver: &str,
        tracery: &str,
    ) -> crate::Result<Option<HoldType>> {
        let rows = db_helpers::select_retry_or_panic::<HoldTypeView>(
            &self.pool,
            r"SELECT hold_type FROM history
              WHERE action_type = 'hold'
                AND symbol = $1 AND sender = $2 AND receiver = $3 AND tracery = $4
              ORDER BY id LIMIT 1",
            &[
                symbol.to_string(),
                sender.to_string(),
                receiver.to_string(),
                tracery.to_string(),
            ],
        )
        .await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.hold_type)
            .and_then(|raw| HoldType::from_str(&raw).ok()))
    }

    async fn upsert_username(&self, user_id: &str, username: &str) -> crate::Result<()> {
        sqlx::query(
            r"INSERT INTO user_metas (user_id, username)
              VALUES ($1, $2)
              ON CONFLICT (user_id) DO UPDATE SET username = EXCLUDED.username",
        )
        .bind(user_id)
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(())
    }

    async fn upsert_avatar(&self, user_id: &str, avatar_url: &str) -> crate::Result<()> {
        sqlx::query(
            r"INSERT INTO user_metas (user_id, avatar_url)
              VALUES ($1, $2)
              ON CONFLICT (user_id) DO UPDATE SET avatar_url = EXCLUDED.avatar_url",
        )
        .bind(user_id)
        .bind(avatar_url)
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(())
    }

    async fn mark_irreversible(
        &self,
        collection: ReversibleCollection,
        block_num: u64,
    ) -> crate::Result<u64> {
        let query = format!(
            "UPDATE {} SET is_irreversible = TRUE WHERE block_num = $1",
            collection.table()
        );
        let done = sqlx::query(&query)
            .bind(block_num as i64)
            .execute(&self.pool)
            .await
            .map_err(db_helpers::db_error)?;
        Ok(done.rows_affected())
    }

    async fn delete_past_fork(
        &self,
        collection: ReversibleCollection,
        base_block_num: u64,
    ) -> crate::Result<u64> {
        let query = format!(
            "DELETE FROM {} WHERE block_num > $1",
            collection.table()
        );
        let done = sqlx::query(&query)
            .bind(base_block_num as i64)
            .execute(&self.pool)
            .await
            .map_err(db_helpers::db_error)?;
        Ok(done.rows_affected())
    }

    async fn load_checkpoint(&self) -> crate::Result<Option<Checkpoint>> {
        let rows = db_helpers::select_retry_or_panic::<CheckpointView>(
            &self.pool,
            r"SELECT block_num, block_id, block_time, last_irreversible, last_fork
              FROM block_subscribe_status WHERE id = TRUE",
            &[],
        )
        .await?;
        Ok(rows.into_iter().next().map(|row| Checkpoint {
            block_num: row.block_num as u64,
            block_id: row.block_id,
            block_time: row.block_time,
            last_irreversible: row.last_irreversible as u64,
            last_fork: row.last_fork as u64,
        }))
    }

    async fn save_checkpoint(&self, patch: &CheckpointPatch) -> crate::Result<()> {
        sqlx::query(
            r"INSERT INTO block_subscribe_status AS bss
                (id, block_num, block_id, block_time, last_irreversible, last_fork)
              VALUES (TRUE, COALESCE($1, 0), COALESCE($2, ''), COALESCE($3, now()),
                      COALESCE($4, 0), COALESCE($5, 0))
              ON CONFLICT (id) DO UPDATE SET
                block_num = COALESCE($1, bss.block_num),
                block_id = COALESCE($2, bss.block_id),
                block_time = COALESCE($3, bss.block_time),
                last_irreversible = COALESCE($4, bss.last_irreversible),
                last_fork = COALESCE($5, bss.last_fork)",
        )
        .bind(patch.block_num.map(|v| v as i64))
        .bind(patch.block_id.as_deref())
        .bind(patch.block_time)
        .bind(patch.last_irreversible.map(|v| v as i64))
        .bind(patch.last_fork.map(|v| v as i64))
        .execute(&self.pool)
        .await
        .map_err(db_helpers::db_error)?;
        Ok(())
    }
}
