use chrono::{DateTime, Utc};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct HistoryInfo {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub quantity: String,
    pub symbol: String,
    pub memo: Option<String>,
    pub action_type: Option<String>,
    pub transfer_type: Option<String>,
    pub hold_type: Option<String>,
    pub exchange_amount: Option<String>,
    pub block_num: i64,
    pub trx_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_irreversible: bool,
    pub sender_username: Option<String>,
    pub sender_avatar_url: Option<String>,
    pub receiver_username: Option<String>,
    pub receiver_avatar_url: Option<String>,
    pub point_symbol: Option<String>,
    pub point_name: Option<String>,
    pub point_logo: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ClaimInfo {
    pub id: i64,
    pub user_id: String,
    pub quantity: String,
    pub symbol: String,
    pub block_num: i64,
    pub trx_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_irreversible: bool,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BalanceInfo {
    pub symbol: String,
    pub balance: String,
    pub frozen: String,
    pub logo: Option<String>,
    pub name: Option<String>,
    pub supply: Option<String>,
    pub reserve: Option<String>,
    pub cw: Option<i64>,
    pub fee: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PointInfo {
    pub symbol: String,
    pub issuer: String,
    pub maximum_supply: String,
    pub supply: Option<String>,
    pub reserve: Option<String>,
    pub cw: i64,
    pub fee: i64,
    pub transfer_fee: Option<i64>,
    pub min_transfer_fee_points: Option<i64>,
    pub logo: Option<String>,
    pub name: Option<String>,
}
