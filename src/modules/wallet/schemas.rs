use chrono::{DateTime, Utc};
use paperclip::actix::Apiv2Schema;
use validator::Validate;

use crate::types;
use crate::types::query_params::{Direction, HoldTypeFacet, Toggle, TransferTypeFacet};

// *** Requests ***

#[derive(
    Validate, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema,
)]
pub struct UserRequest {
    #[validate(custom = "crate::errors::validate_user_id")]
    pub user_id: String,
}

#[derive(
    Validate, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema,
)]
pub struct PointRequest {
    #[validate(custom = "crate::errors::validate_symbol")]
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct HistoryParams {
    pub direction: Option<Direction>,
    /// `all`, the reserve currency alias, or a point symbol
    pub symbol: Option<String>,
    pub transfer_type: Option<TransferTypeFacet>,
    pub rewards: Option<Toggle>,
    pub donations: Option<Toggle>,
    pub claim: Option<Toggle>,
    pub hold_type: Option<HoldTypeFacet>,
    pub offset: Option<u64>,
    /// Maximum available limit 100
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct ClaimHistoryParams {
    /// Comma-separated symbols, or `all`
    pub symbols: Option<String>,
    pub offset: Option<u64>,
    /// Maximum available limit 100
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct SellPriceParams {
    /// Asset string, e.g. `2.000 CATS`
    pub quantity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct BuyPriceParams {
    pub point_symbol: String,
    /// Asset string of reserve currency, e.g. `2.000 CMN`
    pub quantity: String,
}

// *** Responses ***

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct BalancesResponse {
    pub user_id: String,
    pub balances: Vec<BalanceItem>,
}

/// One per-symbol position of the user. `price` is what the whole position is
/// worth in reserve currency; the reserve currency itself has no backing
/// point, so its entry carries no price.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct BalanceItem {
    pub symbol: String,
    pub balance: String,
    pub frozen: String,
    pub logo: Option<String>,
    pub name: Option<String>,
    pub price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct HistoryResponse {
    pub items: Vec<HistoryItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct HistoryItem {
    pub id: types::U64,
    pub sender: Participant,
    pub receiver: Participant,
    pub quantity: String,
    pub symbol: String,
    /// Resolved point metadata, when the row touches a point
    pub point: Option<PointSummary>,
    pub trx_id: Option<String>,
    pub memo: Option<String>,
    pub block_num: types::U64,
    pub timestamp: DateTime<Utc>,
    pub is_irreversible: bool,
    pub meta: HistoryItemMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct HistoryItemMeta {
    pub action_type: Option<String>,
    pub transfer_type: Option<String>,
    pub hold_type: Option<String>,
    pub exchange_amount: Option<String>,
    /// `send` or `receive`, relative to the requested user
    pub direction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct Participant {
    pub user_id: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct PointSummary {
    pub symbol: String,
    pub name: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct ClaimsResponse {
    pub items: Vec<ClaimItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct ClaimItem {
    pub id: types::U64,
    pub user_id: String,
    pub quantity: String,
    pub symbol: String,
    pub block_num: types::U64,
    pub trx_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_irreversible: bool,
}

/// Price quote, as an asset string of the receiving side of the conversion.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct PriceResponse {
    pub price: String,
}

/// Point metadata without the issue/restock sub-logs.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct PointInfoResponse {
    pub symbol: String,
    pub issuer: String,
    pub maximum_supply: String,
    pub supply: Option<String>,
    pub reserve: Option<String>,
    pub cw: types::U64,
    pub fee: types::U64,
    pub transfer_fee: Option<types::U64>,
    pub min_transfer_fee_points: Option<types::U64>,
    pub logo: Option<String>,
    pub name: Option<String>,
}
