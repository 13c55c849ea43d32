//! In-memory implementation of the projected store for reducer and handler
//! tests. Mirrors the Postgres semantics collection by collection.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::store::{
    Checkpoint, CheckpointPatch, ClaimRow, CurrencyUpdate, DonationRow, HistoryRow, NewPoint,
    PointRecord, ProjectedStore, ReversibleCollection, SubLogEntry, TransferRow,
};
use crate::types::{ActionType, HoldType};

#[derive(Debug, Clone)]
pub(crate) struct MemBalance {
    pub user_id: String,
    pub symbol: String,
    pub balance: String,
    pub frozen: String,
}

#[derive(Debug, Clone)]
pub(crate) struct MemPoint {
    pub symbol: String,
    pub decs: u32,
    pub issuer: String,
    pub maximum_supply: String,
    pub cw: i64,
    pub fee: i64,
    pub supply: Option<String>,
    pub reserve: Option<String>,
    pub logo: Option<String>,
    pub name: Option<String>,
    pub transfer_fee: Option<i64>,
    pub min_transfer_fee_points: Option<i64>,
}

#[derive(Debug, Clone)]
pub(crate) struct MemUserMeta {
    pub user_id: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Default)]
pub(crate) struct MemState {
    pub balances: Vec<MemBalance>,
    pub points: Vec<MemPoint>,
    pub issue_log: Vec<(String, SubLogEntry)>,
    pub restock_log: Vec<(String, SubLogEntry)>,
    pub transfers: Vec<(TransferRow, bool)>,
    pub history: Vec<(HistoryRow, bool)>,
    pub claims: Vec<(ClaimRow, bool)>,
    pub donations: Vec<DonationRow>,
    pub user_metas: Vec<MemUserMeta>,
    pub checkpoint: Option<Checkpoint>,
}

impl MemState {
    pub(crate) fn set_balance(&mut self, user_id: &str, symbol: &str, balance: &str) {
        if let Some(entry) = self
            .balances
            .iter_mut()
            .find(|b| b.user_id == user_id && b.symbol == symbol)
        {
            entry.balance = balance.to_string();
        } else {
            self.balances.push(MemBalance {
                user_id: user_id.to_string(),
                symbol: symbol.to_string(),
                balance: balance.to_string(),
                frozen: "0".to_string(),
            });
        }
    }

    pub(crate) fn insert_point(
        &mut self,
        symbol: &str,
        supply: &str,
        reserve: &str,
        cw: i64,
        fee: i64,
    ) {
        self.points.push(MemPoint {
            symbol: symbol.to_string(),
            decs: 3,
            issuer: "community".to_string(),
            maximum_supply: format!("1000000000.000 {}", symbol),
            cw,
            fee,
            supply: Some(supply.to_string()),
            reserve: Some(reserve.to_string()),
            logo: None,
            name: None,
            transfer_fee: None,
            min_transfer_fee_points: None,
        });
    }
}

#[derive(Default)]
pub(crate) struct MemStore {
    pub state: Mutex<MemState>,
}

#[async_trait]
impl ProjectedStore for MemStore {
    async fn upsert_balance(
        &self,
        user_id: &str,
        symbol: &str,
        balance: &str,
    ) -> crate::Result<()> {
        self.state.lock().unwrap().set_balance(user_id, symbol, balance);
        Ok(())
    }

    async fn open_balance(&self, user_id: &str, symbol: &str) -> crate::Result<()> {
        let mut state = self.state.lock().unwrap();
        let exists = state
            .balances
            .iter()
            .any(|b| b.user_id == user_id && b.symbol == symbol);
        if !exists {
            state.balances.push(MemBalance {
                user_id: user_id.to_string(),
                symbol: symbol.to_string(),
                balance: "0".to_string(),
                frozen: "0".to_string(),
            });
        }
        Ok(())
    }

    async fn set_frozen(&self, user_id: &str, symbol: &str, frozen: &str) -> crate::Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state
            .balances
            .iter_mut()
            .find(|b| b.user_id == user_id && b.symbol == symbol)
        {
            Some(entry) => {
                entry.frozen = frozen.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_frozen(&self, user_id: &str, symbol: &str) -> crate::Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .balances
            .iter()
            .find(|b| b.user_id == user_id && b.symbol == symbol)
            .map(|b| b.frozen.clone()))
    }

    async fn create_point(&self, point: &NewPoint) -> crate::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.points.iter().any(|p| p.symbol == point.symbol) {
            return Ok(());
        }
        state.points.push(MemPoint {
            symbol: point.symbol.clone(),
            decs: point.decs,
            issuer: point.issuer.clone(),
            maximum_supply: point.maximum_supply.clone(),
            cw: point.cw as i64,
            fee: point.fee as i64,
            supply: None,
            reserve: None,
            logo: None,
            name: None,
            transfer_fee: None,
            min_transfer_fee_points: None,
        });
        Ok(())
    }

    async fn get_point(&self, symbol: &str) -> crate::Result<Option<PointRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.points.iter().find(|p| p.symbol == symbol).map(|p| {
            PointRecord {
                symbol: p.symbol.clone(),
                supply: p.supply.clone(),
                reserve: p.reserve.clone(),
                cw: p.cw,
                fee: p.fee,
                logo: p.logo.clone(),
                name: p.name.clone(),
            }
        }))
    }

    async fn apply_currency_update(&self, update: &CurrencyUpdate) -> crate::Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.points.iter_mut().find(|p| p.symbol == update.symbol) {
            Some(point) => {
                point.supply = Some(update.supply.clone());
                point.reserve = Some(update.reserve.clone());
                point.maximum_supply = update.maximum_supply.clone();
                point.cw = update.cw as i64;
                point.fee = update.fee as i64;
                if let Some(issuer) = &update.issuer {
                    point.issuer = issuer.clone();
                }
                if let Some(transfer_fee) = update.transfer_fee {
                    point.transfer_fee = Some(transfer_fee as i64);
                }
                if let Some(min) = update.min_transfer_fee_points {
                    point.min_transfer_fee_points = Some(min as i64);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn push_issue_entry(&self, symbol: &str, entry: &SubLogEntry) -> crate::Result<()> {
        self.state
            .lock()
            .unwrap()
            .issue_log
            .push((symbol.to_string(), entry.clone()));
        Ok(())
    }

    async fn push_restock_entry(
        &self,
        symbol: &str,
        entry: &SubLogEntry,
        new_reserve: &str,
    ) -> crate::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.restock_log.push((symbol.to_string(), entry.clone()));
        if let Some(point) = state.points.iter_mut().find(|p| p.symbol == symbol) {
            point.reserve = Some(new_reserve.to_string());
        }
        Ok(())
    }

    async fn set_point_info(
        &self,
        symbol: &str,
        logo: Option<&str>,
        name: Option<&str>,
    ) -> crate::Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.points.iter_mut().find(|p| p.symbol == symbol) {
            Some(point) => {
                if let Some(logo) = logo {
                    point.logo = Some(logo.to_string());
                }
                if let Some(name) = name {
                    point.name = Some(name.to_string());
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_point_params(
        &self,
        symbol: &str,
        fee: Option<u32>,
        transfer_fee: Option<u32>,
        min_transfer_fee_points: Option<u64>,
    ) -> crate::Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.points.iter_mut().find(|p| p.symbol == symbol) {
            Some(point) => {
                if let Some(fee) = fee {
                    point.fee = fee as i64;
                }
                if let Some(transfer_fee) = transfer_fee {
                    point.transfer_fee = Some(transfer_fee as i64);
                }
                if let Some(min) = min_transfer_fee_points {
                    point.min_transfer_fee_points = Some(min as i64);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_transfer(&self, row: &TransferRow) -> crate::Result<()> {
        self.state.lock().unwrap().transfers.push((row.clone(), false));
        Ok(())
    }

    async fn create_history(&self, row: &HistoryRow) -> crate::Result<()> {
        self.state.lock().unwrap().history.push((row.clone(), false));
        Ok(())
    }

    async fn create_claim(&self, row: &ClaimRow) -> crate::Result<()> {
        self.state.lock().unwrap().claims.push((row.clone(), false));
        Ok(())
    }

    async fn create_donation(&self, row: &DonationRow) -> crate::Result<()> {
        self.state.lock().unwrap().donations.push(row.clone());
        Ok(())
    }

    async fn find_hold_type(
        &self,
        symbol: &str,
        sender: &str,
        receiver: &str,
        tracery: &str,
    ) -> crate::Result<Option<HoldType>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .history
            .iter()
            .find(|(row, _)| {
                row.action_type == ActionType::Hold
                    && row.symbol == symbol
                    && row.sender == sender
                    && row.receiver == receiver
                    && row.tracery.as_deref() == Some(tracery)
            })
            .and_then(|(row, _)| row.hold_type))
    }

    async fn upsert_username(&self, user_id: &str, username: &str) -> crate::Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.user_metas.iter_mut().find(|m| m.user_id == user_id) {
            Some(meta) => meta.username = Some(username.to_string()),
            None => state.user_metas.push(MemUserMeta {
                user_id: user_id.to_string(),
                username: Some(username.to_string()),
                avatar_url: None,
            }),
        }
        Ok(())
    }

    async fn upsert_avatar(&self, user_id: &str, avatar_url: &str) -> crate::Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.user_metas.iter_mut().find(|m| m.user_id == user_id) {
            Some(meta) => meta.avatar_url = Some(avatar_url.to_string()),
            None => state.user_metas.push(MemUserMeta {
                user_id: user_id.to_string(),
                username: None,
                avatar_url: Some(avatar_url.to_string()),
            }),
        }
        Ok(())
    }

    async fn mark_irreversible(
        &self,
        collection: ReversibleCollection,
        block_num: u64,
    ) -> crate::Result<u64> {
        let mut state = self.state.lock().unwrap();
        let mut marked = 0;
        match collection {
            ReversibleCollection::Transfers => {
                for (row, flag) in state.transfers.iter_mut() {
                    if row.block_num == block_num {
                        *flag = true;
                        marked += 1;
                    }
                }
            }
            ReversibleCollection::History => {
                for (row, flag) in state.history.iter_mut() {
                    if row.block_num == block_num {
                        *flag = true;
                        marked += 1;
                    }
                }
            }
            ReversibleCollection::Claims => {
                for (row, flag) in state.claims.iter_mut() {
                    if row.block_num == block_num {
                        *flag = true;
                        marked += 1;
                    }
                }
            }
        }
        Ok(marked)
    }

    async fn delete_past_fork(
        &self,
        collection: ReversibleCollection,
        base_block_num: u64,
    ) -> crate::Result<u64> {
        let mut state = self.state.lock().unwrap();
        let deleted;
        match collection {
            ReversibleCollection::Transfers => {
                let before = state.transfers.len();
                state.transfers.retain(|(row, _)| row.block_num <= base_block_num);
                deleted = before - state.transfers.len();
            }
            ReversibleCollection::History => {
                let before = state.history.len();
                state.history.retain(|(row, _)| row.block_num <= base_block_num);
                deleted = before - state.history.len();
            }
            ReversibleCollection::Claims => {
                let before = state.claims.len();
                state.claims.retain(|(row, _)| row.block_num <= base_block_num);
                deleted = before - state.claims.len();
            }
        }
        Ok(deleted as u64)
    }

    async fn load_checkpoint(&self) -> crate::Result<Option<Checkpoint>> {
        Ok(self.state.lock().unwrap().checkpoint.clone())
    }

    async fn save_checkpoint(&self, patch: &CheckpointPatch) -> crate::Result<()> {
        let mut state = self.state.lock().unwrap();
        let mut checkpoint = state.checkpoint.clone().unwrap_or(Checkpoint {
            block_num: 0,
            block_id: String::new(),
            block_time: default_time(),
            last_irreversible: 0,
            last_fork: 0,
        });
        if let Some(block_num) = patch.block_num {
            checkpoint.block_num = block_num;
        }
        if let Some(block_id) = &patch.block_id {
            checkpoint.block_id = block_id.clone();
        }
        if let Some(block_time) = patch.block_time {
            checkpoint.block_time = block_time;
        }
        if let Some(last_irreversible) = patch.last_irreversible {
            checkpoint.last_irreversible = last_irreversible;
        }
        if let Some(last_fork) = patch.last_fork {
            checkpoint.last_fork = last_fork;
        }
        state.checkpoint = Some(checkpoint);
        Ok(())
    }
}

fn default_time() -> DateTime<Utc> {
    DateTime::<Utc>::from(std::time::UNIX_EPOCH)
}
