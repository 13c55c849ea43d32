pub mod chain;
pub(crate) mod classifier;
pub(crate) mod handlers;
pub mod store;
pub mod subscriber;
#[cfg(test)]
pub(crate) mod testing;

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use chain::{Action, Block, Event, TrxContext};
use store::{ProjectedStore, REVERSIBLE_COLLECTIONS};

/// Transaction ids are deduplicated inside this window; the stream replays a
/// suffix of blocks after a restart from the checkpoint.
const RECENT_TRX_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy)]
enum ActionRoute {
    TokenTransfer,
    BulkTransfer,
    Claim,
    BuyPointOrRestock,
    PointCreate,
    PointIssue,
    OpenBalance,
    PointTransfer,
    SetParams,
    CommunityCreate,
    SetInfo,
    NewUsername,
    UpdateMeta,
}

#[derive(Debug, Clone, Copy)]
enum EventRoute {
    Balance,
    Currency,
    Inclstate,
    GemState,
    GemChop,
}

// The dispatch tables. An action or event outside these keys is a defined
// no-op: the chain emits far more than the wallet projects.
const ACTION_ROUTES: &[((&str, &str, &str), ActionRoute)] = &[
    (
        (crate::TOKEN_CONTRACT, crate::TOKEN_CONTRACT, "transfer"),
        ActionRoute::TokenTransfer,
    ),
    (
        (crate::TOKEN_CONTRACT, crate::TOKEN_CONTRACT, "payment"),
        ActionRoute::TokenTransfer,
    ),
    (
        (crate::TOKEN_CONTRACT, crate::TOKEN_CONTRACT, "bulktransfer"),
        ActionRoute::BulkTransfer,
    ),
    (
        (crate::TOKEN_CONTRACT, crate::TOKEN_CONTRACT, "bulkpayment"),
        ActionRoute::BulkTransfer,
    ),
    (
        (crate::TOKEN_CONTRACT, crate::TOKEN_CONTRACT, "claim"),
        ActionRoute::Claim,
    ),
    (
        (crate::TOKEN_CONTRACT, crate::POINT_CONTRACT, "transfer"),
        ActionRoute::BuyPointOrRestock,
    ),
    (
        (crate::POINT_CONTRACT, crate::POINT_CONTRACT, "create"),
        ActionRoute::PointCreate,
    ),
    (
        (crate::POINT_CONTRACT, crate::POINT_CONTRACT, "issue"),
        ActionRoute::PointIssue,
    ),
    (
        (crate::POINT_CONTRACT, crate::POINT_CONTRACT, "open"),
        ActionRoute::OpenBalance,
    ),
    (
        (crate::POINT_CONTRACT, crate::POINT_CONTRACT, "transfer"),
        ActionRoute::PointTransfer,
    ),
    (
        (crate::POINT_CONTRACT, crate::POINT_CONTRACT, "setparams"),
        ActionRoute::SetParams,
    ),
    (
        (crate::LIST_CONTRACT, crate::LIST_CONTRACT, "create"),
        ActionRoute::CommunityCreate,
    ),
    (
        (crate::LIST_CONTRACT, crate::LIST_CONTRACT, "setinfo"),
        ActionRoute::SetInfo,
    ),
    (
        (crate::DOMAIN_CONTRACT, crate::DOMAIN_CONTRACT, "newusername"),
        ActionRoute::NewUsername,
    ),
    (
        (crate::SOCIAL_CONTRACT, crate::SOCIAL_CONTRACT, "updatemeta"),
        ActionRoute::UpdateMeta,
    ),
];

const EVENT_ROUTES: &[((&str, &str), EventRoute)] = &[
    ((crate::TOKEN_CONTRACT, "balance"), EventRoute::Balance),
    ((crate::POINT_CONTRACT, "balance"), EventRoute::Balance),
    ((crate::POINT_CONTRACT, "currency"), EventRoute::Currency),
    ((crate::POINT_CONTRACT, "inclstate"), EventRoute::Inclstate),
    ((crate::GALLERY_CONTRACT, "gemstate"), EventRoute::GemState),
    ((crate::GALLERY_CONTRACT, "gemchop"), EventRoute::GemChop),
];

fn route_action(action: &Action) -> Option<ActionRoute> {
    let key = (
        action.code.as_str(),
        action.receiver.as_str(),
        action.action.as_str(),
    );
    ACTION_ROUTES
        .iter()
        .find(|(route_key, _)| *route_key == key)
        .map(|(_, route)| *route)
}

fn route_event(event: &Event) -> Option<EventRoute> {
    let key = (event.code.as_str(), event.event.as_str());
    EVENT_ROUTES
        .iter()
        .find(|(route_key, _)| *route_key == key)
        .map(|(_, route)| *route)
}

/// Insert-with-expiry set over transaction ids, driven by a monotonic clock.
/// Owned by the reducer; nothing else mutates it.
pub(crate) struct RecentTransactions {
    ttl: Duration,
    seen: HashMap<String, Instant>,
    order: VecDeque<(Instant, String)>,
}

impl RecentTransactions {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            seen: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Returns true when the id has not been seen inside the TTL window.
    fn observe(&mut self, id: &str) -> bool {
        self.observe_at(id, Instant::now())
    }

    fn observe_at(&mut self, id: &str, now: Instant) -> bool {
        while let Some((inserted, front_id)) = self.order.front() {
            if now.duration_since(*inserted) < self.ttl {
                break;
            }
            if let Some(last) = self.seen.get(front_id) {
                if *last == *inserted {
                    self.seen.remove(front_id);
                }
            }
            self.order.pop_front();
        }

        if self.seen.contains_key(id) {
            return false;
        }
        self.seen.insert(id.to_string(), now);
        self.order.push_back((now, id.to_string()));
        true
    }
}

/// The dispersal reducer: drives one block at a time through the dispatch
/// tables, strictly in order. Holds sole mutation rights over the projected
/// store.
pub struct Projector<S> {
    store: S,
    recent: RecentTransactions,
}

impl<S: ProjectedStore> Projector<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            recent: RecentTransactions::new(RECENT_TRX_TTL),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn disperse(&mut self, block: &Block) -> crate::Result<()> {
        for transaction in &block.transactions {
            if !self.recent.observe(&transaction.id) {
                tracing::debug!(
                    target: crate::LOGGER_MSG,
                    "Skipping already seen transaction {}",
                    transaction.id
                );
                continue;
            }

            let ctx = TrxContext {
                trx_id: transaction.id.clone(),
                block_num: block.block_num,
                timestamp: block.block_time,
            };

            for action in &transaction.actions {
                // Events describe the result of the action about to be
                // interpreted, so they are drained first.
                for event in &action.events {
                    self.dispatch_event(event, &ctx).await?;
                }
                self.dispatch_action(action, &ctx).await?;
            }
        }
        Ok(())
    }

    async fn dispatch_event(&self, event: &Event, ctx: &TrxContext) -> crate::Result<()> {
        let route = match route_event(event) {
            Some(route) => route,
            None => return Ok(()),
        };

        match route {
            EventRoute::Balance => handlers::balance::handle_balance_event(&self.store, event).await,
            EventRoute::Currency => handlers::point::handle_currency_event(&self.store, event).await,
            EventRoute::Inclstate => {
                handlers::balance::handle_inclstate_event(&self.store, event).await
            }
            EventRoute::GemState => {
                handlers::gem::handle_gem_state_event(&self.store, event, ctx).await
            }
            EventRoute::GemChop => {
                handlers::gem::handle_gem_chop_event(&self.store, event, ctx).await?;
                handlers::balance::handle_gem_chop_event(&self.store, event).await
            }
        }
    }

    async fn dispatch_action(&self, action: &Action, ctx: &TrxContext) -> crate::Result<()> {
        let route = match route_action(action) {
            Some(route) => route,
            None => return Ok(()),
        };

        match route {
            ActionRoute::TokenTransfer => {
                handlers::transfer::handle_token_transfer(&self.store, action, ctx).await
            }
            ActionRoute::BulkTransfer => {
                handlers::transfer::handle_bulk_transfer(&self.store, action, ctx).await
            }
            ActionRoute::Claim => handlers::transfer::handle_claim(&self.store, action, ctx).await,
            ActionRoute::BuyPointOrRestock => {
                handlers::transfer::handle_buy_point(&self.store, action, ctx).await?;
                handlers::point::handle_restock(&self.store, action, ctx).await
            }
            ActionRoute::PointCreate => {
                handlers::point::handle_point_create(&self.store, action).await
            }
            ActionRoute::PointIssue => {
                handlers::point::handle_issue_point(&self.store, action, ctx).await
            }
            ActionRoute::OpenBalance => {
                handlers::balance::handle_open_balance(&self.store, action).await
            }
            ActionRoute::PointTransfer => {
                handlers::transfer::handle_point_transfer(&self.store, action, ctx).await
            }
            ActionRoute::SetParams => handlers::point::handle_set_params(&self.store, action).await,
            ActionRoute::CommunityCreate => {
                handlers::point::handle_community_create(&self.store, action).await
            }
            ActionRoute::SetInfo => handlers::point::handle_set_info(&self.store, action).await,
            ActionRoute::NewUsername => {
                handlers::user_meta::handle_new_username(&self.store, action).await
            }
            ActionRoute::UpdateMeta => {
                handlers::user_meta::handle_update_meta(&self.store, action).await
            }
        }
    }

    /// The source chain advances the LIB one block at a time. A failing
    /// collection is logged and the rest still advance; irreversibility is
    /// monotonic, the next pass cannot regress it.
    pub async fn register_lib(&self, block_num: u64) {
        for collection in REVERSIBLE_COLLECTIONS {
            if let Err(error) = self.store.mark_irreversible(*collection, block_num).await {
                tracing::error!(
                    target: crate::LOGGER_MSG,
                    "Error during setting block {} in {} as irreversible: {}",
                    block_num,
                    collection.table(),
                    error
                );
            }
        }
    }

    /// Rolls every reversible collection back to the fork base. Must fully
    /// complete before any further block is dispersed; the caller treats an
    /// error as fatal.
    pub async fn handle_fork(&self, base_block_num: u64) -> crate::Result<()> {
        for collection in REVERSIBLE_COLLECTIONS {
            let deleted = self
                .store
                .delete_past_fork(*collection, base_block_num)
                .await?;
            tracing::info!(
                target: crate::LOGGER_MSG,
                "Fork rollback: deleted {} rows from {} above block {}",
                deleted,
                collection.table(),
                base_block_num
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemStore;
    use super::*;

    fn block(block_num: u64, transactions: serde_json::Value) -> Block {
        serde_json::from_value(serde_json::json!({
            "blockNum": block_num,
            "id": format!("block-{}", block_num),
            "blockTime": "2019-10-21T12:00:00Z",
            "transactions": transactions,
        }))
        .unwrap()
    }

    fn token_transfer(trx_id: &str, from: &str, to: &str, quantity: &str, memo: &str) -> serde_json::Value {
        serde_json::json!([{
            "id": trx_id,
            "actions": [{
                "code": "cyber.token",
                "receiver": "cyber.token",
                "action": "transfer",
                "args": {"from": from, "to": to, "quantity": quantity, "memo": memo},
                "events": []
            }]
        }])
    }

    #[tokio::test]
    async fn test_plain_transfer_writes_both_projections() {
        let mut projector = Projector::new(MemStore::default());

        projector
            .disperse(&block(101, token_transfer("trx1", "alice", "bob", "2.000 CMN", "hi")))
            .await
            .unwrap();

        let state = projector.store().state.lock().unwrap();
        assert_eq!(state.transfers.len(), 1);
        assert_eq!(state.history.len(), 1);

        let (transfer, irreversible) = &state.transfers[0];
        assert_eq!(transfer.block_num, 101);
        assert_eq!(transfer.quantity, "2.000");
        assert!(!irreversible);

        let (history, _) = &state.history[0];
        assert_eq!(history.action_type.to_string(), "transfer");
    }

    #[tokio::test]
    async fn test_unknown_action_is_a_no_op() {
        let mut projector = Projector::new(MemStore::default());

        projector
            .disperse(&block(
                101,
                serde_json::json!([{
                    "id": "trx1",
                    "actions": [{
                        "code": "c.gallery",
                        "receiver": "c.gallery",
                        "action": "upvote",
                        "args": {},
                        "events": []
                    }]
                }]),
            ))
            .await
            .unwrap();

        let state = projector.store().state.lock().unwrap();
        assert!(state.transfers.is_empty());
        assert!(state.history.is_empty());
    }

    #[tokio::test]
    async fn test_register_lib_marks_only_that_block() {
        let mut projector = Projector::new(MemStore::default());
        projector
            .disperse(&block(101, token_transfer("trx1", "alice", "bob", "1.000 CMN", "")))
            .await
            .unwrap();
        projector
            .disperse(&block(102, token_transfer("trx2", "alice", "bob", "1.000 CMN", "")))
            .await
            .unwrap();

        projector.register_lib(101).await;

        let state = projector.store().state.lock().unwrap();
        let irreversible: Vec<bool> = state.transfers.iter().map(|(_, flag)| *flag).collect();
        assert_eq!(irreversible, vec![true, false]);
    }

    #[tokio::test]
    async fn test_fork_deletes_rows_past_base() {
        let mut projector = Projector::new(MemStore::default());
        for block_num in 1..=10u64 {
            projector
                .disperse(&block(
                    block_num,
                    token_transfer(
                        &format!("trx{}", block_num),
                        "alice",
                        "bob",
                        "1.000 CMN",
                        "",
                    ),
                ))
                .await
                .unwrap();
        }

        projector.handle_fork(5).await.unwrap();

        let state = projector.store().state.lock().unwrap();
        assert_eq!(state.transfers.len(), 5);
        assert_eq!(state.history.len(), 5);
        assert!(state
            .transfers
            .iter()
            .all(|(transfer, _)| transfer.block_num <= 5));
    }

    #[tokio::test]
    async fn test_open_balance_is_idempotent() {
        let mut projector = Projector::new(MemStore::default());
        let open = serde_json::json!([{
            "id": "trx1",
            "actions": [{
                "code": "c.point",
                "receiver": "c.point",
                "action": "open",
                "args": {"owner": "alice", "commun_code": "CATS"},
                "events": []
            }]
        }]);

        projector.disperse(&block(101, open.clone())).await.unwrap();

        // Balance accrues before the replayed open.
        projector
            .store()
            .state
            .lock()
            .unwrap()
            .set_balance("alice", "CATS", "5.000");

        let replay = block(102, open);
        projector.disperse(&replay).await.unwrap();

        let state = projector.store().state.lock().unwrap();
        let entries: Vec<_> = state
            .balances
            .iter()
            .filter(|b| b.user_id == "alice" && b.symbol == "CATS")
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].balance, "5.000");
    }

    #[tokio::test]
    async fn test_duplicate_transaction_is_skipped() {
        let mut projector = Projector::new(MemStore::default());
        let transfer = token_transfer("trx1", "alice", "bob", "1.000 CMN", "");

        projector.disperse(&block(101, transfer.clone())).await.unwrap();
        projector.disperse(&block(101, transfer)).await.unwrap();

        let state = projector.store().state.lock().unwrap();
        assert_eq!(state.transfers.len(), 1);
    }

    #[tokio::test]
    async fn test_hold_then_unhold_preserves_vote_direction() {
        let mut projector = Projector::new(MemStore::default());
        let gemstate = serde_json::json!([{
            "id": "trx1",
            "actions": [{
                "code": "c.gallery",
                "receiver": "c.gallery",
                "action": "emit",
                "args": {},
                "events": [{
                    "code": "c.gallery",
                    "event": "gemstate",
                    "args": {
                        "tracery": 4039900225u64,
                        "owner": "alice",
                        "creator": "bob",
                        "points": "58.408 CATS",
                        "damn": true
                    }
                }]
            }]
        }]);

        projector.disperse(&block(101, gemstate.clone())).await.unwrap();
        // Re-emitted state must not duplicate the hold.
        projector
            .disperse(&block(102, serde_json::json!([{
                "id": "trx2",
                "actions": gemstate[0]["actions"].clone()
            }])))
            .await
            .unwrap();

        let gemchop = serde_json::json!([{
            "id": "trx3",
            "actions": [{
                "code": "c.gallery",
                "receiver": "c.gallery",
                "action": "emit",
                "args": {},
                "events": [{
                    "code": "c.gallery",
                    "event": "gemchop",
                    "args": {
                        "tracery": 4039900225u64,
                        "owner": "alice",
                        "creator": "bob",
                        "unfrozen": "58.408 CATS"
                    }
                }]
            }]
        }]);
        projector.disperse(&block(103, gemchop)).await.unwrap();

        let state = projector.store().state.lock().unwrap();
        let kinds: Vec<(String, Option<String>)> = state
            .history
            .iter()
            .map(|(row, _)| {
                (
                    row.action_type.to_string(),
                    row.hold_type.map(|h| h.to_string()),
                )
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("hold".to_string(), Some("dislike".to_string())),
                ("unhold".to_string(), Some("dislike".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_currency_event_updates_point() {
        let mut projector = Projector::new(MemStore::default());
        let create = serde_json::json!([{
            "id": "trx1",
            "actions": [{
                "code": "c.point",
                "receiver": "c.point",
                "action": "create",
                "args": {"issuer": "community", "maximum_supply": "1000000.000 CATS", "cw": 10000, "fee": 100},
                "events": []
            }]
        }]);
        projector.disperse(&block(101, create)).await.unwrap();

        let currency = serde_json::json!([{
            "id": "trx2",
            "actions": [{
                "code": "c.point",
                "receiver": "c.point",
                "action": "issue",
                "args": {"quantity": "10.000 CATS", "memo": "issue"},
                "events": [{
                    "code": "c.point",
                    "event": "currency",
                    "args": {
                        "max_supply": "1000000.000 CATS",
                        "supply": "10.000 CATS",
                        "reserve": "30.0000 CMN",
                        "cw": 10000,
                        "fee": 100,
                        "issuer": "community"
                    }
                }]
            }]
        }]);
        projector.disperse(&block(102, currency)).await.unwrap();

        let state = projector.store().state.lock().unwrap();
        let point = state.points.iter().find(|p| p.symbol == "CATS").unwrap();
        assert_eq!(point.supply.as_deref(), Some("10.000 CATS"));
        assert_eq!(point.reserve.as_deref(), Some("30.0000 CMN"));
        assert_eq!(state.issue_log.len(), 1);
    }

    #[tokio::test]
    async fn test_donation_converts_through_the_curve() {
        let mut projector = Projector::new(MemStore::default());
        projector
            .store()
            .state
            .lock()
            .unwrap()
            .insert_point("CATS", "1004587.194 CATS", "1001029.0374 COMMUN", 10000, 100);

        let donation = serde_json::json!([{
            "id": "trx1",
            "actions": [{
                "code": "cyber.token",
                "receiver": "cyber.token",
                "action": "transfer",
                "args": {
                    "from": "alice",
                    "to": "bob",
                    "quantity": "2.000 CMN",
                    "memo": "donation for CATS:bob:first-post"
                },
                "events": []
            }]
        }]);
        projector.disperse(&block(101, donation)).await.unwrap();

        let state = projector.store().state.lock().unwrap();
        assert_eq!(state.donations.len(), 1);
        let donation = &state.donations[0];
        assert_eq!(donation.quantity, "2.007");
        assert_eq!(donation.symbol, "CATS");
        assert_eq!(donation.permlink, "first-post");

        let (history, _) = &state.history[0];
        assert_eq!(history.action_type.to_string(), "donation");
    }

    #[test]
    fn test_recent_transactions_expiry() {
        let mut recent = RecentTransactions::new(Duration::from_secs(60));
        let start = Instant::now();

        assert!(recent.observe_at("trx1", start));
        assert!(!recent.observe_at("trx1", start + Duration::from_secs(30)));
        assert!(recent.observe_at("trx1", start + Duration::from_secs(120)));
        assert!(recent.observe_at("trx2", start + Duration::from_secs(120)));
    }
}
