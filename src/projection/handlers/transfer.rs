use std::str::FromStr;

use crate::curve;
use crate::projection::chain::{arg_str, Action, Event, TrxContext};
use crate::projection::classifier::{classify_memo, MemoKind};
use crate::projection::store::{
    ClaimRow, DonationRow, HistoryRow, ProjectedStore, TransferRow,
};
use crate::types::{ActionType, Asset, TransferType};
use crate::BigDecimal;

/// Which chain path delivered the value movement. The point contract route
/// and the buy route fix the transfer type; the token route records reserve
/// currency only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransferRoute {
    Token,
    Point,
    BuyPoint,
}

/// One value movement projected twice: the raw ledger row and its classified
/// history row. The writes are sequential but not atomic; readers tolerate
/// observing one without the other.
#[derive(Debug)]
pub(crate) struct LedgerEvent {
    pub transfer: TransferRow,
    pub history: HistoryRow,
    pub donation: Option<DonationTarget>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct DonationTarget {
    pub community_id: String,
    pub user_id: String,
    pub permlink: String,
}

pub(crate) async fn handle_token_transfer<S: ProjectedStore>(
    store: &S,
    action: &Action,
    ctx: &TrxContext,
) -> crate::Result<()> {
    let (sender, receiver, quantity) = match (
        arg_str(&action.args, "from"),
        arg_str(&action.args, "to"),
        arg_str(&action.args, "quantity"),
    ) {
        (Some(from), Some(to), Some(quantity)) => (from, to, quantity),
        _ => return Ok(()),
    };
    let memo = arg_str(&action.args, "memo").unwrap_or_default();

    process_transfer(
        store,
        TransferRoute::Token,
        sender,
        receiver,
        quantity,
        memo,
        &action.events,
        ctx,
    )
    .await
}

pub(crate) async fn handle_bulk_transfer<S: ProjectedStore>(
    store: &S,
    action: &Action,
    ctx: &TrxContext,
) -> crate::Result<()> {
    let sender = match arg_str(&action.args, "from") {
        Some(from) => from,
        None => return Ok(()),
    };
    let recipients = match action.args.get("recipients").and_then(|r| r.as_array()) {
        Some(recipients) => recipients,
        None => return Ok(()),
    };

    for recipient in recipients {
        let (receiver, quantity) = match (arg_str(recipient, "to"), arg_str(recipient, "quantity"))
        {
            (Some(to), Some(quantity)) => (to, quantity),
            _ => continue,
        };
        let memo = arg_str(recipient, "memo").unwrap_or_default();

        process_transfer(
            store,
            TransferRoute::Token,
            sender,
            receiver,
            quantity,
            memo,
            &action.events,
            ctx,
        )
        .await?;
    }
    Ok(())
}

pub(crate) async fn handle_point_transfer<S: ProjectedStore>(
    store: &S,
    action: &Action,
    ctx: &TrxContext,
) -> crate::Result<()> {
    let (sender, receiver, quantity) = match (
        arg_str(&action.args, "from"),
        arg_str(&action.args, "to"),
        arg_str(&action.args, "quantity"),
    ) {
        (Some(from), Some(to), Some(quantity)) => (from, to, quantity),
        _ => return Ok(()),
    };
    let memo = arg_str(&action.args, "memo").unwrap_or_default();

    process_transfer(
        store,
        TransferRoute::Point,
        sender,
        receiver,
        quantity,
        memo,
        &action.events,
        ctx,
    )
    .await
}

/// Reserve tokens sent to the point contract buy points; the conversion row
/// is recorded on the token side with the exchange outcome attached.
pub(crate) async fn handle_buy_point<S: ProjectedStore>(
    store: &S,
    action: &Action,
    ctx: &TrxContext,
) -> crate::Result<()> {
    let (sender, receiver, quantity) = match (
        arg_str(&action.args, "from"),
        arg_str(&action.args, "to"),
        arg_str(&action.args, "quantity"),
    ) {
        (Some(from), Some(to), Some(quantity)) => (from, to, quantity),
        _ => return Ok(()),
    };
    let memo = arg_str(&action.args, "memo").unwrap_or_default();

    process_transfer(
        store,
        TransferRoute::BuyPoint,
        sender,
        receiver,
        quantity,
        memo,
        &action.events,
        ctx,
    )
    .await
}

pub(crate) async fn handle_claim<S: ProjectedStore>(
    store: &S,
    action: &Action,
    ctx: &TrxContext,
) -> crate::Result<()> {
    let (user_id, quantity) = match (
        arg_str(&action.args, "owner"),
        arg_str(&action.args, "quantity"),
    ) {
        (Some(owner), Some(quantity)) => (owner, quantity),
        _ => return Ok(()),
    };
    let asset = match Asset::from_str(quantity) {
        Ok(asset) => asset,
        Err(error) => {
            tracing::warn!(target: crate::LOGGER_MSG, "skipping claim: {:?}", error);
            return Ok(());
        }
    };

    store
        .create_claim(&ClaimRow {
            user_id: user_id.to_string(),
            quantity: asset.amount.to_string(),
            symbol: asset.symbol,
            block_num: ctx.block_num,
            trx_id: ctx.trx_id.clone(),
            timestamp: ctx.timestamp,
        })
        .await?;
    tracing::debug!(target: crate::LOGGER_MSG, "Created claim for {}", user_id);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn process_transfer<S: ProjectedStore>(
    store: &S,
    route: TransferRoute,
    sender: &str,
    receiver: &str,
    quantity: &str,
    memo: &str,
    events: &[Event],
    ctx: &TrxContext,
) -> crate::Result<()> {
    let asset = match Asset::from_str(quantity) {
        Ok(asset) => asset,
        Err(error) => {
            tracing::warn!(target: crate::LOGGER_MSG, "skipping transfer: {:?}", error);
            return Ok(());
        }
    };

    // Plain token ledger only tracks the reserve currency.
    if route == TransferRoute::Token && asset.symbol != crate::RESERVE_SYMBOL {
        return Ok(());
    }

    let ledger = match classify_transfer(route, sender, receiver, &asset, memo, events, ctx) {
        Some(ledger) => ledger,
        None => return Ok(()),
    };

    store.create_transfer(&ledger.transfer).await?;
    store.create_history(&ledger.history).await?;
    tracing::debug!(
        target: crate::LOGGER_MSG,
        "Created transfer {} -> {} {} ({})",
        sender,
        receiver,
        asset,
        ledger.history.action_type
    );

    if let Some(target) = ledger.donation {
        write_donation(store, target, sender, &asset, ctx).await?;
    }
    Ok(())
}

/// Derives the history classification for a value movement. Returns `None`
/// when the movement must not be recorded at all: a plain transfer touching
/// the point contract double-counts a conversion that is captured through its
/// own routed action.
pub(crate) fn classify_transfer(
    route: TransferRoute,
    sender: &str,
    receiver: &str,
    asset: &Asset,
    memo: &str,
    events: &[Event],
    ctx: &TrxContext,
) -> Option<LedgerEvent> {
    let transfer_type = match route {
        TransferRoute::Token | TransferRoute::BuyPoint => TransferType::Token,
        TransferRoute::Point => TransferType::Point,
    };

    let exchange_amount = events
        .iter()
        .find(|e| e.event == "exchange")
        .and_then(|e| arg_str(&e.args, "amount"))
        .and_then(|raw| Asset::from_str(raw).ok())
        .map(|a| a.amount.to_string());
    let fee_amount = events
        .iter()
        .find(|e| e.event == "fee")
        .and_then(|e| arg_str(&e.args, "amount"))
        .and_then(|raw| Asset::from_str(raw).ok())
        .map(|a| a.amount.to_string());
    let fee_percent = events
        .iter()
        .find(|e| e.event == "currency")
        .and_then(|e| crate::projection::chain::arg_u32(&e.args, "fee"))
        .map(fee_percent_string);

    let mut tracery = None;
    let mut referral_initiator = None;
    let mut referral_data = None;
    let mut donation = None;

    let action_type = if route == TransferRoute::BuyPoint || exchange_amount.is_some() {
        ActionType::Convert
    } else {
        match classify_memo(memo) {
            Some(MemoKind::Reward { tracery: id }) => {
                tracery = Some(id);
                ActionType::Reward
            }
            Some(MemoKind::Claim) => ActionType::Claim,
            Some(MemoKind::ReferralRegisterBonus { initiator })
                if sender == crate::BOUNTY_ACCOUNT =>
            {
                referral_initiator = Some(initiator);
                ActionType::ReferralRegisterBonus
            }
            Some(MemoKind::ReferralPurchaseBonus { initiator, percent })
                if sender == crate::BOUNTY_ACCOUNT =>
            {
                referral_data = Some(serde_json::json!({ "percent": percent }));
                referral_initiator = Some(initiator);
                ActionType::ReferralPurchaseBonus
            }
            Some(MemoKind::Donation {
                community_id,
                user_id,
                permlink,
            }) => {
                donation = Some(DonationTarget {
                    community_id,
                    user_id,
                    permlink,
                });
                ActionType::Donation
            }
            _ if receiver == crate::BURN_ACCOUNT => ActionType::Burn,
            _ => ActionType::Transfer,
        }
    };

    if action_type == ActionType::Transfer
        && (sender == crate::POINT_CONTRACT || receiver == crate::POINT_CONTRACT)
    {
        return None;
    }

    let memo = if memo.is_empty() {
        None
    } else {
        Some(memo.to_string())
    };

    Some(LedgerEvent {
        transfer: TransferRow {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            quantity: asset.amount.to_string(),
            symbol: asset.symbol.clone(),
            memo: memo.clone(),
            block_num: ctx.block_num,
            trx_id: ctx.trx_id.clone(),
            timestamp: ctx.timestamp,
        },
        history: HistoryRow {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            quantity: asset.amount.to_string(),
            symbol: asset.symbol.clone(),
            memo,
            action_type,
            transfer_type: Some(transfer_type),
            hold_type: None,
            exchange_amount,
            fee_amount,
            fee_percent,
            tracery,
            referral_initiator,
            referral_data,
            block_num: ctx.block_num,
            trx_id: ctx.trx_id.clone(),
            timestamp: ctx.timestamp,
        },
        donation,
    })
}

async fn write_donation<S: ProjectedStore>(
    store: &S,
    target: DonationTarget,
    sender: &str,
    asset: &Asset,
    ctx: &TrxContext,
) -> crate::Result<()> {
    let (quantity, symbol) = converted_donation_quantity(store, &target.community_id, asset).await;

    store
        .create_donation(&DonationRow {
            community_id: target.community_id,
            user_id: target.user_id,
            permlink: target.permlink,
            sender: sender.to_string(),
            quantity: quantity.to_string(),
            symbol,
            trx_id: ctx.trx_id.clone(),
        })
        .await?;
    tracing::debug!(target: crate::LOGGER_MSG, "Created donation from {}", sender);
    Ok(())
}

/// Values a donated asset in the target community's points: same currency
/// passes through, reserve currency runs the buy curve, anything else is sold
/// into the reserve first. Curve or lookup trouble falls back to the raw
/// input; the donation record itself is best-effort.
async fn converted_donation_quantity<S: ProjectedStore>(
    store: &S,
    community_id: &str,
    asset: &Asset,
) -> (BigDecimal, String) {
    let raw = (asset.amount.clone(), asset.symbol.clone());

    if asset.symbol == community_id {
        return (asset.amount.clone(), community_id.to_string());
    }

    let target_state = match store.get_point(community_id).await {
        Ok(Some(record)) => match record.curve_state() {
            Some(state) => state,
            None => return raw,
        },
        _ => return raw,
    };

    let proceeds = if asset.symbol == crate::RESERVE_SYMBOL {
        asset.amount.clone()
    } else {
        let source_state = match store.get_point(&asset.symbol).await {
            Ok(Some(record)) => match record.curve_state() {
                Some(state) => state,
                None => return raw,
            },
            _ => return raw,
        };
        match curve::calculate_sell_amount(&source_state, &asset.amount, true) {
            Ok(amount) => amount,
            Err(error) => {
                tracing::warn!(target: crate::LOGGER_MSG, "donation sell fell back to raw: {}", error);
                return raw;
            }
        }
    };

    match curve::calculate_buy_amount(&target_state, &proceeds, false) {
        Ok(amount) => (amount, community_id.to_string()),
        Err(error) => {
            tracing::warn!(target: crate::LOGGER_MSG, "donation buy fell back to raw: {}", error);
            raw
        }
    }
}

fn fee_percent_string(basis_points: u32) -> String {
    if basis_points % 100 == 0 {
        (basis_points / 100).to_string()
    } else {
        format!("{}", basis_points as f64 / 100.0)
    }
}
