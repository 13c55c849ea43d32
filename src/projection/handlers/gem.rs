use std::str::FromStr;

use crate::projection::chain::{arg_bool, arg_str, arg_string, Event, TrxContext};
use crate::projection::store::{HistoryRow, ProjectedStore};
use crate::types::{ActionType, Asset, HoldType, TransferType};
use crate::BigDecimal;

/// A gemstate event locks curation points behind a vote. The first event for
/// a (symbol, voter, author, tracery) tuple writes the hold row; the chain
/// re-emits the state on refill, which must not duplicate it.
pub(crate) async fn handle_gem_state_event<S: ProjectedStore>(
    store: &S,
    event: &Event,
    ctx: &TrxContext,
) -> crate::Result<()> {
    let (tracery, owner, creator, points) = match (
        arg_string(&event.args, "tracery"),
        arg_str(&event.args, "owner"),
        arg_str(&event.args, "creator"),
        arg_str(&event.args, "points"),
    ) {
        (Some(tracery), Some(owner), Some(creator), Some(points)) => {
            (tracery, owner, creator, points)
        }
        _ => return Ok(()),
    };

    let asset = match Asset::from_str(points) {
        Ok(asset) => asset,
        Err(error) => {
            tracing::warn!(target: crate::LOGGER_MSG, "skipping gemstate event: {:?}", error);
            return Ok(());
        }
    };
    if asset.amount == BigDecimal::from(0) {
        return Ok(());
    }

    if store
        .find_hold_type(&asset.symbol, owner, creator, &tracery)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let hold_type = match arg_bool(&event.args, "damn") {
        Some(true) => HoldType::Dislike,
        _ => HoldType::Like,
    };

    store
        .create_history(&HistoryRow {
            sender: owner.to_string(),
            receiver: creator.to_string(),
            quantity: asset.amount.to_string(),
            symbol: asset.symbol.clone(),
            memo: None,
            action_type: ActionType::Hold,
            transfer_type: Some(TransferType::Point),
            hold_type: Some(hold_type),
            exchange_amount: None,
            fee_amount: None,
            fee_percent: None,
            tracery: Some(tracery.clone()),
            referral_initiator: None,
            referral_data: None,
            block_num: ctx.block_num,
            trx_id: ctx.trx_id.clone(),
            timestamp: ctx.timestamp,
        })
        .await?;
    tracing::debug!(target: crate::LOGGER_MSG, "Added user gemstate: {} {}", owner, tracery);
    Ok(())
}

/// The paired release. The unhold row copies the hold's type so the original
/// vote direction stays visible after the stake is gone.
pub(crate) async fn handle_gem_chop_event<S: ProjectedStore>(
    store: &S,
    event: &Event,
    ctx: &TrxContext,
) -> crate::Result<()> {
    let (tracery, owner, creator, unfrozen) = match (
        arg_string(&event.args, "tracery"),
        arg_str(&event.args, "owner"),
        arg_str(&event.args, "creator"),
        arg_str(&event.args, "unfrozen"),
    ) {
        (Some(tracery), Some(owner), Some(creator), Some(unfrozen)) => {
            (tracery, owner, creator, unfrozen)
        }
        _ => return Ok(()),
    };

    let asset = match Asset::from_str(unfrozen) {
        Ok(asset) => asset,
        Err(error) => {
            tracing::warn!(target: crate::LOGGER_MSG, "skipping gemchop event: {:?}", error);
            return Ok(());
        }
    };
    if asset.amount == BigDecimal::from(0) {
        return Ok(());
    }

    let hold_type = store
        .find_hold_type(&asset.symbol, owner, creator, &tracery)
        .await?;

    store
        .create_history(&HistoryRow {
            sender: owner.to_string(),
            receiver: creator.to_string(),
            quantity: asset.amount.to_string(),
            symbol: asset.symbol.clone(),
            memo: None,
            action_type: ActionType::Unhold,
            transfer_type: Some(TransferType::Point),
            hold_type,
            exchange_amount: None,
            fee_amount: None,
            fee_percent: None,
            tracery: Some(tracery.clone()),
            referral_initiator: None,
            referral_data: None,
            block_num: ctx.block_num,
            trx_id: ctx.trx_id.clone(),
            timestamp: ctx.timestamp,
        })
        .await?;
    tracing::debug!(target: crate::LOGGER_MSG, "Added user gemchop: {} {}", owner, tracery);
    Ok(())
}
