use std::str::FromStr;

use crate::projection::chain::{arg_str, Action, Event};
use crate::projection::store::ProjectedStore;
use crate::types::{asset, Asset};
use crate::BigDecimal;

pub(crate) async fn handle_balance_event<S: ProjectedStore>(
    store: &S,
    event: &Event,
) -> crate::Result<()> {
    let (account, balance) = match (
        arg_str(&event.args, "account"),
        arg_str(&event.args, "balance"),
    ) {
        (Some(account), Some(balance)) => (account, balance),
        _ => {
            tracing::warn!(target: crate::LOGGER_MSG, "balance event without account/balance args");
            return Ok(());
        }
    };

    let asset = match Asset::from_str(balance) {
        Ok(asset) => asset,
        Err(error) => {
            tracing::warn!(target: crate::LOGGER_MSG, "skipping balance event: {:?}", error);
            return Ok(());
        }
    };

    store
        .upsert_balance(account, &asset.symbol, &asset.amount.to_string())
        .await?;
    tracing::debug!(
        target: crate::LOGGER_MSG,
        "Updated balance: {} {} {}",
        account,
        asset.amount,
        asset.symbol
    );
    Ok(())
}

/// Opening an already-open balance is a no-op, so replays are harmless.
pub(crate) async fn handle_open_balance<S: ProjectedStore>(
    store: &S,
    action: &Action,
) -> crate::Result<()> {
    let commun_code = match arg_str(&action.args, "commun_code") {
        Some(code) if !code.is_empty() => code,
        _ => return Ok(()),
    };
    let owner = match arg_str(&action.args, "owner") {
        Some(owner) => owner,
        None => return Ok(()),
    };

    store.open_balance(owner, commun_code).await?;
    tracing::debug!(target: crate::LOGGER_MSG, "Opened balance: {} {}", owner, commun_code);
    Ok(())
}

pub(crate) async fn handle_inclstate_event<S: ProjectedStore>(
    store: &S,
    event: &Event,
) -> crate::Result<()> {
    let (account, quantity) = match (
        arg_str(&event.args, "account"),
        arg_str(&event.args, "quantity"),
    ) {
        (Some(account), Some(quantity)) => (account, quantity),
        _ => return Ok(()),
    };

    let asset = match Asset::from_str(quantity) {
        Ok(asset) => asset,
        Err(error) => {
            tracing::warn!(target: crate::LOGGER_MSG, "skipping inclstate event: {:?}", error);
            return Ok(());
        }
    };
    if asset.amount == BigDecimal::from(0) {
        return Ok(());
    }

    // The balance entry must already exist; inclstate never creates one.
    if store
        .set_frozen(account, &asset.symbol, &asset.amount.to_string())
        .await?
    {
        tracing::debug!(target: crate::LOGGER_MSG, "Updated frozen points: {} {}", account, quantity);
    }
    Ok(())
}

pub(crate) async fn handle_gem_chop_event<S: ProjectedStore>(
    store: &S,
    event: &Event,
) -> crate::Result<()> {
    let (owner, unfrozen) = match (
        arg_str(&event.args, "owner"),
        arg_str(&event.args, "unfrozen"),
    ) {
        (Some(owner), Some(unfrozen)) => (owner, unfrozen),
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

    let frozen = match store.get_frozen(owner, &asset.symbol).await? {
        Some(raw) => BigDecimal::from_str(&raw).unwrap_or_else(|_| BigDecimal::from(0)),
        None => return Ok(()),
    };

    let left = asset::frozen_after_release(&frozen, &asset.amount);
    store
        .set_frozen(owner, &asset.symbol, &left.to_string())
        .await?;
    tracing::debug!(target: crate::LOGGER_MSG, "Updated unfrozen points: {} {}", owner, asset.amount);
    Ok(())
}
