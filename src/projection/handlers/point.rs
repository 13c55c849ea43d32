use std::str::FromStr;

use crate::projection::chain::{arg_str, arg_u32, arg_u64, Action, Event, TrxContext};
use crate::projection::classifier::{classify_memo, MemoKind};
use crate::projection::store::{CurrencyUpdate, NewPoint, ProjectedStore, SubLogEntry};
use crate::types::Asset;

pub(crate) async fn handle_point_create<S: ProjectedStore>(
    store: &S,
    action: &Action,
) -> crate::Result<()> {
    let maximum_supply = match arg_str(&action.args, "maximum_supply") {
        Some(value) => value,
        None => return Ok(()),
    };
    let asset = match Asset::from_str(maximum_supply) {
        Ok(asset) => asset,
        Err(error) => {
            tracing::warn!(target: crate::LOGGER_MSG, "skipping point create: {:?}", error);
            return Ok(());
        }
    };
    let issuer = match arg_str(&action.args, "issuer") {
        Some(issuer) => issuer,
        None => return Ok(()),
    };

    let (_, exponent) = asset.amount.as_bigint_and_exponent();
    let point = NewPoint {
        symbol: asset.symbol.clone(),
        decs: exponent.max(0) as u32,
        issuer: issuer.to_string(),
        maximum_supply: maximum_supply.to_string(),
        cw: arg_u32(&action.args, "cw").unwrap_or(0),
        fee: arg_u32(&action.args, "fee").unwrap_or(0),
    };

    store.create_point(&point).await?;
    tracing::debug!(target: crate::LOGGER_MSG, "Created point {}", asset.symbol);
    Ok(())
}

pub(crate) async fn handle_issue_point<S: ProjectedStore>(
    store: &S,
    action: &Action,
    ctx: &TrxContext,
) -> crate::Result<()> {
    let quantity = match arg_str(&action.args, "quantity") {
        Some(value) => value,
        None => return Ok(()),
    };
    let asset = match Asset::from_str(quantity) {
        Ok(asset) => asset,
        Err(error) => {
            tracing::warn!(target: crate::LOGGER_MSG, "skipping point issue: {:?}", error);
            return Ok(());
        }
    };

    // Supply itself is tracked by the authoritative currency events.
    if store.get_point(&asset.symbol).await?.is_none() {
        return Ok(());
    }

    store
        .push_issue_entry(
            &asset.symbol,
            &SubLogEntry {
                quantity: asset.amount.to_string(),
                memo: arg_str(&action.args, "memo").map(str::to_string),
                timestamp: ctx.timestamp,
            },
        )
        .await?;
    tracing::debug!(target: crate::LOGGER_MSG, "Updated point issue {}", asset.symbol);
    Ok(())
}

/// A reserve top-up rides an ordinary token transfer to the point contract,
/// tagged by its `restock: <SYMBOL>` memo.
pub(crate) async fn handle_restock<S: ProjectedStore>(
    store: &S,
    action: &Action,
    ctx: &TrxContext,
) -> crate::Result<()> {
    let memo = arg_str(&action.args, "memo").unwrap_or_default();
    let symbol = match classify_memo(memo) {
        Some(MemoKind::Restock { symbol }) => symbol,
        _ => return Ok(()),
    };

    let point = match store.get_point(&symbol).await? {
        Some(point) => point,
        None => return Ok(()),
    };

    let quantity = match arg_str(&action.args, "quantity") {
        Some(value) => value,
        None => return Ok(()),
    };
    let deposit = match Asset::from_str(quantity) {
        Ok(asset) => asset,
        Err(error) => {
            tracing::warn!(target: crate::LOGGER_MSG, "skipping restock: {:?}", error);
            return Ok(());
        }
    };

    let reserve = point
        .reserve
        .as_deref()
        .and_then(|raw| Asset::from_str(raw).ok())
        .unwrap_or_else(|| Asset::new(0.into(), &deposit.symbol));
    let new_reserve = Asset::new(reserve.amount + deposit.amount.clone(), &reserve.symbol);

    store
        .push_restock_entry(
            &symbol,
            &SubLogEntry {
                quantity: deposit.amount.to_string(),
                memo: Some(memo.to_string()),
                timestamp: ctx.timestamp,
            },
            &new_reserve.to_string(),
        )
        .await?;
    tracing::debug!(target: crate::LOGGER_MSG, "Restocked {} to {}", symbol, new_reserve);
    Ok(())
}

pub(crate) async fn handle_currency_event<S: ProjectedStore>(
    store: &S,
    event: &Event,
) -> crate::Result<()> {
    let max_supply = match arg_str(&event.args, "max_supply") {
        Some(value) => value,
        None => return Ok(()),
    };
    let symbol = match Asset::from_str(max_supply) {
        Ok(asset) => asset.symbol,
        Err(error) => {
            tracing::warn!(target: crate::LOGGER_MSG, "skipping currency event: {:?}", error);
            return Ok(());
        }
    };

    let (supply, reserve) = match (
        arg_str(&event.args, "supply"),
        arg_str(&event.args, "reserve"),
    ) {
        (Some(supply), Some(reserve)) => (supply, reserve),
        _ => return Ok(()),
    };

    let update = CurrencyUpdate {
        symbol: symbol.clone(),
        supply: supply.to_string(),
        reserve: reserve.to_string(),
        maximum_supply: max_supply.to_string(),
        cw: arg_u32(&event.args, "cw").unwrap_or(0),
        fee: arg_u32(&event.args, "fee").unwrap_or(0),
        issuer: arg_str(&event.args, "issuer").map(str::to_string),
        transfer_fee: arg_u32(&event.args, "transfer_fee"),
        min_transfer_fee_points: arg_u64(&event.args, "min_transfer_fee_points"),
    };

    // The point must already exist; a create action precedes currency events
    // in block order.
    if store.apply_currency_update(&update).await? {
        tracing::debug!(target: crate::LOGGER_MSG, "Updated point {}", symbol);
    }
    Ok(())
}

pub(crate) async fn handle_set_info<S: ProjectedStore>(
    store: &S,
    action: &Action,
) -> crate::Result<()> {
    let commun_code = match arg_str(&action.args, "commun_code") {
        Some(code) => code,
        None => return Ok(()),
    };
    let logo = arg_str(&action.args, "avatar_image");
    if logo.is_none() {
        return Ok(());
    }

    if store.set_point_info(commun_code, logo, None).await? {
        tracing::debug!(target: crate::LOGGER_MSG, "Updated point logo {}", commun_code);
    }
    Ok(())
}

pub(crate) async fn handle_community_create<S: ProjectedStore>(
    store: &S,
    action: &Action,
) -> crate::Result<()> {
    let commun_code = match arg_str(&action.args, "commun_code") {
        Some(code) => code,
        None => return Ok(()),
    };
    let name = match arg_str(&action.args, "community_name") {
        Some(name) if !name.is_empty() => name,
        _ => return Ok(()),
    };

    if store.set_point_info(commun_code, None, Some(name)).await? {
        tracing::debug!(target: crate::LOGGER_MSG, "Updated point name {}", commun_code);
    }
    Ok(())
}

pub(crate) async fn handle_set_params<S: ProjectedStore>(
    store: &S,
    action: &Action,
) -> crate::Result<()> {
    let commun_code = match arg_str(&action.args, "commun_code") {
        Some(code) => code,
        None => return Ok(()),
    };
    let fee = arg_u32(&action.args, "fee");
    let transfer_fee = arg_u32(&action.args, "transfer_fee");
    let min_transfer_fee_points = arg_u64(&action.args, "min_transfer_fee_points");
    if fee.is_none() && transfer_fee.is_none() && min_transfer_fee_points.is_none() {
        return Ok(());
    }

    if store
        .set_point_params(commun_code, fee, transfer_fee, min_transfer_fee_points)
        .await?
    {
        tracing::debug!(target: crate::LOGGER_MSG, "Updated point params {}", commun_code);
    }
    Ok(())
}
