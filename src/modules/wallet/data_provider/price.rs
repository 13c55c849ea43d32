use std::str::FromStr;

use crate::modules::wallet::schemas;
use crate::types::Asset;
use crate::{curve, db_helpers, errors, types};

pub(crate) async fn get_point(
    pool: &sqlx::Pool<sqlx::Postgres>,
    symbol: &str,
) -> crate::Result<Option<super::models::PointInfo>> {
    let rows = db_helpers::select_retry_or_panic::<super::models::PointInfo>(
        pool,
        r"SELECT symbol, issuer, maximum_supply, supply, reserve, cw, fee,
                 transfer_fee, min_transfer_fee_points, logo, name
          FROM points WHERE symbol = $1",
        &[symbol.to_string()],
    )
    .await?;
    Ok(rows.into_iter().next())
}

fn curve_state(info: &super::models::PointInfo) -> crate::Result<curve::PointState> {
    let (supply, reserve) = match (info.supply.as_deref(), info.reserve.as_deref()) {
        (Some(supply), Some(reserve)) => (supply, reserve),
        _ => {
            return Err(errors::ErrorKind::InvalidInput(format!(
                "point {} has no curve state yet",
                info.symbol
            ))
            .into())
        }
    };
    curve::PointState::from_assets(
        supply,
        reserve,
        u32::try_from(info.cw).unwrap_or(0),
        u32::try_from(info.fee).unwrap_or(0),
    )
}

/// Quote for redeeming `quantity` (e.g. `"2.000 CATS"`) into the reserve
/// currency.
pub(crate) async fn get_sell_price(
    pool: &sqlx::Pool<sqlx::Postgres>,
    quantity: &str,
) -> crate::Result<schemas::PriceResponse> {
    let asset = Asset::from_str(quantity)?;

    let info = get_point(pool, &asset.symbol).await?.ok_or_else(|| {
        errors::ErrorKind::InvalidInput(format!("point {} is not found", asset.symbol))
    })?;
    let state = curve_state(&info)?;

    let price = curve::calculate_sell_amount(&state, &asset.amount, true)?;
    Ok(schemas::PriceResponse {
        price: format!("{} {}", price, crate::RESERVE_SYMBOL),
    })
}

/// Quote for buying `point_symbol` with `quantity` of reserve currency.
pub(crate) async fn get_buy_price(
    pool: &sqlx::Pool<sqlx::Postgres>,
    point_symbol: &str,
    quantity: &str,
) -> crate::Result<schemas::PriceResponse> {
    let asset = Asset::from_str(quantity)?;

    let info = get_point(pool, point_symbol).await?.ok_or_else(|| {
        errors::ErrorKind::InvalidInput(format!("point {} is not found", point_symbol))
    })?;
    let state = curve_state(&info)?;

    let price = curve::calculate_buy_amount(&state, &asset.amount, true)?;
    Ok(schemas::PriceResponse {
        price: format!("{} {}", price, point_symbol),
    })
}

pub(crate) fn point_info_response(info: super::models::PointInfo) -> schemas::PointInfoResponse {
    schemas::PointInfoResponse {
        symbol: info.symbol,
        issuer: info.issuer,
        maximum_supply: info.maximum_supply,
        supply: info.supply,
        reserve: info.reserve,
        cw: types::U64::from(info.cw as u64),
        fee: types::U64::from(info.fee as u64),
        transfer_fee: info.transfer_fee.map(|v| types::U64::from(v as u64)),
        min_transfer_fee_points: info.min_transfer_fee_points.map(|v| types::U64::from(v as u64)),
        logo: info.logo,
        name: info.name,
    }
}
