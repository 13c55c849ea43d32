use paperclip::actix::{
    api_v2_operation,
    web::{self, Json},
};

use super::{data_provider, schemas};
use crate::{errors, types};

#[api_v2_operation(tags(Wallet))]
/// Get user's balances
///
/// This endpoint returns all point and reserve currency balances of the given
/// user_id, together with the frozen (staked) part and the current sell price
/// of each point position.
pub async fn get_balances(
    pool: web::Data<sqlx::Pool<sqlx::Postgres>>,
    request: actix_web_validator::Path<schemas::UserRequest>,
) -> crate::Result<Json<schemas::BalancesResponse>> {
    let balances = data_provider::get_balances(&pool, &request.user_id).await?;

    Ok(Json(schemas::BalancesResponse {
        user_id: request.user_id.clone(),
        balances,
    }))
}

#[api_v2_operation(tags(Wallet))]
/// Get user's transfer history
///
/// This endpoint returns the activity feed of the given user_id: transfers,
/// conversions, rewards, donations, claims and content-stake holds, filtered
/// by the independent facet parameters. Sorted in a historical descending
/// order.
pub async fn get_transfer_history(
    pool: web::Data<sqlx::Pool<sqlx::Postgres>>,
    request: actix_web_validator::Path<schemas::UserRequest>,
    params: web::Query<schemas::HistoryParams>,
) -> crate::Result<Json<schemas::HistoryResponse>> {
    let pagination = types::query_params::checked_get_pagination(&types::query_params::PaginationParams {
        offset: params.offset,
        limit: params.limit,
    })?;

    let symbol = params.symbol.clone().unwrap_or_else(|| "all".to_string());
    if symbol != "all" && errors::validate_symbol(&symbol).is_err() {
        return Err(errors::ErrorKind::InvalidInput(format!(
            "symbol {} is malformed",
            symbol
        ))
        .into());
    }

    let facets = data_provider::HistoryFacets {
        direction: params.direction.unwrap_or_default(),
        symbol,
        transfer_type: params.transfer_type.unwrap_or_default(),
        rewards: params.rewards.unwrap_or_default(),
        donations: params.donations.unwrap_or_default(),
        claim: params.claim.unwrap_or_default(),
        hold_type: params.hold_type.unwrap_or_default(),
    };

    let items =
        data_provider::get_transfer_history(&pool, &request.user_id, &facets, &pagination).await?;

    Ok(Json(schemas::HistoryResponse { items }))
}

#[api_v2_operation(tags(Wallet))]
/// Get user's claim history
///
/// This endpoint returns the reward claims of the given user_id, optionally
/// narrowed to a comma-separated list of symbols. Sorted in a historical
/// descending order.
pub async fn get_claim_history(
    pool: web::Data<sqlx::Pool<sqlx::Postgres>>,
    request: actix_web_validator::Path<schemas::UserRequest>,
    params: web::Query<schemas::ClaimHistoryParams>,
) -> crate::Result<Json<schemas::ClaimsResponse>> {
    let pagination = types::query_params::checked_get_pagination(&types::query_params::PaginationParams {
        offset: params.offset,
        limit: params.limit,
    })?;

    let symbols: Vec<String> = params
        .symbols
        .as_deref()
        .unwrap_or("all")
        .split(',')
        .map(|symbol| symbol.trim().to_string())
        .filter(|symbol| !symbol.is_empty())
        .collect();
    for symbol in &symbols {
        if symbol != "all" && errors::validate_symbol(symbol).is_err() {
            return Err(errors::ErrorKind::InvalidInput(format!(
                "symbol {} is malformed",
                symbol
            ))
            .into());
        }
    }

    let items =
        data_provider::get_claim_history(&pool, &request.user_id, &symbols, &pagination).await?;

    Ok(Json(schemas::ClaimsResponse { items }))
}

#[api_v2_operation(tags(Wallet))]
/// Get sell price quote
///
/// This endpoint quotes how much reserve currency the given point quantity
/// (e.g. `2.000 CATS`) would return right now, conversion fee included.
pub async fn get_sell_price(
    pool: web::Data<sqlx::Pool<sqlx::Postgres>>,
    params: web::Query<schemas::SellPriceParams>,
) -> crate::Result<Json<schemas::PriceResponse>> {
    Ok(Json(
        data_provider::get_sell_price(&pool, &params.quantity).await?,
    ))
}

#[api_v2_operation(tags(Wallet))]
/// Get buy price quote
///
/// This endpoint quotes how many points of point_symbol the given reserve
/// currency quantity (e.g. `2.000 CMN`) would buy right now.
pub async fn get_buy_price(
    pool: web::Data<sqlx::Pool<sqlx::Postgres>>,
    params: web::Query<schemas::BuyPriceParams>,
) -> crate::Result<Json<schemas::PriceResponse>> {
    Ok(Json(
        data_provider::get_buy_price(&pool, &params.point_symbol, &params.quantity).await?,
    ))
}

#[api_v2_operation(tags(Wallet))]
/// Get point metadata
///
/// This endpoint returns the bonding-curve parameters and display metadata of
/// the given point symbol, without the issue/restock sub-logs.
pub async fn get_point_info(
    pool: web::Data<sqlx::Pool<sqlx::Postgres>>,
    request: actix_web_validator::Path<schemas::PointRequest>,
) -> crate::Result<Json<schemas::PointInfoResponse>> {
    let info = data_provider::get_point(&pool, &request.symbol)
        .await?
        .ok_or_else(|| {
            errors::ErrorKind::InvalidInput(format!("point {} is not found", request.symbol))
        })?;

    Ok(Json(data_provider::point_info_response(info)))
}
