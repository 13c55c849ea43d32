use std::str::FromStr;

use crate::modules::wallet::schemas;
use crate::{curve, db_helpers, BigDecimal};

pub(crate) async fn get_balances(
    pool: &sqlx::Pool<sqlx::Postgres>,
    user_id: &str,
) -> crate::Result<Vec<schemas::BalanceItem>> {
    let rows = db_helpers::select_retry_or_panic::<super::models::BalanceInfo>(
        pool,
        r"SELECT b.symbol, b.balance, b.frozen,
                 p.logo, p.name, p.supply, p.reserve, p.cw, p.fee
          FROM balances b
          LEFT JOIN points p ON p.symbol = b.symbol
          WHERE b.user_id = $1
          ORDER BY b.symbol",
        &[user_id.to_string()],
    )
    .await?;

    Ok(rows
        .into_iter()
        .map(|info| {
            let price = point_price(&info);
            schemas::BalanceItem {
                symbol: info.symbol,
                balance: info.balance,
                frozen: info.frozen,
                logo: info.logo,
                name: info.name,
                price,
            }
        })
        .collect())
}

/// What the whole position is worth in reserve currency right now. The
/// reserve currency itself has no backing point and gets no price; a curve
/// boundary violation just leaves the price out.
fn point_price(info: &super::models::BalanceInfo) -> Option<String> {
    let supply = info.supply.as_deref()?;
    let reserve = info.reserve.as_deref()?;
    let state = curve::PointState::from_assets(
        supply,
        reserve,
        u32::try_from(info.cw?).ok()?,
        u32::try_from(info.fee?).ok()?,
    )
    .ok()?;
    let balance = BigDecimal::from_str(&info.balance).ok()?;

    match curve::calculate_sell_amount(&state, &balance, true) {
        Ok(price) => Some(price.to_string()),
        Err(error) => {
            tracing::debug!(
                target: crate::LOGGER_MSG,
                "No price for {}: {}",
                info.symbol,
                error
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(balance: &str) -> super::super::models::BalanceInfo {
        super::super::models::BalanceInfo {
            symbol: "CATS".to_string(),
            balance: balance.to_string(),
            frozen: "0".to_string(),
            logo: None,
            name: None,
            supply: Some("1004587.201 CATS".to_string()),
            reserve: Some("1001029.0645 COMMUN".to_string()),
            cw: Some(10000),
            fee: Some(100),
        }
    }

    #[test]
    fn test_point_price() {
        assert_eq!(point_price(&info("2.000")).as_deref(), Some("1.9729"));
    }

    #[test]
    fn test_no_price_without_point() {
        let mut reserve_row = info("2.000");
        reserve_row.supply = None;
        assert_eq!(point_price(&reserve_row), None);
    }

    #[test]
    fn test_no_price_when_balance_exceeds_supply() {
        assert_eq!(point_price(&info("9999999.000")), None);
    }
}
