use std::str::FromStr;

use num_traits::ToPrimitive;

use crate::{errors, types::Asset, BigDecimal};

/// 10000 basis points == 100%; also the connector weight of a linear curve.
pub(crate) const PERCENT_BASIS: u32 = 10_000;

/// Curve inputs of a point: circulating supply, reserve backing it, connector
/// weight and conversion fee (both in basis points of [`PERCENT_BASIS`]).
#[derive(Debug, Clone)]
pub struct PointState {
    pub supply: BigDecimal,
    pub reserve: BigDecimal,
    pub cw: u32,
    pub fee: u32,
}

impl PointState {
    /// Builds the state from the asset strings the chain reports supply and
    /// reserve as, e.g. `"1004587.194 CATS"` / `"1001029.0374 COMMUN"`.
    pub fn from_assets(supply: &str, reserve: &str, cw: u32, fee: u32) -> crate::Result<Self> {
        Ok(Self {
            supply: Asset::from_str(supply)?.amount,
            reserve: Asset::from_str(reserve)?.amount,
            cw,
            fee,
        })
    }
}

fn cw_fraction(cw: u32) -> f64 {
    cw as f64 / PERCENT_BASIS as f64
}

fn to_f64(value: &BigDecimal, what: &str) -> Result<f64, errors::ErrorKind> {
    value
        .to_f64()
        .ok_or_else(|| errors::ErrorKind::InternalError(format!("{} {} does not fit f64", what, value)))
}

fn from_formatted(value: String) -> crate::Result<BigDecimal> {
    BigDecimal::from_str(&value)
        .map_err(|e| errors::ErrorKind::InternalError(format!("curve output {}: {}", value, e)).into())
}

/// Cuts decimal places beyond `scale` without rounding. Only called on
/// non-negative curve outputs.
fn truncate_scale(value: &BigDecimal, scale: usize) -> BigDecimal {
    let rendered = value.to_string();
    let truncated = match rendered.split_once('.') {
        Some((int_part, frac)) if frac.len() > scale => {
            format!("{}.{}", int_part, &frac[..scale])
        }
        _ => rendered,
    };
    BigDecimal::from_str(&truncated).unwrap_or_else(|_| value.clone())
}

// calc_bancor_amount
/// How many points a deposit of reserve currency buys at the current curve
/// state. With `strict` off, an empty reserve passes the deposit through
/// unchanged (the bootstrap price is 1:1). Rounded to 3 decimal places.
pub fn calculate_buy_amount(
    point: &PointState,
    amount: &BigDecimal,
    strict: bool,
) -> crate::Result<BigDecimal> {
    let reserve = to_f64(&point.reserve, "reserve")?;
    let supply = to_f64(&point.supply, "supply")?;
    let amount = to_f64(amount, "amount")?;

    if !strict && reserve == 0.0 {
        return from_formatted(format!("{:.3}", amount));
    }

    let buy_prop = amount / reserve;
    let new_supply = supply * (1.0 + buy_prop).powf(cw_fraction(point.cw));

    let rounded = ((new_supply - supply) * 1_000.0).round() / 1_000.0;
    from_formatted(format!("{:.3}", rounded))
}

// calc_reserve_quantity
/// How much reserve currency a point redemption returns. Fails on negative
/// amounts and on amounts above the supply; redeeming the whole supply pays
/// out the whole reserve without running the curve, so the boundary loses no
/// precision. Truncated to 4 decimal places.
pub fn calculate_sell_amount(
    point: &PointState,
    amount: &BigDecimal,
    apply_fee: bool,
) -> crate::Result<BigDecimal> {
    let zero = BigDecimal::from(0);

    if *amount < zero {
        return Err(errors::ErrorKind::InvalidAmount(
            "can't convert negative quantity".to_string(),
        )
        .into());
    }
    if *amount > point.supply {
        return Err(errors::ErrorKind::ExceedsSupply(
            "can't convert more than supply".to_string(),
        )
        .into());
    }
    if *amount == zero {
        return Ok(zero);
    }

    if *amount == point.supply {
        let mut ret = point.reserve.clone();
        if apply_fee && point.fee > 0 {
            // (PERCENT_BASIS - fee) / PERCENT_BASIS as an exact 4-place decimal
            let multiplier = BigDecimal::new((PERCENT_BASIS - point.fee).into(), 4);
            ret = ret * multiplier;
        }
        return Ok(truncate_scale(&ret, 4));
    }

    let reserve = to_f64(&point.reserve, "reserve")?;
    let supply = to_f64(&point.supply, "supply")?;
    let amount = to_f64(amount, "amount")?;

    let mut ret = if point.cw == PERCENT_BASIS {
        (amount * reserve) / supply
    } else {
        let sell_prop = amount / supply;
        reserve * (1.0 - (1.0 - sell_prop).powf(1.0 / cw_fraction(point.cw)))
    };

    if apply_fee && point.fee > 0 {
        ret = (ret * (PERCENT_BASIS - point.fee) as f64) / PERCENT_BASIS as f64;
    }

    let truncated = (ret * 10_000.0).floor() / 10_000.0;
    from_formatted(format!("{:.4}", truncated))
}
