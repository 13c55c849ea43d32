use std::fmt;
use std::str::FromStr;

use crate::{errors, BigDecimal};

/// A chain asset string, e.g. `"2.000 CMN"`. The amount keeps the exact
/// precision of the source string; ledger arithmetic never goes through a
/// binary float.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Asset {
    pub amount: BigDecimal,
    pub symbol: String,
}

impl Asset {
    pub(crate) fn new(amount: BigDecimal, symbol: &str) -> Self {
        Self {
            amount,
            symbol: symbol.to_string(),
        }
    }
}

impl FromStr for Asset {
    type Err = errors::ErrorKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.split(' ');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(amount), Some(symbol), None) if !amount.is_empty() && !symbol.is_empty() => {
                let amount = BigDecimal::from_str(amount).map_err(|e| {
                    errors::ErrorKind::ParseError(format!("malformed asset amount {:?}: {}", value, e))
                })?;
                Ok(Self {
                    amount,
                    symbol: symbol.to_string(),
                })
            }
            _ => Err(errors::ErrorKind::ParseError(format!(
                "malformed asset string: {:?}",
                value
            ))),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.symbol)
    }
}

/// Frozen balance left after a stake release, clamped at zero.
pub(crate) fn frozen_after_release(frozen: &BigDecimal, released: &BigDecimal) -> BigDecimal {
    let left = frozen - released;
    if left < BigDecimal::from(0) {
        BigDecimal::from(0)
    } else {
        left
    }
}
