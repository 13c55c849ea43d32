pub(crate) mod activity;
pub(crate) mod asset;
pub(crate) mod numeric;
pub mod query_params;

pub(crate) use activity::{ActionType, HoldType, TransferType};
pub(crate) use asset::Asset;
pub(crate) use numeric::U64;
