mod balance;
mod filter;
mod history;
mod models;
mod price;

pub(crate) use balance::get_balances;
pub(crate) use filter::HistoryFacets;
pub(crate) use history::{get_claim_history, get_transfer_history};
pub(crate) use price::{get_buy_price, get_point, get_sell_price, point_info_response};
