use crate::modules::wallet::schemas;
use crate::types::query_params::Pagination;
use crate::{db_helpers, types};

use super::filter::{build_filter, HistoryFacets};

pub(crate) async fn get_transfer_history(
    pool: &sqlx::Pool<sqlx::Postgres>,
    user_id: &str,
    facets: &HistoryFacets,
    pagination: &Pagination,
) -> crate::Result<Vec<schemas::HistoryItem>> {
    let filter = build_filter(user_id, facets);

    let mut args = filter.args;
    args.push(pagination.offset.to_string());
    let offset_placeholder = args.len();
    args.push(pagination.limit.to_string());
    let limit_placeholder = args.len();

    // The point join resolves both legs of a conversion: point transfers by
    // their symbol, buy conversions by the target symbol in the memo.
    let query = format!(
        r"SELECT h.id, h.sender, h.receiver, h.quantity, h.symbol, h.memo,
                 h.action_type, h.transfer_type, h.hold_type, h.exchange_amount,
                 h.block_num, h.trx_id, h.timestamp, h.is_irreversible,
                 sm.username sender_username, sm.avatar_url sender_avatar_url,
                 rm.username receiver_username, rm.avatar_url receiver_avatar_url,
                 p.symbol point_symbol, p.name point_name, p.logo point_logo
          FROM history h
          LEFT JOIN user_metas sm ON sm.user_id = h.sender
          LEFT JOIN user_metas rm ON rm.user_id = h.receiver
          LEFT JOIN points p ON p.symbol = h.symbol OR p.symbol = h.memo
          WHERE {}
          ORDER BY h.id DESC
          OFFSET ${}::bigint LIMIT ${}::bigint",
        filter.clause, offset_placeholder, limit_placeholder
    );

    let rows = db_helpers::select_retry_or_panic::<super::models::HistoryInfo>(
        pool, &query, &args,
    )
    .await?;

    Ok(rows
        .into_iter()
        .map(|info| {
            let direction = if info.sender == user_id {
                "send"
            } else {
                "receive"
            };
            let point = info.point_symbol.as_ref().map(|symbol| schemas::PointSummary {
                symbol: symbol.clone(),
                name: info.point_name.clone(),
                logo: info.point_logo.clone(),
            });

            schemas::HistoryItem {
                id: types::U64::from(info.id as u64),
                sender: schemas::Participant {
                    user_id: info.sender,
                    username: info.sender_username,
                    avatar_url: info.sender_avatar_url,
                },
                receiver: schemas::Participant {
                    user_id: info.receiver,
                    username: info.receiver_username,
                    avatar_url: info.receiver_avatar_url,
                },
                quantity: info.quantity,
                symbol: info.symbol,
                point,
                trx_id: info.trx_id,
                memo: info.memo,
                block_num: types::U64::from(info.block_num as u64),
                timestamp: info.timestamp,
                is_irreversible: info.is_irreversible,
                meta: schemas::HistoryItemMeta {
                    action_type: info.action_type,
                    transfer_type: info.transfer_type,
                    hold_type: info.hold_type,
                    exchange_amount: info.exchange_amount,
                    direction: direction.to_string(),
                },
            }
        })
        .collect())
}

pub(crate) async fn get_claim_history(
    pool: &sqlx::Pool<sqlx::Postgres>,
    user_id: &str,
    symbols: &[String],
    pagination: &Pagination,
) -> crate::Result<Vec<schemas::ClaimItem>> {
    let mut args = vec![user_id.to_string()];
    let mut clause = "user_id = $1".to_string();

    if !symbols.iter().any(|symbol| symbol == "all") && !symbols.is_empty() {
        let mut placeholders = vec![];
        for symbol in symbols {
            args.push(symbol.clone());
            placeholders.push(format!("${}", args.len()));
        }
        clause.push_str(&format!(" AND symbol IN ({})", placeholders.join(", ")));
    }

    args.push(pagination.offset.to_string());
    let offset_placeholder = args.len();
    args.push(pagination.limit.to_string());
    let limit_placeholder = args.len();

    let query = format!(
        r"SELECT id, user_id, quantity, symbol, block_num, trx_id, timestamp, is_irreversible
          FROM claims
          WHERE {}
          ORDER BY id DESC
          OFFSET ${}::bigint LIMIT ${}::bigint",
        clause, offset_placeholder, limit_placeholder
    );

    let rows =
        db_helpers::select_retry_or_panic::<super::models::ClaimInfo>(pool, &query, &args).await?;

    Ok(rows
        .into_iter()
        .map(|info| schemas::ClaimItem {
            id: types::U64::from(info.id as u64),
            user_id: info.user_id,
            quantity: info.quantity,
            symbol: info.symbol,
            block_num: types::U64::from(info.block_num as u64),
            trx_id: info.trx_id,
            timestamp: info.timestamp,
            is_irreversible: info.is_irreversible,
        })
        .collect())
}
