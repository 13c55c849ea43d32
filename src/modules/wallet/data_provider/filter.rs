use crate::types::query_params::{Direction, HoldTypeFacet, Toggle, TransferTypeFacet};

/// The facet set of a history query. Every facet is independent; the builder
/// reconciles them into one SQL condition.
#[derive(Debug, Clone)]
pub(crate) struct HistoryFacets {
    pub direction: Direction,
    pub symbol: String,
    pub transfer_type: TransferTypeFacet,
    pub rewards: Toggle,
    pub donations: Toggle,
    pub claim: Toggle,
    pub hold_type: HoldTypeFacet,
}

/// A composed WHERE condition over the `history` table plus its bind
/// arguments. `$1` is always the requesting user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HistoryFilter {
    pub clause: String,
    pub args: Vec<String>,
}

/// Builds the compound filter. Three asymmetries are encoded here:
///
/// * a conversion always has the point contract on one side, so directional
///   convert clauses match on `sender = user` plus the contract counterparty
///   and pick the token/point leg by direction;
/// * holds are always authored by the voter as `sender`, so "receive" means
///   the paired `unhold` row rather than a literal receiver match;
/// * the reserve currency alias expands to the `{transfer+token,
///   convert+point}` action pairs instead of a literal symbol match, because
///   the base currency appears under either combination.
pub(crate) fn build_filter(user_id: &str, facets: &HistoryFacets) -> HistoryFilter {
    let mut args = vec![user_id.to_string()];

    if facets.symbol == crate::RESERVE_SYMBOL {
        let direction_clause = match facets.direction {
            Direction::Receive => "receiver = $1".to_string(),
            Direction::Send => "sender = $1".to_string(),
            Direction::All => "(sender = $1 OR receiver = $1)".to_string(),
        };
        let type_clause = "((action_type = 'transfer' AND transfer_type = 'token') \
             OR (action_type = 'convert' AND transfer_type = 'point'))";
        return HistoryFilter {
            clause: format!("{} AND {}", direction_clause, type_clause),
            args,
        };
    }

    let mut clauses: Vec<String> = vec![];

    if facets.symbol != "all" {
        args.push(facets.symbol.clone());
        let placeholder = format!("${}", args.len());
        clauses.push(format!(
            "(symbol = {} OR memo = {})",
            placeholder, placeholder
        ));
    }

    let mut type_filters: Vec<String> = vec![];
    match facets.transfer_type {
        TransferTypeFacet::None => {}
        TransferTypeFacet::Transfer => type_filters.push(transfer_by_direction(facets.direction)),
        TransferTypeFacet::Convert => type_filters.push(convert_by_direction(facets.direction)),
        TransferTypeFacet::All => {
            type_filters.push(transfer_by_direction(facets.direction));
            type_filters.push(convert_by_direction(facets.direction));
        }
    }
    if facets.rewards == Toggle::All {
        type_filters.push(reward_by_direction(facets.direction));
    }
    if facets.donations == Toggle::All {
        type_filters.push(donation_by_direction(facets.direction));
    }
    if facets.claim == Toggle::All {
        type_filters.push(claim_by_direction(facets.direction));
    }
    match facets.hold_type {
        HoldTypeFacet::None => {}
        HoldTypeFacet::Like => {
            type_filters.push(format!(
                "({} AND hold_type = 'like')",
                hold_by_direction(facets.direction)
            ));
        }
        HoldTypeFacet::Dislike => {
            type_filters.push(format!(
                "({} AND hold_type = 'dislike')",
                hold_by_direction(facets.direction)
            ));
        }
        HoldTypeFacet::All => type_filters.push(hold_by_direction(facets.direction)),
    }

    if !type_filters.is_empty() {
        clauses.push(format!("({})", type_filters.join(" OR ")));
    }

    let clause = if clauses.is_empty() {
        "TRUE".to_string()
    } else {
        clauses.join(" AND ")
    };

    HistoryFilter { clause, args }
}

fn transfer_by_direction(direction: Direction) -> String {
    match direction {
        Direction::Receive => "(action_type = 'transfer' AND receiver = $1)".to_string(),
        Direction::Send => "(action_type = 'transfer' AND sender = $1)".to_string(),
        Direction::All => "((action_type = 'transfer' AND receiver = $1) \
                           OR (action_type = 'transfer' AND sender = $1))"
            .to_string(),
    }
}

fn convert_by_direction(direction: Direction) -> String {
    match direction {
        // Reserve top-ups ride the same action shape; they never belong to
        // a user's conversion history.
        Direction::Receive => format!(
            "(action_type = 'convert' AND transfer_type = 'token' \
             AND memo !~ '^restock:' AND receiver = '{}' AND sender = $1)",
            crate::POINT_CONTRACT
        ),
        Direction::Send => format!(
            "(action_type = 'convert' AND transfer_type = 'point' \
             AND receiver = '{}' AND sender = $1)",
            crate::POINT_CONTRACT
        ),
        Direction::All => "(action_type = 'convert' AND sender = $1)".to_string(),
    }
}

fn reward_by_direction(direction: Direction) -> String {
    match direction {
        Direction::Send => "(action_type = 'reward' AND sender = $1)".to_string(),
        Direction::Receive | Direction::All => {
            "(action_type = 'reward' AND receiver = $1)".to_string()
        }
    }
}

fn donation_by_direction(direction: Direction) -> String {
    match direction {
        Direction::Receive => {
            "(action_type = 'donation' AND transfer_type = 'point' AND receiver = $1)".to_string()
        }
        Direction::Send => {
            "(action_type = 'donation' AND transfer_type = 'point' AND sender = $1)".to_string()
        }
        Direction::All => "((action_type = 'donation' AND transfer_type = 'point' AND receiver = $1) \
                           OR (action_type = 'donation' AND transfer_type = 'point' AND sender = $1))"
            .to_string(),
    }
}

fn claim_by_direction(direction: Direction) -> String {
    match direction {
        Direction::Send => "(action_type = 'claim' AND sender = $1)".to_string(),
        Direction::Receive | Direction::All => {
            "(action_type = 'claim' AND receiver = $1)".to_string()
        }
    }
}

fn hold_by_direction(direction: Direction) -> String {
    match direction {
        Direction::Receive => "(action_type = 'unhold' AND sender = $1)".to_string(),
        Direction::Send => "(action_type = 'hold' AND sender = $1)".to_string(),
        Direction::All => "((action_type = 'hold' AND sender = $1) \
                           OR (action_type = 'unhold' AND sender = $1))"
            .to_string(),
    }
}
