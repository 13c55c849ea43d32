use paperclip::actix::Apiv2Schema;

use crate::errors;

const DEFAULT_PAGE_LIMIT: u32 = 20;
const MAX_PAGE_LIMIT: u32 = 100;

/// Which side of a row the requesting user must appear on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    All,
    Send,
    Receive,
}

impl Default for Direction {
    fn default() -> Self {
        Self::All
    }
}

/// Facets that are either fully on or fully off (rewards, donations, claims).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema,
)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    All,
    None,
}

impl Default for Toggle {
    fn default() -> Self {
        Self::All
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema,
)]
#[serde(rename_all = "lowercase")]
pub enum TransferTypeFacet {
    All,
    None,
    Transfer,
    Convert,
}

impl Default for TransferTypeFacet {
    fn default() -> Self {
        Self::All
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema,
)]
#[serde(rename_all = "lowercase")]
pub enum HoldTypeFacet {
    All,
    None,
    Like,
    Dislike,
}

impl Default for HoldTypeFacet {
    fn default() -> Self {
        Self::All
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Apiv2Schema)]
pub struct PaginationParams {
    pub offset: Option<u64>,
    /// Maximum available limit 100
    pub limit: Option<u32>,
}

// Helper for parsing the data from user
#[derive(Debug)]
pub(crate) struct Pagination {
    pub offset: u64,
    pub limit: u32,
}

pub(crate) fn checked_get_pagination(params: &PaginationParams) -> crate::Result<Pagination> {
    Ok(Pagination {
        offset: params.offset.unwrap_or(0),
        limit: checked_get_limit(params.limit)?,
    })
}

pub(crate) fn checked_get_limit(limit_param: Option<u32>) -> crate::Result<u32> {
    Ok(if let Some(limit) = limit_param {
        if limit > MAX_PAGE_LIMIT || limit == 0 {
            return Err(errors::ErrorKind::InvalidInput(format!(
                "Limit should be in range [1, {}]",
                MAX_PAGE_LIMIT
            ))
            .into());
        }
        limit
    } else {
        DEFAULT_PAGE_LIMIT
    })
}
