use paperclip::actix::Apiv2Schema;

/// What a history row describes. The classifier assigns exactly one of these
/// per recorded ledger event, in the priority order documented in
/// `projection::classifier`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
    Apiv2Schema,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    Transfer,
    Convert,
    Reward,
    Hold,
    Unhold,
    Claim,
    Burn,
    ReferralRegisterBonus,
    ReferralPurchaseBonus,
    Donation,
}

/// Whether the moved value was the base reserve token or a community point.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
    Apiv2Schema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
    Point,
    Token,
}

/// Direction of the original content-curation vote behind a hold/unhold row.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
    Apiv2Schema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HoldType {
    Like,
    Dislike,
}
