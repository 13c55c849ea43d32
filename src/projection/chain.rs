use chrono::{DateTime, Utc};

/// One notification of the block stream, in the transport's wire shape.
/// Strict delivery order is the transport's contract; the projection only
/// reacts.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StreamMessage {
    #[serde(rename = "BLOCK")]
    Block(Block),
    #[serde(rename = "IRREVERSIBLE_BLOCK")]
    IrreversibleBlock(IrreversibleBlock),
    #[serde(rename = "FORK")]
    Fork(Fork),
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub block_num: u64,
    pub id: String,
    pub block_time: DateTime<Utc>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Action {
    pub code: String,
    pub receiver: String,
    pub action: String,
    #[serde(default)]
    pub args: serde_json::Value,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Event {
    pub code: String,
    pub event: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrreversibleBlock {
    pub block_num: u64,
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fork {
    pub base_block_num: u64,
}

/// Per-transaction context stamped onto every row a handler writes.
#[derive(Debug, Clone)]
pub(crate) struct TrxContext {
    pub trx_id: String,
    pub block_num: u64,
    pub timestamp: DateTime<Utc>,
}

// Chain args are duck-typed maps; numeric fields arrive either as JSON numbers
// or as decimal strings depending on the emitting contract version.

pub(crate) fn arg_str<'a>(args: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

/// Correlation ids (tracery) arrive as numbers from some contract versions
/// and as strings from others; both normalize to the string form.
pub(crate) fn arg_string(args: &serde_json::Value, key: &str) -> Option<String> {
    match args.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn arg_u64(args: &serde_json::Value, key: &str) -> Option<u64> {
    match args.get(key)? {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub(crate) fn arg_u32(args: &serde_json::Value, key: &str) -> Option<u32> {
    arg_u64(args, key).and_then(|v| u32::try_from(v).ok())
}

pub(crate) fn arg_bool(args: &serde_json::Value, key: &str) -> Option<bool> {
    match args.get(key)? {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::Number(n) => n.as_u64().map(|v| v != 0),
        _ => None,
    }
}
