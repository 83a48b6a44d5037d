#![forbid(unsafe_code)]

//! Messages for server-pushed incremental data streams.

use serde::{Deserialize, Serialize};

/// Identifies one stream handle.
pub type HandleId = i32;

/// A batch of items delivered on a handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandleData {
    pub handle: HandleId,
    pub count: u32,
    pub data: Vec<serde_json::Value>,
}

/// A request to derive a new stream from an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyStream {
    pub from_handle: HandleId,
    pub ops: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_handle: Option<HandleId>,
}

/// A buffered stream message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StreamMessage {
    Data(HandleData),
    Modify(ModifyStream),
}

impl StreamMessage {
    /// The handle this message was received on.
    #[must_use]
    pub fn handle(&self) -> HandleId {
        match self {
            Self::Data(data) => data.handle,
            Self::Modify(modify) => modify.from_handle,
        }
    }
}
