use serde::{Deserialize, Serialize};

use crate::models::interrupt::ActionRequest;

/// One resolved decision for one interrupt, in the shape the eventual commit
/// port will carry: a `type` tag plus a type-dependent `args` payload.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "args", rename_all = "snake_case")]
pub enum HumanResponse {
    Accept,
    Ignore,
    Response(String),
    Edit(ActionRequest),
}

impl HumanResponse {
    pub fn kind_str(&self) -> &'static str {
        match self {
            HumanResponse::Accept => "accept",
            HumanResponse::Ignore => "ignore",
            HumanResponse::Response(_) => "response",
            HumanResponse::Edit(_) => "edit",
        }
    }
}
