use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The structured `{action, args}` payload a human is asked to act on.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

impl ActionRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            args: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

/// Capability flags controlling which decisions are legal for one interrupt.
/// Missing flags deserialize as false.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterruptConfig {
    #[serde(default)]
    pub allow_ignore: bool,
    #[serde(default)]
    pub allow_respond: bool,
    #[serde(default)]
    pub allow_edit: bool,
    #[serde(default)]
    pub allow_accept: bool,
}

impl InterruptConfig {
    pub fn any_composable(&self) -> bool {
        self.allow_respond || self.allow_edit || self.allow_accept
    }
}

/// A pause request from a task asking for one human decision.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interrupt {
    pub action_request: ActionRequest,
    #[serde(default)]
    pub config: InterruptConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Interrupt {
    pub fn new(action_request: ActionRequest, config: InterruptConfig) -> Self {
        Self {
            action_request,
            config,
            description: None,
        }
    }
}
