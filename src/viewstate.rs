use std::fmt;

use url::form_urlencoded;

use crate::nav::{MemoryNavigation, NavigationPort, ScrollReset};

pub const PARAM_INBOX: &str = "inbox";
pub const PARAM_OFFSET: &str = "offset";
pub const PARAM_LIMIT: &str = "limit";
pub const PARAM_VIEW_STATE_THREAD_ID: &str = "view_state_thread_id";
pub const PARAM_PANEL: &str = "panel";

pub const DEFAULT_OFFSET: &str = "0";
pub const DEFAULT_LIMIT: &str = "10";

/// Which bucket of tasks the list shows. Parameter values are bit-exact so
/// links stay shareable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InboxFilter {
    All,
    #[default]
    Interrupted,
    Idle,
    Busy,
    Error,
}

impl InboxFilter {
    pub const ALL: [InboxFilter; 5] = [
        InboxFilter::All,
        InboxFilter::Interrupted,
        InboxFilter::Idle,
        InboxFilter::Busy,
        InboxFilter::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InboxFilter::All => "all",
            InboxFilter::Interrupted => "interrupted",
            InboxFilter::Idle => "idle",
            InboxFilter::Busy => "busy",
            InboxFilter::Error => "error",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InboxFilter::All => "All",
            InboxFilter::Interrupted => "Interrupted",
            InboxFilter::Idle => "Idle",
            InboxFilter::Busy => "Busy",
            InboxFilter::Error => "Error",
        }
    }

    pub fn parse(value: &str) -> Option<InboxFilter> {
        InboxFilter::ALL.into_iter().find(|f| f.as_str() == value)
    }
}

/// Side panel selection for the detail view. One value, so the old
/// two-booleans-both-true state cannot exist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PanelMode {
    State,
    #[default]
    Description,
    Hidden,
}

impl PanelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelMode::State => "state",
            PanelMode::Description => "description",
            PanelMode::Hidden => "hidden",
        }
    }

    pub fn parse(value: &str) -> Option<PanelMode> {
        [PanelMode::State, PanelMode::Description, PanelMode::Hidden]
            .into_iter()
            .find(|p| p.as_str() == value)
    }
}

/// The complete navigation-relevant state, derivable from and round-trippable
/// to a flat query string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    pub filter: InboxFilter,
    pub offset: u64,
    pub limit: u64,
    pub selected_task_id: Option<String>,
    pub panel: PanelMode,
}

impl ViewState {
    /// Unparseable or out-of-range values read as their documented defaults:
    /// unknown inbox → interrupted, bad offset → 0, bad or zero limit → 10.
    pub fn decode(query: &str) -> ViewState {
        let pairs = decode_pairs(query);
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .filter(|v| !v.is_empty())
        };

        let filter = first(PARAM_INBOX)
            .and_then(InboxFilter::parse)
            .unwrap_or_default();
        let offset = first(PARAM_OFFSET)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        let limit = first(PARAM_LIMIT)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(10);
        let selected_task_id = first(PARAM_VIEW_STATE_THREAD_ID).map(str::to_string);
        let panel = first(PARAM_PANEL)
            .and_then(PanelMode::parse)
            .unwrap_or_default();

        ViewState {
            filter,
            offset,
            limit,
            selected_task_id,
            panel,
        }
    }

    /// Canonical query form: inbox/offset/limit always written, thread id
    /// only while an item is open, panel only when it differs from the
    /// default.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair(PARAM_INBOX, self.filter.as_str());
        serializer.append_pair(PARAM_OFFSET, &self.offset.to_string());
        serializer.append_pair(PARAM_LIMIT, &self.limit.to_string());
        if let Some(id) = &self.selected_task_id {
            serializer.append_pair(PARAM_VIEW_STATE_THREAD_ID, id);
        }
        if self.panel != PanelMode::default() {
            serializer.append_pair(PARAM_PANEL, self.panel.as_str());
        }
        serializer.finish()
    }
}

/// Precondition violation on the batched store update: the two arrays must
/// line up, and nothing is written when they do not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavError {
    pub keys: usize,
    pub values: usize,
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "view-state batch holds {} keys but {} values",
            self.keys, self.values
        )
    }
}

impl std::error::Error for NavError {}

/// Query-parameter-backed navigation state. Every write is a read-modify-
/// write against the port's current query, merged with unrelated parameters
/// and applied as one non-history replacement. Writes take `&mut self`, so a
/// scope has exactly one writer and interleaved read-modify-write cannot
/// happen.
pub struct ViewStateStore<N: NavigationPort> {
    nav: N,
}

impl ViewStateStore<MemoryNavigation> {
    pub fn in_memory() -> Self {
        Self::new(MemoryNavigation::new())
    }

    pub fn with_query(query: impl Into<String>) -> Self {
        Self::new(MemoryNavigation::with_query(query))
    }
}

impl<N: NavigationPort> ViewStateStore<N> {
    pub fn new(nav: N) -> Self {
        Self { nav }
    }

    pub fn port(&self) -> &N {
        &self.nav
    }

    /// First occurrence wins; an empty stored value reads as absent.
    pub fn get(&self, key: &str) -> Option<String> {
        let query = self.nav.current_query();
        decode_pairs(&query)
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .filter(|v| !v.is_empty())
    }

    /// An empty value deletes the key instead of writing an empty string.
    /// Scroll position is preserved on the one transition that leaves item-
    /// detail view: clearing `view_state_thread_id` while it is present.
    pub fn set(&mut self, key: &str, value: &str) {
        let mut pairs = decode_pairs(&self.nav.current_query());
        let leaving_detail = key == PARAM_VIEW_STATE_THREAD_ID
            && value.is_empty()
            && pairs.iter().any(|(k, _)| k == PARAM_VIEW_STATE_THREAD_ID);

        apply_patch(&mut pairs, key, value);
        let scroll = if leaving_detail {
            ScrollReset::Preserve
        } else {
            ScrollReset::Reset
        };
        self.nav.replace_query(encode_pairs(&pairs), scroll);
    }

    /// All patches are computed against one snapshot of the current query and
    /// issued as a single replacement. A length mismatch fails before any
    /// write. The batch form never preserves scroll.
    pub fn set_many(&mut self, keys: &[&str], values: &[&str]) -> Result<(), NavError> {
        if keys.len() != values.len() {
            return Err(NavError {
                keys: keys.len(),
                values: values.len(),
            });
        }

        let mut pairs = decode_pairs(&self.nav.current_query());
        for (key, value) in keys.iter().zip(values.iter()) {
            apply_patch(&mut pairs, key, value);
        }
        self.nav
            .replace_query(encode_pairs(&pairs), ScrollReset::Reset);
        Ok(())
    }

    pub fn clear(&mut self, key: &str) {
        self.set(key, "");
    }

    /// Typed view of the current query.
    pub fn state(&self) -> ViewState {
        ViewState::decode(&self.nav.current_query())
    }
}

fn decode_pairs(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn encode_pairs(pairs: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Mirrors URL parameter set/delete: replacing keeps the first occurrence's
/// position and drops duplicates, an empty value deletes every occurrence,
/// and a new key appends.
fn apply_patch(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    if value.is_empty() {
        pairs.retain(|(k, _)| k != key);
        return;
    }

    let mut replaced = false;
    pairs.retain_mut(|(k, v)| {
        if k == key {
            if replaced {
                return false;
            }
            *v = value.to_string();
            replaced = true;
        }
        true
    });
    if !replaced {
        pairs.push((key.to_string(), value.to_string()));
    }
}
