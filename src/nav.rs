/// Whether a query replacement should reset the view's scroll position.
/// Preserved only on the transition that leaves item-detail view, so the
/// list comes back where the user left it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollReset {
    Reset,
    Preserve,
}

/// The one external port of the view-state store. Implementations replace
/// the current query in place; nothing here ever appends history.
pub trait NavigationPort {
    fn current_query(&self) -> String;
    fn replace_query(&mut self, query: String, scroll: ScrollReset);
}

/// One recorded replacement, kept for inspection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replacement {
    pub query: String,
    pub scroll: ScrollReset,
}

/// In-process adapter: holds the query string directly and records every
/// replacement it sees.
#[derive(Debug, Default)]
pub struct MemoryNavigation {
    query: String,
    replacements: Vec<Replacement>,
}

impl MemoryNavigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            replacements: Vec::new(),
        }
    }

    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }

    pub fn last_scroll(&self) -> Option<ScrollReset> {
        self.replacements.last().map(|r| r.scroll)
    }
}

impl NavigationPort for MemoryNavigation {
    fn current_query(&self) -> String {
        self.query.clone()
    }

    fn replace_query(&mut self, query: String, scroll: ScrollReset) {
        self.query = query.clone();
        self.replacements.push(Replacement { query, scroll });
    }
}
