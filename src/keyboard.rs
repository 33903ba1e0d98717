use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

/// Which composer input `r` lands on, with the owning interrupt's position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComposerField {
    Response(usize),
    Edit(usize),
}

/// A routed key, ready for the session to apply. Row focus is the router's
/// own state; everything else names the item it acts on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    FocusRow(usize),
    OpenItem(String),
    NavigateItem(String),
    CloseItem,
    FocusComposer(ComposerField),
    BroadcastReset,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum RouterMode {
    #[default]
    List,
    Detail,
}

/// Routes plain key presses to list or detail commands. Selection lives here
/// as an ordered id list plus a clamped focus index, never inferred from
/// rendered output. The typing flag is set synchronously on focus and blur
/// and checked before any detail-mode routing.
#[derive(Debug, Default)]
pub struct KeyRouter {
    mode: RouterMode,
    ordered_ids: Vec<String>,
    current_id: Option<String>,
    focused_row: Option<usize>,
    typing: bool,
    first_response_field: Option<usize>,
    first_edit_field: Option<usize>,
}

impl KeyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebind for list mode. Stale focus is clamped into the new bounds.
    pub fn rebind_list(&mut self, ordered_ids: Vec<String>) {
        self.focused_row = match self.focused_row {
            Some(_) if ordered_ids.is_empty() => None,
            Some(i) => Some(i.min(ordered_ids.len() - 1)),
            None => None,
        };
        self.ordered_ids = ordered_ids;
        self.mode = RouterMode::List;
        self.current_id = None;
        self.first_response_field = None;
        self.first_edit_field = None;
    }

    /// Rebind for detail mode. Called again whenever the ordered id list or
    /// the current item changes, so routing never works from stale bindings.
    /// Entering detail drops the list focus index.
    pub fn rebind_detail(
        &mut self,
        ordered_ids: Vec<String>,
        current_id: String,
        first_response_field: Option<usize>,
        first_edit_field: Option<usize>,
    ) {
        self.ordered_ids = ordered_ids;
        self.mode = RouterMode::Detail;
        self.current_id = Some(current_id);
        self.focused_row = None;
        self.first_response_field = first_response_field;
        self.first_edit_field = first_edit_field;
    }

    pub fn set_typing(&mut self, typing: bool) {
        self.typing = typing;
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn focused_row(&self) -> Option<usize> {
        self.focused_row
    }

    pub fn handle(&mut self, key: &KeyEvent) -> Option<KeyCommand> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if !key.modifiers.is_empty() {
            return None;
        }
        match self.mode {
            RouterMode::List => self.route_list(key.code),
            RouterMode::Detail => self.route_detail(key.code),
        }
    }

    // List rows are not text inputs, so these stay live while typing.
    fn route_list(&mut self, code: KeyCode) -> Option<KeyCommand> {
        match code {
            KeyCode::Down => {
                if self.ordered_ids.is_empty() {
                    return None;
                }
                let last = self.ordered_ids.len() - 1;
                let next = match self.focused_row {
                    Some(i) => (i + 1).min(last),
                    None => 0,
                };
                self.focused_row = Some(next);
                Some(KeyCommand::FocusRow(next))
            }
            KeyCode::Up => {
                if self.ordered_ids.is_empty() {
                    return None;
                }
                let next = match self.focused_row {
                    Some(i) => i.saturating_sub(1),
                    None => 0,
                };
                self.focused_row = Some(next);
                Some(KeyCommand::FocusRow(next))
            }
            KeyCode::Enter => {
                let index = self.focused_row?;
                let id = self.ordered_ids.get(index)?;
                Some(KeyCommand::OpenItem(id.clone()))
            }
            _ => None,
        }
    }

    fn route_detail(&mut self, code: KeyCode) -> Option<KeyCommand> {
        if self.typing {
            return None;
        }
        match code {
            KeyCode::Down => self.sibling(1),
            KeyCode::Up => self.sibling(-1),
            KeyCode::Char('e') => Some(KeyCommand::CloseItem),
            KeyCode::Char('r') => {
                if let Some(index) = self.first_response_field {
                    Some(KeyCommand::FocusComposer(ComposerField::Response(index)))
                } else {
                    self.first_edit_field
                        .map(|index| KeyCommand::FocusComposer(ComposerField::Edit(index)))
                }
            }
            KeyCode::Char('u') => Some(KeyCommand::BroadcastReset),
            _ => None,
        }
    }

    fn sibling(&self, step: isize) -> Option<KeyCommand> {
        let current = self.current_id.as_deref()?;
        let position = self.ordered_ids.iter().position(|id| id == current)?;
        let target = position.checked_add_signed(step)?;
        let id = self.ordered_ids.get(target)?;
        Some(KeyCommand::NavigateItem(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};
    use pretty_assertions::assert_eq;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn list_router(list: &[&str]) -> KeyRouter {
        let mut router = KeyRouter::new();
        router.rebind_list(ids(list));
        router
    }

    fn detail_router(list: &[&str], current: &str) -> KeyRouter {
        let mut router = KeyRouter::new();
        router.rebind_detail(ids(list), current.to_string(), None, None);
        router
    }

    // ----------------------------------------------------------------
    // List mode
    // ----------------------------------------------------------------

    #[test]
    fn down_focuses_first_row_then_clamps_at_bottom() {
        let mut router = list_router(&["a", "b"]);
        assert_eq!(router.handle(&press(KeyCode::Down)), Some(KeyCommand::FocusRow(0)));
        assert_eq!(router.handle(&press(KeyCode::Down)), Some(KeyCommand::FocusRow(1)));
        assert_eq!(router.handle(&press(KeyCode::Down)), Some(KeyCommand::FocusRow(1)));
    }

    #[test]
    fn up_clamps_at_top() {
        let mut router = list_router(&["a", "b"]);
        router.handle(&press(KeyCode::Down));
        router.handle(&press(KeyCode::Down));
        assert_eq!(router.handle(&press(KeyCode::Up)), Some(KeyCommand::FocusRow(0)));
        assert_eq!(router.handle(&press(KeyCode::Up)), Some(KeyCommand::FocusRow(0)));
    }

    #[test]
    fn empty_list_ignores_arrows_and_enter() {
        let mut router = list_router(&[]);
        assert_eq!(router.handle(&press(KeyCode::Down)), None);
        assert_eq!(router.handle(&press(KeyCode::Up)), None);
        assert_eq!(router.handle(&press(KeyCode::Enter)), None);
    }

    #[test]
    fn enter_opens_the_focused_row_only() {
        let mut router = list_router(&["a", "b"]);
        assert_eq!(router.handle(&press(KeyCode::Enter)), None);
        router.handle(&press(KeyCode::Down));
        assert_eq!(
            router.handle(&press(KeyCode::Enter)),
            Some(KeyCommand::OpenItem("a".into()))
        );
    }

    #[test]
    fn list_keys_ignore_the_typing_flag() {
        let mut router = list_router(&["a"]);
        router.set_typing(true);
        assert_eq!(router.handle(&press(KeyCode::Down)), Some(KeyCommand::FocusRow(0)));
        assert_eq!(
            router.handle(&press(KeyCode::Enter)),
            Some(KeyCommand::OpenItem("a".into()))
        );
    }

    #[test]
    fn rebind_clamps_a_stale_focus_index() {
        let mut router = list_router(&["a", "b", "c"]);
        router.handle(&press(KeyCode::Down));
        router.handle(&press(KeyCode::Down));
        router.handle(&press(KeyCode::Down));
        assert_eq!(router.focused_row(), Some(2));

        router.rebind_list(ids(&["a"]));
        assert_eq!(router.focused_row(), Some(0));

        router.rebind_list(ids(&[]));
        assert_eq!(router.focused_row(), None);
    }

    #[test]
    fn entering_detail_drops_the_list_focus() {
        let mut router = list_router(&["a", "b"]);
        router.handle(&press(KeyCode::Down));
        assert_eq!(router.focused_row(), Some(0));

        router.rebind_detail(ids(&["a", "b"]), "a".into(), None, None);
        assert_eq!(router.focused_row(), None);
    }

    // ----------------------------------------------------------------
    // Detail mode
    // ----------------------------------------------------------------

    #[test]
    fn arrows_walk_siblings_without_wrapping() {
        let mut router = detail_router(&["a", "b", "c"], "b");
        assert_eq!(
            router.handle(&press(KeyCode::Down)),
            Some(KeyCommand::NavigateItem("c".into()))
        );
        assert_eq!(
            router.handle(&press(KeyCode::Up)),
            Some(KeyCommand::NavigateItem("a".into()))
        );

        let mut at_end = detail_router(&["a", "b", "c"], "c");
        assert_eq!(at_end.handle(&press(KeyCode::Down)), None);
        let mut at_start = detail_router(&["a", "b", "c"], "a");
        assert_eq!(at_start.handle(&press(KeyCode::Up)), None);
    }

    #[test]
    fn missing_current_id_makes_arrows_inert() {
        let mut router = detail_router(&["a", "b"], "gone");
        assert_eq!(router.handle(&press(KeyCode::Down)), None);
        assert_eq!(router.handle(&press(KeyCode::Up)), None);
    }

    #[test]
    fn e_closes_exactly_once_when_not_typing() {
        let mut router = detail_router(&["a"], "a");
        assert_eq!(
            router.handle(&press(KeyCode::Char('e'))),
            Some(KeyCommand::CloseItem)
        );
    }

    #[test]
    fn typing_suppresses_detail_shortcuts_and_arrows() {
        let mut router = detail_router(&["a", "b"], "a");
        router.set_typing(true);
        assert_eq!(router.handle(&press(KeyCode::Char('e'))), None);
        assert_eq!(router.handle(&press(KeyCode::Char('r'))), None);
        assert_eq!(router.handle(&press(KeyCode::Char('u'))), None);
        assert_eq!(router.handle(&press(KeyCode::Down)), None);

        router.set_typing(false);
        assert_eq!(
            router.handle(&press(KeyCode::Char('e'))),
            Some(KeyCommand::CloseItem)
        );
    }

    #[test]
    fn r_prefers_the_response_field_over_edit() {
        let mut router = KeyRouter::new();
        router.rebind_detail(ids(&["a"]), "a".into(), Some(1), Some(0));
        assert_eq!(
            router.handle(&press(KeyCode::Char('r'))),
            Some(KeyCommand::FocusComposer(ComposerField::Response(1)))
        );

        router.rebind_detail(ids(&["a"]), "a".into(), None, Some(0));
        assert_eq!(
            router.handle(&press(KeyCode::Char('r'))),
            Some(KeyCommand::FocusComposer(ComposerField::Edit(0)))
        );

        router.rebind_detail(ids(&["a"]), "a".into(), None, None);
        assert_eq!(router.handle(&press(KeyCode::Char('r'))), None);
    }

    #[test]
    fn u_broadcasts_a_reset() {
        let mut router = detail_router(&["a"], "a");
        assert_eq!(
            router.handle(&press(KeyCode::Char('u'))),
            Some(KeyCommand::BroadcastReset)
        );
    }

    // ----------------------------------------------------------------
    // Event filtering
    // ----------------------------------------------------------------

    #[test]
    fn only_plain_presses_are_routed() {
        let mut router = detail_router(&["a"], "a");

        let release = KeyEvent {
            code: KeyCode::Char('e'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(router.handle(&release), None);

        let ctrl_e = KeyEvent::new(KeyCode::Char('e'), KeyModifiers::CONTROL);
        assert_eq!(router.handle(&ctrl_e), None);
    }
}
