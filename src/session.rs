use crossterm::event::KeyEvent;
use tokio::sync::{broadcast, mpsc};
use url::Url;

use crate::analytics::AnalyticsLedger;
use crate::bus::{ResetBus, ResetSignal};
use crate::classify::{classify, Classified};
use crate::decision::{DecisionEngine, DecisionGroup, SubmittedDecision};
use crate::keyboard::{ComposerField, KeyCommand, KeyRouter};
use crate::links::console_task_url;
use crate::models::{Snapshot, TaskRecord};
use crate::nav::{MemoryNavigation, NavigationPort};
use crate::notices::{NoticeLevel, NoticeQueue};
use crate::projector::project;
use crate::viewstate::{
    InboxFilter, NavError, ViewStateStore, DEFAULT_LIMIT, DEFAULT_OFFSET, PARAM_INBOX,
    PARAM_LIMIT, PARAM_OFFSET, PARAM_VIEW_STATE_THREAD_ID,
};

/// What the fetch collaborator pushes into the session. The loading flag is
/// externally owned; the session only reads it.
#[derive(Clone, Debug)]
pub enum FeedEvent {
    Snapshot(Snapshot),
    Loading(bool),
}

pub fn feed_channel() -> (
    mpsc::UnboundedSender<FeedEvent>,
    mpsc::UnboundedReceiver<FeedEvent>,
) {
    mpsc::unbounded_channel()
}

/// The slice of list rows currently on screen. Focus moves adjust `top` so
/// the focused row stays inside the window.
#[derive(Clone, Copy, Debug)]
pub struct ListViewport {
    pub top: usize,
    pub height: usize,
}

impl ListViewport {
    fn new(height: usize) -> Self {
        Self {
            top: 0,
            height: height.max(1),
        }
    }

    fn ensure_visible(&mut self, index: usize) {
        if index < self.top {
            self.top = index;
        } else if index >= self.top + self.height {
            self.top = index + 1 - self.height;
        }
    }
}

/// The controller owning one of everything: navigation store, decision
/// engine, key router, ledger, notices, reset bus, and the latest snapshot
/// from the feed. Every operation runs to completion synchronously.
pub struct InboxSession<N: NavigationPort> {
    store: ViewStateStore<N>,
    engine: DecisionEngine,
    router: KeyRouter,
    ledger: AnalyticsLedger,
    pub notices: NoticeQueue,
    reset_bus: ResetBus,
    reset_rx: broadcast::Receiver<ResetSignal>,
    feed_rx: mpsc::UnboundedReceiver<FeedEvent>,
    snapshot: Option<Snapshot>,
    loading: bool,
    console_base_url: Option<String>,
    credential: Option<String>,
    viewport: ListViewport,
    focused_composer: Option<ComposerField>,
}

impl InboxSession<MemoryNavigation> {
    pub fn in_memory(feed_rx: mpsc::UnboundedReceiver<FeedEvent>) -> Self {
        Self::new(
            ViewStateStore::in_memory(),
            AnalyticsLedger::in_memory(),
            feed_rx,
        )
    }
}

impl<N: NavigationPort> InboxSession<N> {
    pub fn new(
        store: ViewStateStore<N>,
        ledger: AnalyticsLedger,
        feed_rx: mpsc::UnboundedReceiver<FeedEvent>,
    ) -> Self {
        let reset_bus = ResetBus::default();
        let reset_rx = reset_bus.subscribe();
        Self {
            store,
            engine: DecisionEngine::new(),
            router: KeyRouter::new(),
            ledger,
            notices: NoticeQueue::new(),
            reset_bus,
            reset_rx,
            feed_rx,
            snapshot: None,
            loading: false,
            console_base_url: None,
            credential: None,
            viewport: ListViewport::new(10),
            focused_composer: None,
        }
    }

    pub fn set_console_base_url(&mut self, url: Option<String>) {
        self.console_base_url = url;
    }

    pub fn set_credential(&mut self, credential: Option<String>) {
        self.credential = credential;
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport = ListViewport::new(height);
    }

    pub fn store(&self) -> &ViewStateStore<N> {
        &self.store
    }

    pub fn ledger(&self) -> &AnalyticsLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut AnalyticsLedger {
        &mut self.ledger
    }

    pub fn router(&self) -> &KeyRouter {
        &self.router
    }

    pub fn viewport(&self) -> ListViewport {
        self.viewport
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// External composers listen for the `u` reset signal here.
    pub fn subscribe_resets(&self) -> broadcast::Receiver<ResetSignal> {
        self.reset_bus.subscribe()
    }

    // ----------------------------------------------------------------
    // Feed
    // ----------------------------------------------------------------

    /// Drain the feed without blocking and keep the latest completed
    /// snapshot. When the selected task id vanished from the new snapshot
    /// the session routes back to the list. Returns whether a snapshot was
    /// applied.
    pub fn poll_feed(&mut self) -> bool {
        let mut applied = false;
        while let Ok(event) = self.feed_rx.try_recv() {
            match event {
                FeedEvent::Snapshot(snapshot) => {
                    self.snapshot = Some(snapshot);
                    applied = true;
                }
                FeedEvent::Loading(flag) => self.loading = flag,
            }
        }
        if applied {
            self.after_snapshot();
        }
        applied
    }

    fn after_snapshot(&mut self) {
        if let Some(id) = self.store.state().selected_task_id {
            let missing = !self.records().iter().any(|r| r.id() == id);
            if missing {
                tracing::debug!(task_id = %id, "selected task left the snapshot, returning to list");
                self.store.clear(PARAM_VIEW_STATE_THREAD_ID);
            }
        }
        self.rebind();
    }

    pub fn records(&self) -> &[TaskRecord] {
        self.snapshot
            .as_ref()
            .map(|s| s.records.as_slice())
            .unwrap_or(&[])
    }

    /// The rendered rows: projector output minus closed items, windowed to
    /// the current page.
    pub fn visible_records(&self) -> Vec<&TaskRecord> {
        let state = self.store.state();
        let filtered: Vec<&TaskRecord> = project(self.records(), state.filter)
            .into_iter()
            .filter(|r| !self.engine.is_closed(r.id()))
            .collect();

        let start = (state.offset as usize).min(filtered.len());
        let end = (state.offset.saturating_add(state.limit) as usize).min(filtered.len());
        filtered[start..end].to_vec()
    }

    fn visible_ids(&self) -> Vec<String> {
        self.visible_records()
            .iter()
            .map(|r| r.id().to_string())
            .collect()
    }

    fn filtered_len(&self) -> usize {
        let state = self.store.state();
        project(self.records(), state.filter)
            .into_iter()
            .filter(|r| !self.engine.is_closed(r.id()))
            .count()
    }

    // ----------------------------------------------------------------
    // Navigation
    // ----------------------------------------------------------------

    pub fn change_inbox(&mut self, filter: InboxFilter) -> Result<(), NavError> {
        self.store.set_many(
            &[PARAM_INBOX, PARAM_OFFSET, PARAM_LIMIT],
            &[filter.as_str(), DEFAULT_OFFSET, DEFAULT_LIMIT],
        )?;
        self.viewport.top = 0;
        self.rebind();
        Ok(())
    }

    /// Write missing pagination parameters back so links stay canonical.
    pub fn ensure_pagination_defaults(&mut self) -> Result<(), NavError> {
        let mut keys: Vec<&str> = Vec::new();
        let mut values: Vec<&str> = Vec::new();
        if self.store.get(PARAM_OFFSET).is_none() {
            keys.push(PARAM_OFFSET);
            values.push(DEFAULT_OFFSET);
        }
        if self.store.get(PARAM_LIMIT).is_none() {
            keys.push(PARAM_LIMIT);
            values.push(DEFAULT_LIMIT);
        }
        if !keys.is_empty() {
            self.store.set_many(&keys, &values)?;
        }
        Ok(())
    }

    pub fn next_page(&mut self) {
        let state = self.store.state();
        let next = state.offset.saturating_add(state.limit);
        if next >= self.filtered_len() as u64 {
            return;
        }
        self.store.set(PARAM_OFFSET, &next.to_string());
        self.viewport.top = 0;
        self.rebind();
    }

    pub fn prev_page(&mut self) {
        let state = self.store.state();
        if state.offset == 0 {
            return;
        }
        let prev = state.offset.saturating_sub(state.limit);
        self.store.set(PARAM_OFFSET, &prev.to_string());
        self.viewport.top = 0;
        self.rebind();
    }

    // ----------------------------------------------------------------
    // Detail lifecycle
    // ----------------------------------------------------------------

    /// Select a task and seed its decision group: record interrupts when
    /// present, otherwise the classified payload. A raw classification gets
    /// the one-time degraded notice for this task and an empty group.
    pub fn open_task(&mut self, task_id: &str) {
        let found = self
            .records()
            .iter()
            .find(|r| r.id() == task_id)
            .map(|r| (r.interrupts.clone(), r.task.payload.clone()));
        let Some((interrupts, payload)) = found else {
            self.notices.push(
                format!("Task {task_id} is not in the current snapshot"),
                NoticeLevel::Warn,
            );
            return;
        };

        let interrupts = if interrupts.is_empty() {
            match classify(payload) {
                Classified::Structured(list) => list,
                Classified::Raw(_) => {
                    tracing::debug!(task_id, "payload does not match the decision schema");
                    self.notices.push_once(
                        format!("raw:{task_id}"),
                        format!("Task {task_id} carries an unstructured payload; showing it raw"),
                        NoticeLevel::Warn,
                    );
                    Vec::new()
                }
            }
        } else {
            interrupts
        };

        self.store.set(PARAM_VIEW_STATE_THREAD_ID, task_id);
        self.engine.open(task_id, interrupts);
        if let Err(err) = self.engine.expand(task_id) {
            tracing::debug!(task_id, error = %err, "expand rejected");
        }
        self.blur_composer();
        self.rebind();
    }

    /// Collapse without resolving and return to the list. No event, scroll
    /// preserved by the store's thread-id clearing rule.
    pub fn close_task(&mut self) {
        let Some(task_id) = self.store.state().selected_task_id else {
            return;
        };
        if let Err(err) = self.engine.collapse(&task_id) {
            tracing::debug!(task_id = %task_id, error = %err, "collapse rejected");
        }
        self.store.clear(PARAM_VIEW_STATE_THREAD_ID);
        self.blur_composer();
        self.rebind();
    }

    pub fn current_group(&self) -> Option<&DecisionGroup> {
        let task_id = self.store.state().selected_task_id?;
        self.engine.group(&task_id)
    }

    /// Draft writes for the composer go straight to the engine's guards.
    pub fn current_group_mut(&mut self) -> Option<&mut DecisionGroup> {
        let task_id = self.store.state().selected_task_id?;
        self.engine.group_mut(&task_id).ok()
    }

    pub fn submit_current(&mut self) -> Option<SubmittedDecision> {
        let Some(task_id) = self.store.state().selected_task_id else {
            return None;
        };
        match self.engine.submit(&task_id) {
            Ok(decision) => {
                self.ledger.record(decision.event_kind, &task_id);
                self.store.clear(PARAM_VIEW_STATE_THREAD_ID);
                self.blur_composer();
                self.rebind();
                Some(decision)
            }
            Err(err) => {
                tracing::warn!(task_id = %task_id, error = %err, "submit rejected");
                self.notices.push(err.to_string(), NoticeLevel::Error);
                None
            }
        }
    }

    pub fn ignore_current(&mut self) -> bool {
        let Some(task_id) = self.store.state().selected_task_id else {
            return false;
        };
        match self.engine.ignore(&task_id) {
            Ok(kind) => {
                self.ledger.record(kind, &task_id);
                self.store.clear(PARAM_VIEW_STATE_THREAD_ID);
                self.blur_composer();
                self.rebind();
                true
            }
            Err(err) => {
                tracing::warn!(task_id = %task_id, error = %err, "ignore rejected");
                self.notices.push(err.to_string(), NoticeLevel::Error);
                false
            }
        }
    }

    /// The raw-path exit: close without a decision.
    pub fn resolve_current(&mut self) -> bool {
        let Some(task_id) = self.store.state().selected_task_id else {
            return false;
        };
        match self.engine.resolve(&task_id) {
            Ok(kind) => {
                self.ledger.record(kind, &task_id);
                self.store.clear(PARAM_VIEW_STATE_THREAD_ID);
                self.blur_composer();
                self.rebind();
                true
            }
            Err(err) => {
                tracing::warn!(task_id = %task_id, error = %err, "resolve rejected");
                self.notices.push(err.to_string(), NoticeLevel::Error);
                false
            }
        }
    }

    /// Missing configuration aborts with a transient notice and no state
    /// mutation.
    pub fn open_console_link(&mut self) -> Option<Url> {
        let Some(task_id) = self.store.state().selected_task_id else {
            return None;
        };
        match console_task_url(
            self.console_base_url.as_deref(),
            self.credential.as_deref(),
            &task_id,
        ) {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(task_id = %task_id, error = %err, "console link unavailable");
                self.notices.push(err.to_string(), NoticeLevel::Error);
                None
            }
        }
    }

    // ----------------------------------------------------------------
    // Keyboard
    // ----------------------------------------------------------------

    pub fn handle_key(&mut self, key: &KeyEvent) -> Option<KeyCommand> {
        let command = self.router.handle(key)?;
        self.apply_command(command.clone());
        Some(command)
    }

    fn apply_command(&mut self, command: KeyCommand) {
        match command {
            KeyCommand::FocusRow(index) => self.viewport.ensure_visible(index),
            KeyCommand::OpenItem(id) | KeyCommand::NavigateItem(id) => self.open_task(&id),
            KeyCommand::CloseItem => self.close_task(),
            KeyCommand::FocusComposer(field) => self.focus_composer(field),
            KeyCommand::BroadcastReset => self.broadcast_reset(),
        }
    }

    pub fn focus_composer(&mut self, field: ComposerField) {
        self.focused_composer = Some(field);
        self.router.set_typing(true);
    }

    pub fn blur_composer(&mut self) {
        self.focused_composer = None;
        self.router.set_typing(false);
    }

    pub fn focused_composer(&self) -> Option<ComposerField> {
        self.focused_composer
    }

    fn broadcast_reset(&mut self) {
        if let Err(err) = self.reset_bus.publish(ResetSignal::all()) {
            tracing::warn!(error = %err, "reset signal had no subscribers");
        }
        self.drain_resets();
    }

    fn drain_resets(&mut self) {
        while let Ok(signal) = self.reset_rx.try_recv() {
            for task_id in self.engine.task_ids() {
                if !signal.targets(&task_id) || self.engine.is_closed(&task_id) {
                    continue;
                }
                if let Err(err) = self.engine.reset_drafts(&task_id) {
                    tracing::debug!(task_id = %task_id, error = %err, "reset skipped");
                }
            }
        }
    }

    fn rebind(&mut self) {
        let ids = self.visible_ids();
        match self.store.state().selected_task_id {
            Some(current) => {
                let (first_response, first_edit) = self.composer_fields(&current);
                self.router
                    .rebind_detail(ids, current, first_response, first_edit);
            }
            None => self.router.rebind_list(ids),
        }
    }

    fn composer_fields(&self, task_id: &str) -> (Option<usize>, Option<usize>) {
        let Some(group) = self.engine.group(task_id) else {
            return (None, None);
        };
        let first_response = group
            .interrupts()
            .iter()
            .position(|i| i.config.allow_respond);
        let first_edit = group.interrupts().iter().position(|i| i.config.allow_edit);
        (first_response, first_edit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::AnalyticsEventKind;
    use crate::decision::DecisionStage;
    use crate::models::{ActionRequest, Interrupt, InterruptConfig, Task, TaskStatus};
    use crossterm::event::{KeyCode, KeyModifiers};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(id: &str, status: TaskStatus, interrupts: Vec<Interrupt>) -> TaskRecord {
        TaskRecord {
            task: Task {
                id: id.to_string(),
                status,
                payload: serde_json::Value::Null,
            },
            interrupts,
        }
    }

    fn full_interrupt(action: &str) -> Interrupt {
        Interrupt::new(
            ActionRequest::new(action).with_arg("target", "prod"),
            InterruptConfig {
                allow_ignore: true,
                allow_respond: true,
                allow_edit: true,
                allow_accept: true,
            },
        )
    }

    fn snapshot(records: Vec<TaskRecord>) -> Snapshot {
        Snapshot {
            records,
            captured_at: 1,
        }
    }

    fn session_with(records: Vec<TaskRecord>) -> InboxSession<MemoryNavigation> {
        let (tx, rx) = feed_channel();
        let mut session = InboxSession::in_memory(rx);
        tx.send(FeedEvent::Snapshot(snapshot(records))).unwrap();
        assert!(session.poll_feed());
        session
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn poll_feed_applies_the_latest_snapshot_and_loading_flag() {
        let (tx, rx) = feed_channel();
        let mut session = InboxSession::in_memory(rx);

        tx.send(FeedEvent::Loading(true)).unwrap();
        tx.send(FeedEvent::Snapshot(snapshot(vec![record(
            "t1",
            TaskStatus::Interrupted,
            vec![full_interrupt("deploy")],
        )])))
        .unwrap();
        tx.send(FeedEvent::Snapshot(snapshot(vec![record(
            "t2",
            TaskStatus::Interrupted,
            vec![full_interrupt("migrate")],
        )])))
        .unwrap();

        assert!(session.poll_feed());
        assert!(session.is_loading());
        let ids: Vec<_> = session.visible_records().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["t2"]);
    }

    #[test]
    fn snapshot_without_the_selected_task_routes_back_to_list() {
        let (tx, rx) = feed_channel();
        let mut session = InboxSession::in_memory(rx);
        tx.send(FeedEvent::Snapshot(snapshot(vec![record(
            "t1",
            TaskStatus::Interrupted,
            vec![full_interrupt("deploy")],
        )])))
        .unwrap();
        session.poll_feed();
        session.open_task("t1");
        assert_eq!(
            session.store().state().selected_task_id.as_deref(),
            Some("t1")
        );

        tx.send(FeedEvent::Snapshot(snapshot(vec![record(
            "t9",
            TaskStatus::Interrupted,
            vec![full_interrupt("other")],
        )])))
        .unwrap();
        session.poll_feed();
        assert_eq!(session.store().state().selected_task_id, None);
    }

    #[test]
    fn visible_records_filter_and_page() {
        let mut records = Vec::new();
        for i in 0..15 {
            records.push(record(
                &format!("t{i}"),
                TaskStatus::Interrupted,
                vec![full_interrupt("a")],
            ));
        }
        records.push(record("idle1", TaskStatus::Idle, vec![]));
        let mut session = session_with(records);

        // Default filter interrupted, limit 10.
        assert_eq!(session.visible_records().len(), 10);
        session.next_page();
        let ids: Vec<_> = session.visible_records().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["t10", "t11", "t12", "t13", "t14"]);

        // Page past the end is a no-op.
        session.next_page();
        assert_eq!(session.store().state().offset, 10);

        session.prev_page();
        assert_eq!(session.store().state().offset, 0);
        session.prev_page();
        assert_eq!(session.store().state().offset, 0);
    }

    #[test]
    fn change_inbox_writes_the_canonical_triple() {
        let mut session = session_with(vec![]);
        session.change_inbox(InboxFilter::Error).unwrap();
        let state = session.store().state();
        assert_eq!(state.filter, InboxFilter::Error);
        assert_eq!(state.offset, 0);
        assert_eq!(state.limit, 10);
    }

    #[test]
    fn pagination_defaults_are_written_back_once() {
        let (_tx, rx) = feed_channel();
        let mut session = InboxSession::new(
            ViewStateStore::with_query("inbox=all"),
            AnalyticsLedger::in_memory(),
            rx,
        );
        session.ensure_pagination_defaults().unwrap();
        assert_eq!(session.store().get(PARAM_OFFSET).as_deref(), Some("0"));
        assert_eq!(session.store().get(PARAM_LIMIT).as_deref(), Some("10"));

        let writes_before = session.store().port().replacements().len();
        session.ensure_pagination_defaults().unwrap();
        assert_eq!(session.store().port().replacements().len(), writes_before);
    }

    #[test]
    fn submit_closes_records_and_excludes_the_task() {
        let mut session = session_with(vec![
            record("t1", TaskStatus::Interrupted, vec![full_interrupt("deploy")]),
            record("t2", TaskStatus::Interrupted, vec![full_interrupt("scale")]),
        ]);
        session.open_task("t1");

        let decision = session.submit_current().expect("submitted");
        assert_eq!(decision.event_kind, AnalyticsEventKind::Accept);
        assert_eq!(session.store().state().selected_task_id, None);

        let ids: Vec<_> = session.visible_records().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["t2"]);
        assert_eq!(session.ledger().event_counts().accept, 1);
    }

    #[test]
    fn failed_ignore_keeps_the_group_expanded_and_pushes_a_notice() {
        let mut interrupt = full_interrupt("deploy");
        interrupt.config.allow_ignore = false;
        let mut session = session_with(vec![record(
            "t1",
            TaskStatus::Interrupted,
            vec![full_interrupt("deploy"), interrupt],
        )]);
        session.open_task("t1");

        assert!(!session.ignore_current());
        assert_eq!(
            session.current_group().map(|g| g.stage()),
            Some(DecisionStage::Expanded)
        );
        assert!(!session.notices.is_empty());
        assert_eq!(session.ledger().event_counts().ignore, 0);
        assert_eq!(
            session.store().state().selected_task_id.as_deref(),
            Some("t1")
        );
    }

    #[test]
    fn raw_payload_opens_an_empty_group_with_a_one_time_notice() {
        let mut session = session_with(vec![record(
            "t1",
            TaskStatus::Interrupted,
            vec![],
        )]);
        session.open_task("t1");
        assert_eq!(session.notices.notices.len(), 1);
        assert_eq!(
            session.current_group().map(|g| g.interrupts().len()),
            Some(0)
        );

        // Reopening does not re-notify.
        session.close_task();
        session.open_task("t1");
        assert_eq!(session.notices.notices.len(), 1);
    }

    #[test]
    fn structured_payload_seeds_the_group_when_interrupts_are_absent() {
        let payload = json!([{
            "action_request": {"action": "restart", "args": {"service": "api"}},
            "config": {"allow_accept": true},
        }]);
        let mut session = session_with(vec![TaskRecord {
            task: Task {
                id: "t1".to_string(),
                status: TaskStatus::HumanResponseNeeded,
                payload,
            },
            interrupts: vec![],
        }]);
        session.change_inbox(InboxFilter::All).unwrap();
        session.open_task("t1");

        let group = session.current_group().expect("group");
        assert_eq!(group.interrupts().len(), 1);
        assert_eq!(group.interrupts()[0].action_request.action, "restart");
        assert!(session.notices.is_empty());
    }

    #[test]
    fn resolve_records_the_event_and_leaves_detail() {
        let mut session = session_with(vec![record("t1", TaskStatus::Interrupted, vec![])]);
        session.open_task("t1");
        assert!(session.resolve_current());
        assert_eq!(session.ledger().event_counts().resolve, 1);
        assert_eq!(session.store().state().selected_task_id, None);
        assert!(session.visible_records().is_empty());
    }

    #[test]
    fn keyboard_walkthrough_opens_and_closes_a_task() {
        let mut session = session_with(vec![
            record("t1", TaskStatus::Interrupted, vec![full_interrupt("a")]),
            record("t2", TaskStatus::Interrupted, vec![full_interrupt("b")]),
        ]);

        session.handle_key(&press(KeyCode::Down));
        session.handle_key(&press(KeyCode::Down));
        assert_eq!(
            session.handle_key(&press(KeyCode::Enter)),
            Some(KeyCommand::OpenItem("t2".into()))
        );
        assert_eq!(
            session.store().state().selected_task_id.as_deref(),
            Some("t2")
        );

        // Up navigates to the sibling above.
        assert_eq!(
            session.handle_key(&press(KeyCode::Up)),
            Some(KeyCommand::NavigateItem("t1".into()))
        );
        assert_eq!(
            session.store().state().selected_task_id.as_deref(),
            Some("t1")
        );

        // e returns to the list.
        assert_eq!(
            session.handle_key(&press(KeyCode::Char('e'))),
            Some(KeyCommand::CloseItem)
        );
        assert_eq!(session.store().state().selected_task_id, None);
    }

    #[test]
    fn composer_focus_suppresses_shortcuts_until_blur() {
        let mut session = session_with(vec![record(
            "t1",
            TaskStatus::Interrupted,
            vec![full_interrupt("a")],
        )]);
        session.open_task("t1");

        assert_eq!(
            session.handle_key(&press(KeyCode::Char('r'))),
            Some(KeyCommand::FocusComposer(ComposerField::Response(0)))
        );
        assert!(session.router().is_typing());
        assert_eq!(session.handle_key(&press(KeyCode::Char('e'))), None);

        session.blur_composer();
        assert_eq!(
            session.handle_key(&press(KeyCode::Char('e'))),
            Some(KeyCommand::CloseItem)
        );
    }

    #[test]
    fn broadcast_reset_restores_current_drafts() {
        let mut session = session_with(vec![record(
            "t1",
            TaskStatus::Interrupted,
            vec![full_interrupt("deploy")],
        )]);
        session.open_task("t1");
        session
            .current_group_mut()
            .expect("group")
            .set_response(0, "draft")
            .unwrap();

        assert_eq!(
            session.handle_key(&press(KeyCode::Char('u'))),
            Some(KeyCommand::BroadcastReset)
        );
        assert_eq!(
            session.current_group().and_then(|g| g.response_draft(0)),
            Some("")
        );
    }

    #[test]
    fn console_link_requires_configuration() {
        let mut session = session_with(vec![record(
            "t1",
            TaskStatus::Interrupted,
            vec![full_interrupt("a")],
        )]);
        session.open_task("t1");

        assert!(session.open_console_link().is_none());
        assert!(!session.notices.is_empty());

        session.set_console_base_url(Some("https://console.example.com".into()));
        session.set_credential(Some("sk-123".into()));
        let url = session.open_console_link().expect("url");
        assert_eq!(url.as_str(), "https://console.example.com/thread/t1");
    }

    #[test]
    fn focus_row_scrolls_the_viewport() {
        let mut records = Vec::new();
        for i in 0..10 {
            records.push(record(
                &format!("t{i}"),
                TaskStatus::Interrupted,
                vec![full_interrupt("a")],
            ));
        }
        let mut session = session_with(records);
        session.set_viewport_height(3);

        for _ in 0..5 {
            session.handle_key(&press(KeyCode::Down));
        }
        // Focus index 4 with a 3-row window: top must have advanced to 2.
        assert_eq!(session.router().focused_row(), Some(4));
        assert_eq!(session.viewport().top, 2);

        for _ in 0..5 {
            session.handle_key(&press(KeyCode::Up));
        }
        assert_eq!(session.viewport().top, 0);
    }
}
