use std::collections::HashMap;
use std::fmt;

use crate::analytics::AnalyticsEventKind;
use crate::models::{ActionRequest, HumanResponse, Interrupt};

/// Lifecycle of one opened interrupt group. Closed is terminal: a closed
/// group never re-enters the active render set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecisionStage {
    #[default]
    Collapsed,
    Expanded,
    Closed,
}

/// How a closed group got there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionOutcome {
    Submitted,
    Ignored,
    Resolved,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecisionError {
    /// Any transition attempted on a closed group.
    Terminal { task_id: String },
    /// Submit or ignore attempted while the group is not expanded.
    NotExpanded { task_id: String },
    /// Ignore attempted while some interrupt in the group forbids it.
    IgnoreNotAllowed { task_id: String },
    /// Draft write against an interrupt that lacks the capability.
    RespondNotAllowed { index: usize },
    EditNotAllowed { index: usize },
    IndexOutOfRange { index: usize, len: usize },
    /// An original argument key is missing from the edited draft.
    MissingArgKey { action: String, key: String },
    /// No interrupt in the group composes an entry.
    NothingToSubmit { task_id: String },
    /// Engine operation against a task id that was never opened.
    UnknownGroup { task_id: String },
}

impl fmt::Display for DecisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionError::Terminal { task_id } => {
                write!(f, "decision for task {task_id} is already closed")
            }
            DecisionError::NotExpanded { task_id } => {
                write!(f, "decision for task {task_id} is not expanded")
            }
            DecisionError::IgnoreNotAllowed { task_id } => {
                write!(f, "not every interrupt on task {task_id} allows ignore")
            }
            DecisionError::RespondNotAllowed { index } => {
                write!(f, "interrupt {index} does not accept a response")
            }
            DecisionError::EditNotAllowed { index } => {
                write!(f, "interrupt {index} does not accept edits")
            }
            DecisionError::IndexOutOfRange { index, len } => {
                write!(f, "interrupt index {index} out of range for group of {len}")
            }
            DecisionError::MissingArgKey { action, key } => {
                write!(f, "edited args for '{action}' dropped original key '{key}'")
            }
            DecisionError::NothingToSubmit { task_id } => {
                write!(f, "no interrupt on task {task_id} composes a response")
            }
            DecisionError::UnknownGroup { task_id } => {
                write!(f, "no decision group opened for task {task_id}")
            }
        }
    }
}

impl std::error::Error for DecisionError {}

/// The composed result of a successful submit: the per-interrupt responses in
/// wire shape, and the event kind of the capability that drove the decision.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmittedDecision {
    pub responses: Vec<HumanResponse>,
    pub event_kind: AnalyticsEventKind,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Draft {
    response: String,
    edited_args: std::collections::BTreeMap<String, String>,
}

/// One task's interrupts plus the in-progress drafts and stage. Groups are
/// independent: expanding one never touches another.
#[derive(Clone, Debug)]
pub struct DecisionGroup {
    task_id: String,
    interrupts: Vec<Interrupt>,
    drafts: Vec<Draft>,
    stage: DecisionStage,
    outcome: Option<DecisionOutcome>,
}

impl DecisionGroup {
    pub fn new(task_id: impl Into<String>, interrupts: Vec<Interrupt>) -> Self {
        let drafts = interrupts
            .iter()
            .map(|interrupt| Draft {
                response: String::new(),
                edited_args: interrupt.action_request.args.clone(),
            })
            .collect();
        Self {
            task_id: task_id.into(),
            interrupts,
            drafts,
            stage: DecisionStage::Collapsed,
            outcome: None,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn interrupts(&self) -> &[Interrupt] {
        &self.interrupts
    }

    pub fn stage(&self) -> DecisionStage {
        self.stage
    }

    pub fn outcome(&self) -> Option<DecisionOutcome> {
        self.outcome
    }

    pub fn is_closed(&self) -> bool {
        self.stage == DecisionStage::Closed
    }

    pub fn response_draft(&self, index: usize) -> Option<&str> {
        self.drafts.get(index).map(|d| d.response.as_str())
    }

    pub fn edited_args(&self, index: usize) -> Option<&std::collections::BTreeMap<String, String>> {
        self.drafts.get(index).map(|d| &d.edited_args)
    }

    /// All-or-nothing across the group. An empty group is vacuously true;
    /// callers on the raw path never offer ignore.
    pub fn ignore_allowed(&self) -> bool {
        self.interrupts.iter().all(|i| i.config.allow_ignore)
    }

    pub fn expand(&mut self) -> Result<(), DecisionError> {
        match self.stage {
            DecisionStage::Closed => Err(self.terminal()),
            _ => {
                self.stage = DecisionStage::Expanded;
                Ok(())
            }
        }
    }

    /// Back to collapsed without resolving. Emits nothing.
    pub fn collapse(&mut self) -> Result<(), DecisionError> {
        match self.stage {
            DecisionStage::Closed => Err(self.terminal()),
            _ => {
                self.stage = DecisionStage::Collapsed;
                Ok(())
            }
        }
    }

    pub fn set_response(&mut self, index: usize, text: &str) -> Result<(), DecisionError> {
        if self.stage == DecisionStage::Closed {
            return Err(self.terminal());
        }
        let interrupt = self.interrupt_at(index)?;
        if !interrupt.config.allow_respond {
            return Err(DecisionError::RespondNotAllowed { index });
        }
        self.drafts[index].response = text.to_string();
        Ok(())
    }

    /// Wholesale draft replacement. Mid-edit drafts may hold anything; key
    /// retention is checked at submit time.
    pub fn set_edited_args(
        &mut self,
        index: usize,
        args: std::collections::BTreeMap<String, String>,
    ) -> Result<(), DecisionError> {
        if self.stage == DecisionStage::Closed {
            return Err(self.terminal());
        }
        let interrupt = self.interrupt_at(index)?;
        if !interrupt.config.allow_edit {
            return Err(DecisionError::EditNotAllowed { index });
        }
        self.drafts[index].edited_args = args;
        Ok(())
    }

    pub fn set_edited_arg(
        &mut self,
        index: usize,
        key: &str,
        value: &str,
    ) -> Result<(), DecisionError> {
        if self.stage == DecisionStage::Closed {
            return Err(self.terminal());
        }
        let interrupt = self.interrupt_at(index)?;
        if !interrupt.config.allow_edit {
            return Err(DecisionError::EditNotAllowed { index });
        }
        self.drafts[index]
            .edited_args
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Restore every draft to its seeded value. Stage is untouched.
    pub fn reset_drafts(&mut self) -> Result<(), DecisionError> {
        if self.stage == DecisionStage::Closed {
            return Err(self.terminal());
        }
        for (draft, interrupt) in self.drafts.iter_mut().zip(&self.interrupts) {
            draft.response.clear();
            draft.edited_args = interrupt.action_request.args.clone();
        }
        Ok(())
    }

    pub fn ignore(&mut self) -> Result<AnalyticsEventKind, DecisionError> {
        match self.stage {
            DecisionStage::Closed => return Err(self.terminal()),
            DecisionStage::Collapsed => {
                return Err(DecisionError::NotExpanded {
                    task_id: self.task_id.clone(),
                })
            }
            DecisionStage::Expanded => {}
        }
        if !self.ignore_allowed() {
            return Err(DecisionError::IgnoreNotAllowed {
                task_id: self.task_id.clone(),
            });
        }
        self.stage = DecisionStage::Closed;
        self.outcome = Some(DecisionOutcome::Ignored);
        Ok(AnalyticsEventKind::Ignore)
    }

    /// Compose the group's responses and close. Per interrupt, the entry is
    /// the capability that drove it: edited args that differ from the
    /// original, else a non-empty response text, else a bare accept. Every
    /// original arg key must survive editing; a dropped key rejects the whole
    /// submit with nothing mutated and nothing emitted.
    pub fn submit(&mut self) -> Result<SubmittedDecision, DecisionError> {
        match self.stage {
            DecisionStage::Closed => return Err(self.terminal()),
            DecisionStage::Collapsed => {
                return Err(DecisionError::NotExpanded {
                    task_id: self.task_id.clone(),
                })
            }
            DecisionStage::Expanded => {}
        }

        for (interrupt, draft) in self.interrupts.iter().zip(&self.drafts) {
            if !interrupt.config.allow_edit {
                continue;
            }
            for key in interrupt.action_request.args.keys() {
                if !draft.edited_args.contains_key(key) {
                    return Err(DecisionError::MissingArgKey {
                        action: interrupt.action_request.action.clone(),
                        key: key.clone(),
                    });
                }
            }
        }

        let mut responses = Vec::new();
        for (interrupt, draft) in self.interrupts.iter().zip(&self.drafts) {
            let config = &interrupt.config;
            if config.allow_edit && draft.edited_args != interrupt.action_request.args {
                responses.push(HumanResponse::Edit(ActionRequest {
                    action: interrupt.action_request.action.clone(),
                    args: draft.edited_args.clone(),
                }));
            } else if config.allow_respond && !draft.response.is_empty() {
                responses.push(HumanResponse::Response(draft.response.clone()));
            } else if config.allow_accept {
                responses.push(HumanResponse::Accept);
            }
        }

        if responses.is_empty() {
            return Err(DecisionError::NothingToSubmit {
                task_id: self.task_id.clone(),
            });
        }

        let event_kind = if responses.iter().any(|r| matches!(r, HumanResponse::Edit(_))) {
            AnalyticsEventKind::Edit
        } else if responses
            .iter()
            .any(|r| matches!(r, HumanResponse::Response(_)))
        {
            AnalyticsEventKind::Response
        } else {
            AnalyticsEventKind::Accept
        };

        self.stage = DecisionStage::Closed;
        self.outcome = Some(DecisionOutcome::Submitted);
        Ok(SubmittedDecision {
            responses,
            event_kind,
        })
    }

    /// Close without a decision ("mark resolved", the raw-path exit).
    pub fn resolve(&mut self) -> Result<AnalyticsEventKind, DecisionError> {
        if self.stage == DecisionStage::Closed {
            return Err(self.terminal());
        }
        self.stage = DecisionStage::Closed;
        self.outcome = Some(DecisionOutcome::Resolved);
        Ok(AnalyticsEventKind::Resolve)
    }

    fn interrupt_at(&self, index: usize) -> Result<&Interrupt, DecisionError> {
        self.interrupts
            .get(index)
            .ok_or(DecisionError::IndexOutOfRange {
                index,
                len: self.interrupts.len(),
            })
    }

    fn terminal(&self) -> DecisionError {
        DecisionError::Terminal {
            task_id: self.task_id.clone(),
        }
    }
}

/// All groups of one session, keyed by task id. Expansion state is
/// per-group; nothing here is mutually exclusive.
#[derive(Debug, Default)]
pub struct DecisionEngine {
    groups: HashMap<String, DecisionGroup>,
}

impl DecisionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the group for a task. An existing group keeps its
    /// drafts and stage; a closed group stays closed.
    pub fn open(&mut self, task_id: &str, interrupts: Vec<Interrupt>) -> &mut DecisionGroup {
        self.groups
            .entry(task_id.to_string())
            .or_insert_with(|| DecisionGroup::new(task_id, interrupts))
    }

    pub fn group(&self, task_id: &str) -> Option<&DecisionGroup> {
        self.groups.get(task_id)
    }

    pub fn group_mut(&mut self, task_id: &str) -> Result<&mut DecisionGroup, DecisionError> {
        self.groups
            .get_mut(task_id)
            .ok_or_else(|| DecisionError::UnknownGroup {
                task_id: task_id.to_string(),
            })
    }

    pub fn stage(&self, task_id: &str) -> Option<DecisionStage> {
        self.groups.get(task_id).map(|g| g.stage())
    }

    pub fn task_ids(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    pub fn is_closed(&self, task_id: &str) -> bool {
        self.groups.get(task_id).map(|g| g.is_closed()).unwrap_or(false)
    }

    pub fn expand(&mut self, task_id: &str) -> Result<(), DecisionError> {
        self.group_mut(task_id)?.expand()
    }

    pub fn collapse(&mut self, task_id: &str) -> Result<(), DecisionError> {
        self.group_mut(task_id)?.collapse()
    }

    pub fn ignore(&mut self, task_id: &str) -> Result<AnalyticsEventKind, DecisionError> {
        self.group_mut(task_id)?.ignore()
    }

    pub fn submit(&mut self, task_id: &str) -> Result<SubmittedDecision, DecisionError> {
        self.group_mut(task_id)?.submit()
    }

    pub fn resolve(&mut self, task_id: &str) -> Result<AnalyticsEventKind, DecisionError> {
        self.group_mut(task_id)?.resolve()
    }

    pub fn reset_drafts(&mut self, task_id: &str) -> Result<(), DecisionError> {
        self.group_mut(task_id)?.reset_drafts()
    }
}
