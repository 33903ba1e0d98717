use crate::models::{TaskRecord, TaskStatus};
use crate::viewstate::InboxFilter;

/// How one record is rendered: the structured decision item, or the generic
/// item used by everything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderPath {
    Decision,
    Generic,
}

impl RenderPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderPath::Decision => "decision",
            RenderPath::Generic => "generic",
        }
    }
}

/// Stable filter over one snapshot: output preserves input order, nothing is
/// resorted. The predicate is literal status equality, so a
/// `human_response_needed` record appears only under `All`.
pub fn project(records: &[TaskRecord], filter: InboxFilter) -> Vec<&TaskRecord> {
    records
        .iter()
        .filter(|record| filter_matches(filter, record.status()))
        .collect()
}

pub fn filter_matches(filter: InboxFilter, status: TaskStatus) -> bool {
    match filter {
        InboxFilter::All => true,
        InboxFilter::Interrupted => status == TaskStatus::Interrupted,
        InboxFilter::Idle => status == TaskStatus::Idle,
        InboxFilter::Busy => status == TaskStatus::Busy,
        InboxFilter::Error => status == TaskStatus::Error,
    }
}

/// Rendering normalization: `human_response_needed` presents as idle. The
/// record's reported status is untouched.
pub fn presented_status(record: &TaskRecord) -> TaskStatus {
    match record.status() {
        TaskStatus::HumanResponseNeeded => TaskStatus::Idle,
        other => other,
    }
}

/// The structured decision path requires both the interrupted status and a
/// non-empty interrupt sequence. An interrupted record with no interrupts
/// renders generically while still reporting `interrupted`.
pub fn render_path(record: &TaskRecord) -> RenderPath {
    if record.status() == TaskStatus::Interrupted && !record.interrupts.is_empty() {
        RenderPath::Decision
    } else {
        RenderPath::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionRequest, Interrupt, InterruptConfig, Task};
    use serde_json::Value;

    fn record(id: &str, status: TaskStatus, interrupt_count: usize) -> TaskRecord {
        let interrupts = (0..interrupt_count)
            .map(|i| {
                Interrupt::new(
                    ActionRequest::new(format!("action-{i}")),
                    InterruptConfig::default(),
                )
            })
            .collect();
        TaskRecord {
            task: Task {
                id: id.to_string(),
                status,
                payload: Value::Null,
            },
            interrupts,
        }
    }

    fn ids(records: &[&TaskRecord]) -> Vec<String> {
        records.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn all_returns_same_length_and_order() {
        let records = vec![
            record("a", TaskStatus::Interrupted, 1),
            record("b", TaskStatus::Idle, 0),
            record("c", TaskStatus::Busy, 0),
            record("d", TaskStatus::Error, 0),
            record("e", TaskStatus::HumanResponseNeeded, 0),
        ];
        let projected = project(&records, InboxFilter::All);
        assert_eq!(ids(&projected), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn idle_excludes_interrupted_busy_and_error() {
        let records = vec![
            record("a", TaskStatus::Interrupted, 1),
            record("b", TaskStatus::Idle, 0),
            record("c", TaskStatus::Busy, 0),
            record("d", TaskStatus::Error, 0),
        ];
        let projected = project(&records, InboxFilter::Idle);
        assert_eq!(ids(&projected), vec!["b"]);
    }

    #[test]
    fn human_response_needed_matches_only_all() {
        let records = vec![record("h", TaskStatus::HumanResponseNeeded, 0)];
        assert_eq!(project(&records, InboxFilter::All).len(), 1);
        for filter in [
            InboxFilter::Interrupted,
            InboxFilter::Idle,
            InboxFilter::Busy,
            InboxFilter::Error,
        ] {
            assert!(project(&records, filter).is_empty(), "{filter:?}");
        }
    }

    #[test]
    fn filter_keeps_relative_order_among_survivors() {
        let records = vec![
            record("x1", TaskStatus::Idle, 0),
            record("y", TaskStatus::Busy, 0),
            record("x2", TaskStatus::Idle, 0),
            record("x3", TaskStatus::Idle, 0),
        ];
        let projected = project(&records, InboxFilter::Idle);
        assert_eq!(ids(&projected), vec!["x1", "x2", "x3"]);
    }

    #[test]
    fn human_response_needed_presents_as_idle() {
        let hrn = record("h", TaskStatus::HumanResponseNeeded, 0);
        assert_eq!(presented_status(&hrn), TaskStatus::Idle);
        // Reported status is untouched.
        assert_eq!(hrn.status(), TaskStatus::HumanResponseNeeded);

        let err = record("e", TaskStatus::Error, 0);
        assert_eq!(presented_status(&err), TaskStatus::Error);
    }

    #[test]
    fn interrupted_with_interrupts_takes_the_decision_path() {
        let r = record("a", TaskStatus::Interrupted, 2);
        assert_eq!(render_path(&r), RenderPath::Decision);
    }

    #[test]
    fn interrupted_without_interrupts_falls_back_to_generic() {
        let records = vec![
            record("a", TaskStatus::Interrupted, 0),
            record("b", TaskStatus::Idle, 0),
        ];

        let interrupted = project(&records, InboxFilter::Interrupted);
        assert_eq!(ids(&interrupted), vec!["a"]);
        assert_eq!(render_path(interrupted[0]), RenderPath::Generic);
        assert_eq!(interrupted[0].status(), TaskStatus::Interrupted);

        let idle = project(&records, InboxFilter::Idle);
        assert_eq!(ids(&idle), vec!["b"]);
    }

    #[test]
    fn fallback_holds_under_the_all_filter_too() {
        let records = vec![record("a", TaskStatus::Interrupted, 0)];
        let all = project(&records, InboxFilter::All);
        assert_eq!(render_path(all[0]), RenderPath::Generic);
    }

    #[test]
    fn non_interrupted_records_are_generic_even_with_interrupts() {
        // A collaborator bug could attach interrupts to a busy task; status
        // still gates the decision path.
        let r = record("z", TaskStatus::Busy, 1);
        assert_eq!(render_path(&r), RenderPath::Generic);
    }
}
