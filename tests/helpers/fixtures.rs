use serde_json::Value;
use triage_console::models::{
    ActionRequest, Interrupt, InterruptConfig, Snapshot, Task, TaskRecord, TaskStatus,
};

/// Every capability enabled.
pub fn full_caps() -> InterruptConfig {
    InterruptConfig {
        allow_ignore: true,
        allow_respond: true,
        allow_edit: true,
        allow_accept: true,
    }
}

/// Accept only, everything else forbidden.
pub fn accept_only() -> InterruptConfig {
    InterruptConfig {
        allow_accept: true,
        ..InterruptConfig::default()
    }
}

pub fn interrupt(action: &str, config: InterruptConfig) -> Interrupt {
    Interrupt::new(ActionRequest::new(action), config)
}

pub fn interrupt_with_arg(
    action: &str,
    key: &str,
    value: &str,
    config: InterruptConfig,
) -> Interrupt {
    Interrupt::new(ActionRequest::new(action).with_arg(key, value), config)
}

pub fn record(id: &str, status: TaskStatus, interrupts: Vec<Interrupt>) -> TaskRecord {
    TaskRecord {
        task: Task {
            id: id.to_string(),
            status,
            payload: Value::Null,
        },
        interrupts,
    }
}

/// A record whose interrupts arrive only through payload classification.
pub fn record_with_payload(id: &str, status: TaskStatus, payload: Value) -> TaskRecord {
    TaskRecord {
        task: Task {
            id: id.to_string(),
            status,
            payload,
        },
        interrupts: Vec::new(),
    }
}

pub fn snapshot(records: Vec<TaskRecord>) -> Snapshot {
    Snapshot {
        records,
        captured_at: 1_700_000_000,
    }
}

/// The standing three-task inbox most walkthroughs start from: two
/// interrupted tasks and one idle one.
pub fn review_inbox() -> Snapshot {
    snapshot(vec![
        record(
            "t1",
            TaskStatus::Interrupted,
            vec![interrupt("write_file", full_caps())],
        ),
        record(
            "t2",
            TaskStatus::Interrupted,
            vec![
                interrupt("deploy", full_caps()),
                interrupt("notify", accept_only()),
            ],
        ),
        record("t3", TaskStatus::Idle, vec![]),
    ])
}
