use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::interrupt::Interrupt;

/// Lifecycle status reported by the fetch collaborator for one task.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Interrupted,
    Idle,
    Busy,
    Error,
    HumanResponseNeeded,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Interrupted,
        TaskStatus::Idle,
        TaskStatus::Busy,
        TaskStatus::Error,
        TaskStatus::HumanResponseNeeded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Interrupted => "interrupted",
            TaskStatus::Idle => "idle",
            TaskStatus::Busy => "busy",
            TaskStatus::Error => "error",
            TaskStatus::HumanResponseNeeded => "human_response_needed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Interrupted => "Interrupted",
            TaskStatus::Idle => "Idle",
            TaskStatus::Busy => "Busy",
            TaskStatus::Error => "Error",
            TaskStatus::HumanResponseNeeded => "Human Response Needed",
        }
    }
}

/// One unit of agent work. Owned by the fetch collaborator; read-only here.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub payload: Value,
}

/// A task plus the interrupts attached to it. The sequence can be empty even
/// when the status is `interrupted`; such records take the generic rendering
/// path while keeping their reported status.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub task: Task,
    #[serde(default)]
    pub interrupts: Vec<Interrupt>,
}

impl TaskRecord {
    pub fn id(&self) -> &str {
        &self.task.id
    }

    pub fn status(&self) -> TaskStatus {
        self.task.status
    }
}

/// One completed fetch result delivered over the feed channel.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub records: Vec<TaskRecord>,
    #[serde(default)]
    pub captured_at: i64,
}

impl Snapshot {
    pub fn contains(&self, task_id: &str) -> bool {
        self.records.iter().any(|record| record.id() == task_id)
    }
}
