pub mod interrupt;
pub mod response;
pub mod task;

pub use interrupt::{ActionRequest, Interrupt, InterruptConfig};
pub use response::HumanResponse;
pub use task::{Snapshot, Task, TaskRecord, TaskStatus};
