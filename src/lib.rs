pub mod app;
pub mod config;
pub mod derive;
pub mod logging;
pub mod reminder;
pub mod storage;
pub mod store;
pub mod task;
pub mod timer;
pub mod ui;
pub mod undo;

pub use app::{Action, App, Clock, Effect, ViewModel};
pub use storage::{FileSlot, MemorySlot, Slot, StorageError};
pub use store::TaskStore;
pub use task::{FilterMode, Task, TaskId};
