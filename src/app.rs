//! Application state and the single update boundary.
//!
//! Every UI event becomes an [`Action`] passed to [`App::update`]; the UI then
//! asks for a fresh [`ViewModel`], which is derived from scratch each time.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local, NaiveDate};

use crate::config::Settings;
use crate::derive::{self, Analytics, DueStatus, Streaks};
use crate::reminder::Dismissals;
use crate::store::{TaskStore, Transition};
use crate::task::{FilterMode, Task, TaskId};
use crate::timer::Timers;
use crate::undo::UndoWindow;

/// Monotonic time drives timers; wall time drives ids and calendar days.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    pub instant: Instant,
    pub wall: DateTime<Local>,
}

impl Clock {
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Local::now(),
        }
    }

    pub fn advance(&self, by: Duration) -> Self {
        Self {
            instant: self.instant + by,
            wall: self.wall
                + chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add {
        name: String,
        description: String,
        due_date: Option<NaiveDate>,
    },
    Toggle(TaskId),
    Delete(TaskId),
    Undo,
    SetFilter(FilterMode),
    SetSearch(String),
    DismissReminder,
    MarkReminderComplete,
    Tick,
}

/// Side effects for the rendering surface to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Celebrate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub task: Task,
    pub due_status: Option<DueStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderBanner {
    pub id: TaskId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub rows: Vec<TaskRow>,
    pub analytics: Analytics,
    pub due_today: usize,
    pub overdue: usize,
    pub streaks: Streaks,
    pub filter: FilterMode,
    pub search: String,
    pub pending_undo: Option<String>,
    pub reminder: Option<ReminderBanner>,
}

pub struct App {
    store: TaskStore,
    filter: FilterMode,
    search: String,
    dismissals: Dismissals,
    undo: UndoWindow,
    timers: Timers,
    undo_timeout: Duration,
}

impl App {
    pub fn new(store: TaskStore, settings: &Settings) -> Self {
        Self {
            store,
            filter: FilterMode::default(),
            search: String::new(),
            dismissals: Dismissals::new(),
            undo: UndoWindow::default(),
            timers: Timers::new(),
            undo_timeout: settings.undo_timeout(),
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn dismissals(&self) -> &Dismissals {
        &self.dismissals
    }

    pub fn pending_undo(&self) -> Option<&Task> {
        self.undo.pending_task()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Timers that are already due fire before the action is applied, so an
    /// undo that arrives after the deadline finds nothing to restore.
    pub fn update(&mut self, action: Action, clock: &Clock) -> Vec<Effect> {
        self.expire_due(clock.instant);
        let mut effects = Vec::new();
        match action {
            Action::Add {
                name,
                description,
                due_date,
            } => {
                self.store
                    .add(&name, &description, due_date, clock.wall.timestamp_millis());
            }
            Action::Toggle(id) => self.toggle(id, &mut effects),
            Action::Delete(id) => {
                if let Some(task) = self.store.delete(id) {
                    self.undo
                        .begin(task, &mut self.timers, clock.instant, self.undo_timeout);
                }
            }
            Action::Undo => {
                if let Some(task) = self.undo.undo(&mut self.timers) {
                    self.store.restore(task);
                }
            }
            Action::SetFilter(mode) => self.filter = mode,
            Action::SetSearch(text) => self.search = text,
            Action::DismissReminder => {
                if let Some(id) = self.reminder_candidate(&clock.wall).map(|t| t.id) {
                    self.dismissals.dismiss(id);
                }
            }
            Action::MarkReminderComplete => {
                if let Some(id) = self.reminder_candidate(&clock.wall).map(|t| t.id) {
                    self.toggle(id, &mut effects);
                    self.dismissals.dismiss(id);
                }
            }
            Action::Tick => {}
        }
        effects
    }

    fn expire_due(&mut self, now: Instant) {
        for handle in self.timers.fire_due(now) {
            if let Some(task) = self.undo.expire(handle) {
                tracing::info!(target: "tasktally::app", id = task.id, "Task removed permanently");
            }
        }
    }

    fn toggle(&mut self, id: TaskId, effects: &mut Vec<Effect>) {
        if let Some(Transition::Completed) = self.store.toggle(id) {
            effects.push(Effect::Celebrate);
        }
    }

    fn reminder_candidate(&self, now: &DateTime<Local>) -> Option<&Task> {
        derive::find_reminder_candidate(self.store.tasks(), |id| self.dismissals.contains(id), now)
    }

    /// Analytics and streaks follow the filtered view; the reminder looks at every task.
    pub fn view(&self, clock: &Clock) -> ViewModel {
        let now = &clock.wall;
        let filtered = derive::filter_and_sort(self.store.tasks(), &self.search, self.filter);

        let analytics = derive::compute_analytics(&filtered);
        let due_today = derive::due_today(&filtered, now);
        let overdue = derive::overdue(&filtered, now);
        let streaks = derive::compute_streaks(&filtered, now);
        let reminder = self.reminder_candidate(now).map(|t| ReminderBanner {
            id: t.id,
            name: t.name.clone(),
        });

        let rows = filtered
            .into_iter()
            .map(|task| TaskRow {
                due_status: derive::due_status(&task, now),
                task,
            })
            .collect();

        ViewModel {
            rows,
            analytics,
            due_today,
            overdue,
            streaks,
            filter: self.filter,
            search: self.search.clone(),
            pending_undo: self
                .undo
                .pending_task()
                .filter(|_| self.undo.deadline().is_some_and(|d| clock.instant < d))
                .map(|t| t.name.clone()),
            reminder,
        }
    }
}
