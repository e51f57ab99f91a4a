//! Pure derivations over the task collection.
//!
//! Nothing here holds state; every function is recomputed from the tasks, the
//! view inputs and the current wall-clock time. Calendar days are taken in the
//! time zone of `now`, and a due date counts as due until 23:59:59.999 of that day.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::task::{FilterMode, Task, TaskId};

/// How far ahead a due task becomes a reminder candidate.
pub const REMINDER_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Analytics {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
    pub completion_rate: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    DueIn(i64),
    DueToday,
    Overdue(i64),
}

impl DueStatus {
    pub fn is_overdue(self) -> bool {
        matches!(self, DueStatus::Overdue(_))
    }
}

impl fmt::Display for DueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DueStatus::DueIn(days) => write!(f, "Due in {} {}", days, plural_days(days)),
            DueStatus::DueToday => write!(f, "Due today"),
            DueStatus::Overdue(days) => write!(f, "Overdue by {} {}", days, plural_days(days)),
        }
    }
}

pub fn plural_days(n: i64) -> &'static str {
    if n == 1 {
        "day"
    } else {
        "days"
    }
}

/// Last representable instant of `date`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN))
}

/// Search, then filter by mode, then order: dated tasks by due date ascending,
/// dated before undated, undated newest first. The sort is stable.
pub fn filter_and_sort(tasks: &[Task], search: &str, mode: FilterMode) -> Vec<Task> {
    let needle = search.to_lowercase();
    let mut view: Vec<Task> = tasks
        .iter()
        .filter(|t| t.matches_search(&needle))
        .filter(|t| mode.matches(t))
        .cloned()
        .collect();
    view.sort_by(compare_urgency);
    view
}

fn compare_urgency(a: &Task, b: &Task) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => end_of_day(x).cmp(&end_of_day(y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.id.cmp(&a.id),
    }
}

pub fn compute_analytics(tasks: &[Task]) -> Analytics {
    let total = tasks.len();
    let completed = tasks.iter().filter(|t| t.completed).count();
    let completion_rate = if total == 0 {
        0
    } else {
        (completed as f64 / total as f64 * 100.0).round() as u32
    };
    Analytics {
        total,
        completed,
        incomplete: total - completed,
        completion_rate,
    }
}

pub fn due_today<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> usize {
    let today = now.date_naive();
    tasks
        .iter()
        .filter(|t| !t.completed && t.due_date == Some(today))
        .count()
}

pub fn overdue<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> usize {
    let now = now.naive_local();
    tasks
        .iter()
        .filter(|t| !t.completed)
        .filter_map(|t| t.due_date)
        .filter(|due| end_of_day(*due) < now)
        .count()
}

/// Per-task label: calendar days between today and the due date.
pub fn due_status<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> Option<DueStatus> {
    let due = task.due_date?;
    let days = (due - now.date_naive()).num_days();
    Some(match days.cmp(&0) {
        Ordering::Greater => DueStatus::DueIn(days),
        Ordering::Equal => DueStatus::DueToday,
        Ordering::Less => DueStatus::Overdue(-days),
    })
}

/// Runs of consecutive calendar days with at least one completion. A task's
/// completion day is its due date, or the day it was created when undated.
/// The current streak only counts if it reaches today.
pub fn compute_streaks<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Streaks {
    let tz = now.timezone();
    let days: BTreeSet<NaiveDate> = tasks
        .iter()
        .filter(|t| t.completed)
        .filter_map(|t| {
            t.due_date.or_else(|| {
                tz.timestamp_millis_opt(t.id)
                    .single()
                    .map(|created| created.date_naive())
            })
        })
        .collect();

    let mut running: u32 = 0;
    let mut longest: u32 = 0;
    let mut prev: Option<NaiveDate> = None;
    for day in &days {
        running = match prev {
            Some(p) if (*day - p).num_days() == 1 => running + 1,
            _ => 1,
        };
        longest = longest.max(running);
        prev = Some(*day);
    }

    let current = if days.contains(&now.date_naive()) {
        running
    } else {
        0
    };
    Streaks { current, longest }
}

/// The most urgent incomplete, undismissed task due within the next 24 hours.
pub fn find_reminder_candidate<'a, Tz, F>(
    tasks: &'a [Task],
    is_dismissed: F,
    now: &DateTime<Tz>,
) -> Option<&'a Task>
where
    Tz: TimeZone,
    F: Fn(TaskId) -> bool,
{
    let now = now.naive_local();
    let window = Duration::hours(REMINDER_WINDOW_HOURS);
    tasks
        .iter()
        .filter(|t| !t.completed && !is_dismissed(t.id))
        .filter_map(|t| t.due_date.map(|due| (t, end_of_day(due))))
        .filter(|(_, deadline)| {
            let remaining = *deadline - now;
            remaining > Duration::zero() && remaining <= window
        })
        .min_by_key(|(_, deadline)| *deadline)
        .map(|(t, _)| t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn task(id: TaskId, name: &str, due: Option<NaiveDate>, completed: bool) -> Task {
        Task {
            completed,
            ..Task::new(id, name.to_string(), String::new(), due)
        }
    }

    fn ids(tasks: &[Task]) -> Vec<TaskId> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_sort_dated_first_then_newest_undated() {
        let tasks = vec![
            task(1, "A", Some(date(2024, 2, 1)), false),
            task(100, "B", None, false),
            task(3, "C", Some(date(2024, 1, 15)), false),
            task(200, "D", None, false),
        ];
        let view = filter_and_sort(&tasks, "", FilterMode::All);
        assert_eq!(ids(&view), vec![3, 1, 200, 100]);
    }

    #[test]
    fn test_sort_keeps_input_order_for_equal_due_dates() {
        let due = Some(date(2024, 3, 3));
        let tasks = vec![task(9, "x", due, false), task(2, "y", due, false), task(5, "z", due, false)];
        let view = filter_and_sort(&tasks, "", FilterMode::All);
        assert_eq!(ids(&view), vec![9, 2, 5]);
    }

    #[test]
    fn test_search_then_mode() {
        let mut tasks = vec![
            task(1, "Groceries", None, true),
            task(2, "Gym", None, false),
            task(3, "Taxes", None, false),
        ];
        tasks[2].description = "gather receipts".into();

        assert_eq!(ids(&filter_and_sort(&tasks, "G", FilterMode::All)), vec![3, 2, 1]);
        assert_eq!(ids(&filter_and_sort(&tasks, "g", FilterMode::Completed)), vec![1]);
        assert_eq!(ids(&filter_and_sort(&tasks, "GY", FilterMode::Incomplete)), vec![2]);
        assert!(filter_and_sort(&tasks, "nothing", FilterMode::All).is_empty());
    }

    #[test]
    fn test_extreme_due_dates_do_not_overflow() {
        let now = at(2024, 1, 1, 10, 0);
        let tasks = vec![
            task(1, "far", Some(NaiveDate::MAX), false),
            task(2, "ancient", Some(NaiveDate::MIN), false),
            task(3, "normal", Some(date(2024, 1, 1)), false),
        ];
        assert_eq!(end_of_day(NaiveDate::MAX).date(), NaiveDate::MAX);

        let view = filter_and_sort(&tasks, "", FilterMode::All);
        assert_eq!(ids(&view), vec![2, 3, 1]);
        assert_eq!(overdue(&tasks, &now), 1);
        assert_eq!(due_today(&tasks, &now), 1);
        let candidate = find_reminder_candidate(&tasks, |_| false, &now);
        assert_eq!(candidate.map(|t| t.id), Some(3));
        assert!(due_status(&tasks[0], &now).is_some());
    }

    #[test]
    fn test_analytics_empty_has_zero_rate() {
        assert_eq!(compute_analytics(&[]), Analytics::default());
    }

    #[test]
    fn test_analytics_rounds_rate() {
        let tasks = vec![
            task(1, "a", None, true),
            task(2, "b", None, false),
            task(3, "c", None, false),
        ];
        let analytics = compute_analytics(&tasks);
        assert_eq!(analytics.total, 3);
        assert_eq!(analytics.completed, 1);
        assert_eq!(analytics.incomplete, 2);
        assert_eq!(analytics.completion_rate, 33);

        let two_of_three = vec![task(1, "a", None, true), task(2, "b", None, true), task(3, "c", None, false)];
        assert_eq!(compute_analytics(&two_of_three).completion_rate, 67);
    }

    #[test]
    fn test_due_today_and_overdue_skip_completed() {
        let now = at(2024, 1, 10, 12, 0);
        let tasks = vec![
            task(1, "today", Some(date(2024, 1, 10)), false),
            task(2, "today done", Some(date(2024, 1, 10)), true),
            task(3, "late", Some(date(2024, 1, 9)), false),
            task(4, "late done", Some(date(2024, 1, 1)), true),
            task(5, "later", Some(date(2024, 1, 11)), false),
            task(6, "undated", None, false),
        ];
        assert_eq!(due_today(&tasks, &now), 1);
        assert_eq!(overdue(&tasks, &now), 1);
    }

    #[test]
    fn test_due_status_labels() {
        let now = at(2024, 1, 10, 8, 0);
        let label = |d| due_status(&task(1, "t", Some(d), false), &now).unwrap().to_string();
        assert_eq!(label(date(2024, 1, 11)), "Due in 1 day");
        assert_eq!(label(date(2024, 1, 13)), "Due in 3 days");
        assert_eq!(label(date(2024, 1, 10)), "Due today");
        assert_eq!(label(date(2024, 1, 9)), "Overdue by 1 day");
        assert_eq!(label(date(2024, 1, 5)), "Overdue by 5 days");
        assert!(due_status(&task(1, "t", None, false), &now).is_none());
        assert!(due_status(&task(1, "t", Some(date(2024, 1, 1)), false), &now)
            .unwrap()
            .is_overdue());
    }

    #[test]
    fn test_streak_through_today() {
        let tasks = vec![
            task(1, "a", Some(date(2024, 1, 1)), true),
            task(2, "b", Some(date(2024, 1, 2)), true),
            task(3, "c", Some(date(2024, 1, 3)), true),
        ];
        let streaks = compute_streaks(&tasks, &at(2024, 1, 3, 9, 0));
        assert_eq!(streaks, Streaks { current: 3, longest: 3 });

        let streaks = compute_streaks(&tasks, &at(2024, 1, 5, 9, 0));
        assert_eq!(streaks, Streaks { current: 0, longest: 3 });
    }

    #[test]
    fn test_streak_resets_on_gap_and_ignores_incomplete() {
        let tasks = vec![
            task(1, "a", Some(date(2024, 1, 1)), true),
            task(2, "b", Some(date(2024, 1, 2)), true),
            task(3, "gap", Some(date(2024, 1, 3)), false),
            task(4, "c", Some(date(2024, 1, 4)), true),
            task(5, "dup", Some(date(2024, 1, 4)), true),
        ];
        let streaks = compute_streaks(&tasks, &at(2024, 1, 4, 9, 0));
        assert_eq!(streaks, Streaks { current: 1, longest: 2 });
    }

    #[test]
    fn test_streak_uses_creation_day_when_undated() {
        let created = at(2024, 1, 2, 15, 30).timestamp_millis();
        let tasks = vec![
            task(1, "a", Some(date(2024, 1, 1)), true),
            task(created, "b", None, true),
        ];
        let streaks = compute_streaks(&tasks, &at(2024, 1, 2, 20, 0));
        assert_eq!(streaks, Streaks { current: 2, longest: 2 });
    }

    #[test]
    fn test_streak_empty() {
        let tasks = vec![task(1, "a", Some(date(2024, 1, 1)), false)];
        assert_eq!(compute_streaks(&tasks, &at(2024, 1, 1, 0, 0)), Streaks::default());
    }

    #[test]
    fn test_reminder_picks_due_today_and_respects_dismissal() {
        let now = at(2024, 1, 1, 10, 0);
        let tasks = vec![task(7, "report", Some(date(2024, 1, 1)), false)];

        let candidate = find_reminder_candidate(&tasks, |_| false, &now);
        assert_eq!(candidate.map(|t| t.id), Some(7));

        let candidate = find_reminder_candidate(&tasks, |id| id == 7, &now);
        assert!(candidate.is_none());
    }

    #[test]
    fn test_reminder_window_bounds() {
        let tasks = vec![
            task(1, "tomorrow", Some(date(2024, 1, 2)), false),
            task(2, "past", Some(date(2023, 12, 31)), false),
            task(3, "done", Some(date(2024, 1, 1)), true),
            task(4, "undated", None, false),
        ];
        // 2024-01-02 23:59:59.999 is more than 24h after 2024-01-01 10:00.
        assert!(find_reminder_candidate(&tasks, |_| false, &at(2024, 1, 1, 10, 0)).is_none());
        // At 2024-01-02 00:00 it is within the window.
        let candidate = find_reminder_candidate(&tasks, |_| false, &at(2024, 1, 2, 0, 0));
        assert_eq!(candidate.map(|t| t.id), Some(1));
    }

    #[test]
    fn test_reminder_moves_to_next_after_dismissal() {
        let now = at(2024, 1, 1, 18, 0);
        let tasks = vec![
            task(1, "first", Some(date(2024, 1, 1)), false),
            task(2, "second", Some(date(2024, 1, 1)), false),
        ];
        let candidate = find_reminder_candidate(&tasks, |_| false, &now);
        assert_eq!(candidate.map(|t| t.id), Some(1));

        let candidate = find_reminder_candidate(&tasks, |id| id == 1, &now);
        assert_eq!(candidate.map(|t| t.id), Some(2));
    }
}
