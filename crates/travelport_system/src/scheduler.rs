//! Cancellable delayed tasks.
//!
//! The host drives time; [`DelayedTasks`] only remembers what is due at which
//! tick. Every scheduled task gets a [`TaskHandle`] so it can be withdrawn if
//! the player or port it refers to changes before it fires.

use std::collections::{BTreeMap, HashMap};

/// Handle of a scheduled task, valid until the task fires or is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u64);

/// Tasks of type `T` ordered by due tick, then by scheduling order.
#[derive(Debug)]
pub struct DelayedTasks<T> {
    next_handle: u64,
    due: BTreeMap<(u64, TaskHandle), T>,
    due_at: HashMap<TaskHandle, u64>,
}

impl<T> Default for DelayedTasks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DelayedTasks<T> {
    pub fn new() -> Self {
        Self {
            next_handle: 0,
            due: BTreeMap::new(),
            due_at: HashMap::new(),
        }
    }

    /// Schedules `task` to fire `delay` ticks after `now`.
    pub fn schedule(&mut self, now: u64, delay: u64, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        let at = now.saturating_add(delay);
        self.due.insert((at, handle), task);
        self.due_at.insert(handle, at);
        handle
    }

    /// Withdraws a pending task, handing it back.
    pub fn cancel(&mut self, handle: TaskHandle) -> Option<T> {
        let at = self.due_at.remove(&handle)?;
        self.due.remove(&(at, handle))
    }

    pub fn get(&self, handle: TaskHandle) -> Option<&T> {
        let at = self.due_at.get(&handle)?;
        self.due.get(&(*at, handle))
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.due_at.contains_key(&handle)
    }

    /// Removes and returns every task due at or before `now`, in due order.
    pub fn take_due(&mut self, now: u64) -> Vec<T> {
        let later = match now.checked_add(1) {
            Some(bound) => self.due.split_off(&(bound, TaskHandle(0))),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.due, later);
        due.into_iter()
            .map(|((_, handle), task)| {
                self.due_at.remove(&handle);
                task
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.due.len()
    }

    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_due_in_order() {
        let mut tasks = DelayedTasks::new();
        tasks.schedule(10, 5, "late");
        tasks.schedule(10, 0, "now");
        tasks.schedule(10, 2, "soon");
        tasks.schedule(10, 2, "soon too");

        assert_eq!(tasks.take_due(9), Vec::<&str>::new());
        assert_eq!(tasks.take_due(12), vec!["now", "soon", "soon too"]);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks.take_due(100), vec!["late"]);
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut tasks = DelayedTasks::new();
        let keep = tasks.schedule(0, 1, 1);
        let drop = tasks.schedule(0, 1, 2);

        assert_eq!(tasks.get(drop), Some(&2));
        assert_eq!(tasks.cancel(drop), Some(2));
        assert_eq!(tasks.cancel(drop), None);
        assert!(!tasks.is_pending(drop));
        assert!(tasks.is_pending(keep));

        assert_eq!(tasks.take_due(1), vec![1]);
        assert!(!tasks.is_pending(keep));
        assert_eq!(tasks.cancel(keep), None);
    }

    #[test]
    fn test_saturating_due_time() {
        let mut tasks = DelayedTasks::new();
        tasks.schedule(u64::MAX - 1, 10, "edge");
        assert_eq!(tasks.take_due(u64::MAX), vec!["edge"]);
    }
}
