/// Virtual-clock task scheduler. Holds repeating tasks and one-shot deferred
/// tasks and hands them back in due order as time is advanced. Nothing here
/// reads a wall clock; the caller decides how far to move time.
///
/// Tasks due at the same instant come out in the order they were (re)armed.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: u64,
    seq: u64,
    entries: Vec<Entry<T>>,
}

#[derive(Debug)]
struct Entry<T> {
    task: T,
    due: u64,
    seq: u64,
    every: Option<u64>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: 0,
            seq: 0,
            entries: Vec::new(),
        }
    }
}

impl<T: Clone + PartialEq> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Runs `task` every `interval` from now on, replacing any repeating entry
    /// for the same task. Zero intervals are treated as one.
    pub fn every(&mut self, task: T, interval: u64) {
        self.entries
            .retain(|e| !(e.every.is_some() && e.task == task));
        let interval = interval.max(1);
        let seq = self.next_seq();
        self.entries.push(Entry {
            task,
            due: self.now + interval,
            seq,
            every: Some(interval),
        });
    }

    /// Changes the period of a repeating task. The next run is measured from
    /// its previous run. Returns false if the task is not repeating.
    pub fn set_interval(&mut self, task: &T, interval: u64) -> bool {
        let now = self.now;
        let interval = interval.max(1);
        match self
            .entries
            .iter_mut()
            .find(|e| e.every.is_some() && e.task == *task)
        {
            Some(entry) => {
                let last = entry.due - entry.every.unwrap_or(0);
                entry.due = (last + interval).max(now);
                entry.every = Some(interval);
                true
            }
            None => false,
        }
    }

    /// Runs `task` once, `delay` after now.
    pub fn after(&mut self, delay: u64, task: T) {
        let seq = self.next_seq();
        self.entries.push(Entry {
            task,
            due: self.now + delay,
            seq,
            every: None,
        });
    }

    pub fn cancel(&mut self, task: &T) {
        self.entries.retain(|e| e.task != *task);
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub fn interval(&self, task: &T) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.task == *task)
            .and_then(|e| e.every)
    }

    /// When `task` next runs, if it is scheduled at all.
    pub fn due_at(&self, task: &T) -> Option<u64> {
        self.entries
            .iter()
            .filter(|e| e.task == *task)
            .map(|e| e.due)
            .min()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Takes the earliest task due at or before `until`, moving the clock to
    /// its due time. Repeating tasks are re-armed before being returned.
    pub fn pop_due(&mut self, until: u64) -> Option<T> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= until)
            .min_by_key(|(_, e)| (e.due, e.seq))
            .map(|(i, _)| i)?;

        self.now = self.now.max(self.entries[idx].due);
        match self.entries[idx].every {
            Some(interval) => {
                let seq = self.next_seq();
                let entry = &mut self.entries[idx];
                entry.due += interval;
                entry.seq = seq;
                Some(entry.task.clone())
            }
            None => Some(self.entries.swap_remove(idx).task),
        }
    }

    /// Moves the clock to `until` once everything due has been taken.
    pub fn finish(&mut self, until: u64) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Task {
        Fast,
        Slow,
        Once(u8),
    }

    fn drain(s: &mut Scheduler<Task>, until: u64) -> Vec<(u64, Task)> {
        let mut out = Vec::new();
        while let Some(t) = s.pop_due(until) {
            out.push((s.now(), t));
        }
        s.finish(until);
        out
    }

    #[test]
    fn repeating_tasks_interleave_by_due_time() {
        let mut s = Scheduler::new();
        s.every(Task::Fast, 100);
        s.every(Task::Slow, 250);
        let fired = drain(&mut s, 500);
        assert_eq!(
            fired,
            vec![
                (100, Task::Fast),
                (200, Task::Fast),
                (250, Task::Slow),
                (300, Task::Fast),
                (400, Task::Fast),
                (500, Task::Slow),
                (500, Task::Fast),
            ]
        );
        assert_eq!(s.now(), 500);
    }

    #[test]
    fn nothing_fires_before_its_time() {
        let mut s = Scheduler::new();
        s.every(Task::Fast, 100);
        assert!(drain(&mut s, 99).is_empty());
        assert_eq!(s.now(), 99);
        assert_eq!(drain(&mut s, 100), vec![(100, Task::Fast)]);
    }

    #[test]
    fn one_shot_fires_once() {
        let mut s = Scheduler::new();
        s.after(30, Task::Once(1));
        assert_eq!(s.due_at(&Task::Once(1)), Some(30));
        assert_eq!(drain(&mut s, 1000), vec![(30, Task::Once(1))]);
        assert!(s.is_empty());
    }

    #[test]
    fn same_instant_keeps_scheduling_order() {
        let mut s = Scheduler::new();
        s.after(10, Task::Once(2));
        s.after(10, Task::Once(1));
        s.after(5, Task::Once(3));
        let order: Vec<Task> = drain(&mut s, 10).into_iter().map(|(_, t)| t).collect();
        assert_eq!(order, vec![Task::Once(3), Task::Once(2), Task::Once(1)]);
    }

    #[test]
    fn set_interval_measures_from_last_run() {
        let mut s = Scheduler::new();
        s.every(Task::Fast, 180);
        assert_eq!(drain(&mut s, 200), vec![(180, Task::Fast)]);
        assert!(s.set_interval(&Task::Fast, 80));
        assert_eq!(s.interval(&Task::Fast), Some(80));
        assert_eq!(drain(&mut s, 340), vec![(260, Task::Fast), (340, Task::Fast)]);
        assert!(!s.set_interval(&Task::Slow, 10));
    }

    #[test]
    fn set_interval_never_schedules_in_the_past() {
        let mut s = Scheduler::new();
        s.every(Task::Fast, 500);
        s.finish(450);
        s.set_interval(&Task::Fast, 100);
        assert_eq!(s.due_at(&Task::Fast), Some(450));
    }

    #[test]
    fn every_replaces_previous_period() {
        let mut s = Scheduler::new();
        s.every(Task::Fast, 100);
        s.every(Task::Fast, 300);
        assert_eq!(drain(&mut s, 600), vec![(300, Task::Fast), (600, Task::Fast)]);
    }

    #[test]
    fn zero_interval_cannot_spin() {
        let mut s = Scheduler::new();
        s.every(Task::Fast, 0);
        assert_eq!(drain(&mut s, 3).len(), 3);
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut s = Scheduler::new();
        s.every(Task::Fast, 10);
        s.after(5, Task::Once(9));
        s.cancel_all();
        assert!(drain(&mut s, 100).is_empty());
        assert!(s.is_empty());
    }

    #[test]
    fn cancel_removes_only_matching_task() {
        let mut s = Scheduler::new();
        s.after(5, Task::Once(1));
        s.after(5, Task::Once(2));
        s.cancel(&Task::Once(1));
        assert_eq!(drain(&mut s, 10), vec![(5, Task::Once(2))]);
    }
}
