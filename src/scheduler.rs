use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::{Duration, Instant};

/// Handle to a scheduled task, usable for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Entry<T> {
    deadline: Instant,
    seq: u64,
    id: TaskId,
    kind: T,
}

// Min-heap on (deadline, seq): earliest deadline first, insertion order as
// the tie-breaker.
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.deadline, other.seq).cmp(&(self.deadline, self.seq))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

/// Single-threaded timer queue. Every timed activity in the process —
/// blink wake-ups, frame steps, autosave, timeline refresh — is an entry
/// here, drained in deadline order by the one UI loop. No two tasks ever run
/// concurrently, so surface state is never mutated from two timelines.
#[derive(Debug)]
pub struct Scheduler<T> {
    heap: BinaryHeap<Entry<T>>,
    cancelled: HashSet<TaskId>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_seq: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` to fire once, `delay` from now.
    pub fn schedule(&mut self, delay: Duration, kind: T) -> TaskId {
        self.schedule_from(Instant::now(), delay, kind)
    }

    /// Schedule against an explicit clock reading.
    pub fn schedule_from(&mut self, now: Instant, delay: Duration, kind: T) -> TaskId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = TaskId(seq);
        self.heap.push(Entry {
            deadline: now + delay,
            seq,
            id,
            kind,
        });
        id
    }

    /// Stop a pending task from firing. Cancelling an already-fired or
    /// unknown id is a no-op; timers are pure delays, not request timeouts.
    pub fn cancel(&mut self, id: TaskId) {
        self.cancelled.insert(id);
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.cancelled.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Deadline of the earliest live entry, for the host loop's wake-up
    /// request.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        while let Some(entry) = self.heap.peek() {
            if self.cancelled.remove(&entry.id) {
                self.heap.pop();
                continue;
            }
            return Some(entry.deadline);
        }
        None
    }

    /// Pop every task due at `now`, in deadline-then-insertion order.
    pub fn take_due(&mut self, now: Instant) -> Vec<(TaskId, T)> {
        let mut due = Vec::new();
        while let Some(entry) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }
            let entry = self.heap.pop().expect("peeked entry");
            if self.cancelled.remove(&entry.id) {
                continue;
            }
            due.push((entry.id, entry.kind));
        }
        due
    }
}
