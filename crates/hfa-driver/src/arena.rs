// SPDX-License-Identifier: AGPL-3.0-only

//! Recyclable job objects
//!
//! Every job a device will ever use is created at attach time and parked on
//! the inactive queue. The dispatch loop claims jobs with
//! [`JobArena::acquire`] and hands them back with [`JobArena::release`];
//! nothing is allocated or freed after setup.
//!
//! ## Layout
//!
//! ```text
//! links: [ job 0 | job 1 | ... | job N-1 | ACTIVE head | INACTIVE head ]
//!                                              ↑              ↑
//!                         circular, doubly linked, self-referential when empty
//! ```
//!
//! Both queues are threaded through one slot array by index. A job is on
//! exactly one queue at all times, tracked by its [`Queue`] tag, so
//! membership tests, insertion and removal are all O(1).

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{HfaError, Result};

static NEXT_ARENA: AtomicU32 = AtomicU32::new(0);

/// Handle to a job, valid only in the arena that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId {
    arena: u32,
    index: usize,
}

impl JobId {
    /// Position of the job in its arena
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// The two queues partitioning an arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Queue {
    /// Claimed by the dispatch loop
    Active,
    /// Free, ready to be claimed
    Inactive,
}

/// Job payload, owned by the dispatch loop
///
/// The arena never reads or clears these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Job {
    /// Chip the work was sent to
    pub chip: u32,
    /// Core within the chip
    pub core: u32,
    /// Sequence number the device will report on completion
    pub sequence: u16,
    /// Work buffer slot holding the work item
    pub work_slot: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Link {
    prev: usize,
    next: usize,
}

impl Link {
    const fn detached(at: usize) -> Self {
        Self { prev: at, next: at }
    }
}

/// Fixed pool of jobs split into active and inactive queues
#[derive(Debug)]
pub struct JobArena {
    id: u32,
    jobs: Vec<Job>,
    queue: Vec<Queue>,
    links: Vec<Link>,
    active_count: usize,
    inactive_count: usize,
}

impl JobArena {
    /// Create exactly `count` jobs, all on the inactive queue in creation order
    ///
    /// # Errors
    ///
    /// Returns `HfaError::AllocationFailed` if the pool cannot be allocated.
    /// No partial pool is ever returned.
    pub fn allocate(count: usize) -> Result<Self> {
        let nodes = count
            .checked_add(2)
            .ok_or(HfaError::allocation_failed("job entries", count))?;

        let mut jobs: Vec<Job> = Vec::new();
        let mut queue: Vec<Queue> = Vec::new();
        let mut links: Vec<Link> = Vec::new();
        jobs.try_reserve_exact(count)
            .and_then(|()| queue.try_reserve_exact(count))
            .and_then(|()| links.try_reserve_exact(nodes))
            .map_err(|_| HfaError::allocation_failed("job entries", count))?;

        jobs.resize_with(count, Job::default);
        queue.resize(count, Queue::Inactive);
        links.extend((0..nodes).map(Link::detached));

        let mut arena = Self {
            id: NEXT_ARENA.fetch_add(1, Ordering::Relaxed),
            jobs,
            queue,
            links,
            active_count: 0,
            inactive_count: count,
        };
        let head = arena.head(Queue::Inactive);
        for node in 0..count {
            arena.link_tail(head, node);
        }

        tracing::debug!("Allocated {count} job entries");
        Ok(arena)
    }

    /// Total number of jobs (fixed for the lifetime of the arena)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.jobs.len()
    }

    /// Jobs currently claimed
    #[must_use]
    pub const fn active_count(&self) -> usize {
        self.active_count
    }

    /// Jobs free to claim
    #[must_use]
    pub const fn inactive_count(&self) -> usize {
        self.inactive_count
    }

    /// Claim the oldest free job and put it on the active queue
    ///
    /// Returns `None` when every job is active. This is the backpressure
    /// signal, not a fault; neither queue changes.
    pub fn acquire(&mut self) -> Option<JobId> {
        let node = self.pop_front(Queue::Inactive)?;
        let head = self.head(Queue::Active);
        self.link_tail(head, node);
        self.queue[node] = Queue::Active;
        self.inactive_count -= 1;
        self.active_count += 1;
        Some(self.job_id(node))
    }

    /// Return an active job to the tail of the inactive queue
    ///
    /// Job contents are left as the caller set them.
    ///
    /// # Errors
    ///
    /// Returns `HfaError::ForeignJob` for an id issued by another arena,
    /// `HfaError::JobOutOfRange` for an index past the end and
    /// `HfaError::JobNotActive` if the job is already free. The arena is
    /// unchanged on error.
    pub fn release(&mut self, job: JobId) -> Result<()> {
        let node = self.check(job)?;
        if self.queue[node] != Queue::Active {
            return Err(HfaError::JobNotActive { job: node });
        }
        self.unlink(node);
        let head = self.head(Queue::Inactive);
        self.link_tail(head, node);
        self.queue[node] = Queue::Inactive;
        self.active_count -= 1;
        self.inactive_count += 1;
        Ok(())
    }

    /// Which queue a job is on, `None` for a foreign id
    #[must_use]
    pub fn queue_of(&self, job: JobId) -> Option<Queue> {
        self.check(job).ok().map(|node| self.queue[node])
    }

    /// Shared access to a job's payload
    #[must_use]
    pub fn job(&self, job: JobId) -> Option<&Job> {
        let node = self.check(job).ok()?;
        Some(&self.jobs[node])
    }

    /// Mutable access to a job's payload
    pub fn job_mut(&mut self, job: JobId) -> Option<&mut Job> {
        let node = self.check(job).ok()?;
        Some(&mut self.jobs[node])
    }

    /// Walk one queue from head to tail
    pub fn iter(&self, queue: Queue) -> QueueIter<'_> {
        let head = self.head(queue);
        QueueIter {
            arena: self,
            head,
            cursor: self.links[head].next,
        }
    }

    const fn job_id(&self, node: usize) -> JobId {
        JobId {
            arena: self.id,
            index: node,
        }
    }

    fn check(&self, job: JobId) -> Result<usize> {
        if job.arena != self.id {
            return Err(HfaError::ForeignJob { job: job.index });
        }
        if job.index < self.jobs.len() {
            Ok(job.index)
        } else {
            Err(HfaError::JobOutOfRange {
                job: job.index,
                capacity: self.jobs.len(),
            })
        }
    }

    fn head(&self, queue: Queue) -> usize {
        match queue {
            Queue::Active => self.jobs.len(),
            Queue::Inactive => self.jobs.len() + 1,
        }
    }

    fn link_tail(&mut self, head: usize, node: usize) {
        let last = self.links[head].prev;
        self.links[node] = Link {
            prev: last,
            next: head,
        };
        self.links[last].next = node;
        self.links[head].prev = node;
    }

    fn unlink(&mut self, node: usize) {
        let Link { prev, next } = self.links[node];
        self.links[prev].next = next;
        self.links[next].prev = prev;
        self.links[node] = Link::detached(node);
    }

    fn pop_front(&mut self, queue: Queue) -> Option<usize> {
        let head = self.head(queue);
        let first = self.links[head].next;
        if first == head {
            return None;
        }
        self.unlink(first);
        Some(first)
    }
}

/// Iterator over one queue, head to tail
#[derive(Debug)]
pub struct QueueIter<'a> {
    arena: &'a JobArena,
    head: usize,
    cursor: usize,
}

impl Iterator for QueueIter<'_> {
    type Item = JobId;

    fn next(&mut self) -> Option<JobId> {
        if self.cursor == self.head {
            return None;
        }
        let node = self.cursor;
        self.cursor = self.arena.links[node].next;
        Some(self.arena.job_id(node))
    }
}
