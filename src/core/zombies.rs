//! Tracking of detached children for exeq.
//!
//! Children launched without waiting keep their handle here so the
//! embedding process can inspect or reap them later. The runner only ever
//! adds to this set; pruning is the caller's job, through [Zombies::reap]
//! for finished children or [Zombies::remove] to take a handle back.

use std::process::{Child, ExitStatus};

/// Handles of spawned-but-not-waited children.
#[derive(Debug, Default)]
pub struct Zombies {
    children: Vec<Child>,
}

impl Zombies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a child the runner decided not to wait on.
    pub(crate) fn register(&mut self, child: Child) {
        self.children.push(child);
    }

    /// Process ids of all tracked children, in registration order.
    pub fn pids(&self) -> Vec<u32> {
        self.children.iter().map(Child::id).collect()
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.children.iter().any(|child| child.id() == pid)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Drop every child that has exited, returning pid and status of each.
    ///
    /// Children still running stay tracked. A child whose state cannot be
    /// read stays tracked too, so a transient error never loses a handle.
    pub fn reap(&mut self) -> Vec<(u32, ExitStatus)> {
        let mut reaped = Vec::new();
        self.children.retain_mut(|child| {
            match child.try_wait() {
                Ok(Some(status)) => {
                    reaped.push((child.id(), status));
                    false
                }
                Ok(None) => true,
                Err(_) => true,
            }
        });
        reaped
    }

    /// Take a tracked child's handle back, e.g. to wait on it directly.
    pub fn remove(&mut self, pid: u32) -> Option<Child> {
        let index = self.children.iter().position(|child| child.id() == pid)?;
        Some(self.children.swap_remove(index))
    }
}
