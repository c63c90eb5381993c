//! Per-site breadth-first work queue.

use crate::classifier::normalize;
use std::collections::{HashSet, VecDeque};

/// A URL taken off the frontier for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierItem {
    /// URL as discovered
    pub url: String,
    /// Link distance from the seed
    pub depth: u32,
}

/// FIFO queue of `(url, depth)` with visited tracking.
///
/// Enqueue is refused for URLs already accepted, beyond `max_depth`, or once
/// `max_pages` distinct URLs have been accepted, so the queue never holds more
/// than the page budget. Depth is enforced at enqueue only; dequeue re-checks
/// visited and budget.
#[derive(Debug)]
pub struct TraversalFrontier {
    queue: VecDeque<FrontierItem>,
    visited: HashSet<String>,
    accepted: HashSet<String>,
    max_depth: u32,
    max_pages: usize,
}

impl TraversalFrontier {
    /// Start a traversal at `seed` (depth 0).
    #[must_use]
    pub fn new(seed: &str, max_depth: u32, max_pages: usize) -> Self {
        let mut frontier = Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            accepted: HashSet::new(),
            max_depth,
            max_pages,
        };
        frontier.offer(seed, 0);
        frontier
    }

    /// Queue `url` at `depth` unless it is already known or over a limit.
    ///
    /// Returns whether the URL was queued.
    pub fn offer(&mut self, url: &str, depth: u32) -> bool {
        if depth > self.max_depth || self.accepted.len() >= self.max_pages {
            return false;
        }

        let key = normalize(url);
        if self.visited.contains(&key) || !self.accepted.insert(key) {
            return false;
        }

        self.queue.push_back(FrontierItem {
            url: url.to_string(),
            depth,
        });
        true
    }

    /// Take the next URL to process and mark it visited.
    ///
    /// Items that are already visited or over budget are dropped.
    pub fn pop(&mut self) -> Option<FrontierItem> {
        while let Some(item) = self.queue.pop_front() {
            let key = normalize(&item.url);
            if self.visited.contains(&key) || self.visited.len() >= self.max_pages {
                tracing::trace!("Skipping {} at depth {}", item.url, item.depth);
                continue;
            }

            self.visited.insert(key);
            return Some(item);
        }
        None
    }

    /// Whether `url` has already been taken for processing.
    #[must_use]
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(&normalize(url))
    }

    /// Number of URLs taken for processing so far.
    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of URLs waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
