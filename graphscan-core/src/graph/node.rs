//! Node storage for the proximity graph.
//!
//! Keeps the ordered neighbour list alongside a membership set so repeated
//! insertions are rejected in constant time.

use std::collections::HashSet;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Node {
    neighbours: Vec<usize>,
    members: HashSet<usize>,
}

impl Node {
    pub(crate) fn neighbours(&self) -> &[usize] {
        &self.neighbours
    }

    pub(crate) fn degree(&self) -> usize {
        self.neighbours.len()
    }

    pub(crate) fn contains(&self, target: usize) -> bool {
        self.members.contains(&target)
    }

    /// Appends `target` unless it is already present.
    pub(crate) fn insert(&mut self, target: usize) -> bool {
        if !self.members.insert(target) {
            return false;
        }
        self.neighbours.push(target);
        true
    }

    pub(crate) fn from_ordered(neighbours: Vec<usize>) -> Self {
        let members = neighbours.iter().copied().collect();
        Self {
            neighbours,
            members,
        }
    }
}
