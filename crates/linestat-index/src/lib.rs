// Compressed interval index: boolean marks over a large integer span,
// stored as a binary tree whose fully-marked subtrees collapse to one leaf.

mod node;
mod tests;

use node::Node;

// ──────────────────────────────────────────────
// CompressedIndex
// ──────────────────────────────────────────────

pub struct CompressedIndex {
    root: Node,
    capacity: usize,
}

impl CompressedIndex {
    /// Create an index over `[0, capacity)`, rounded up to a power of two.
    pub fn new(capacity: usize) -> Self {
        Self {
            root: Node::Leaf(false),
            capacity: capacity.max(1).next_power_of_two(),
        }
    }

    /// Build an index with every line of `lines` marked.
    pub fn from_lines(capacity: usize, lines: impl IntoIterator<Item = usize>) -> Self {
        let mut index = Self::new(capacity);
        for line in lines {
            index.mark(line, line + 1);
        }
        index
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Mark every position in `[start, end)`. Out-of-range parts are dropped.
    pub fn mark(&mut self, start: usize, end: usize) {
        let (start, end) = self.clamp(start, end);
        if start >= end {
            return;
        }
        self.root.mark(0, self.capacity, start, end);
    }

    /// True iff some position in `[start, end)` is marked.
    pub fn check(&self, start: usize, end: usize) -> bool {
        let (start, end) = self.clamp(start, end);
        if start >= end {
            return false;
        }
        self.root.check(0, self.capacity, start, end)
    }

    pub fn is_empty(&self) -> bool {
        self.root == Node::Leaf(false)
    }

    /// True when the whole span is marked.
    pub fn is_full(&self) -> bool {
        self.root == Node::Leaf(true)
    }

    pub fn clear(&mut self) {
        self.root = Node::Leaf(false);
    }

    /// Maximal marked runs in ascending order.
    pub fn marked_runs(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        self.root.marked_runs(0, self.capacity, &mut out);
        out
    }

    #[cfg(test)]
    pub(crate) fn node_count(&self) -> usize {
        self.root.node_count()
    }

    fn clamp(&self, start: usize, end: usize) -> (usize, usize) {
        (start.min(self.capacity), end.min(self.capacity))
    }
}
