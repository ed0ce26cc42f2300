// ──────────────────────────────────────────────
// Node: binary tree over a power-of-two span
// ──────────────────────────────────────────────

/// A leaf's flag is authoritative for its whole span. A split always has at
/// least one marked position below it, and never two marked leaf children:
/// those are collapsed on the way back up from `mark`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Leaf(bool),
    Split { left: Box<Node>, right: Box<Node> },
}

impl Node {
    /// Mark `[start, end)` inside this node's span `[lo, hi)`.
    pub(crate) fn mark(&mut self, lo: usize, hi: usize, start: usize, end: usize) {
        if end <= lo || hi <= start {
            return;
        }
        if let Node::Leaf(true) = self {
            return;
        }
        if start <= lo && hi <= end {
            *self = Node::Leaf(true);
            return;
        }

        if let Node::Leaf(false) = self {
            *self = Node::Split {
                left: Box::new(Node::Leaf(false)),
                right: Box::new(Node::Leaf(false)),
            };
        }

        let mid = lo + (hi - lo) / 2;
        if let Node::Split { left, right } = self {
            left.mark(lo, mid, start, end);
            right.mark(mid, hi, start, end);
            if **left == Node::Leaf(true) && **right == Node::Leaf(true) {
                *self = Node::Leaf(true);
            }
        }
    }

    /// True if any position of `[start, end)` inside `[lo, hi)` is marked.
    pub(crate) fn check(&self, lo: usize, hi: usize, start: usize, end: usize) -> bool {
        if end <= lo || hi <= start {
            return false;
        }
        match self {
            Node::Leaf(marked) => *marked,
            Node::Split { left, right } => {
                let mid = lo + (hi - lo) / 2;
                left.check(lo, mid, start, end) || right.check(mid, hi, start, end)
            }
        }
    }

    /// Number of nodes in this subtree.
    #[cfg(test)]
    pub(crate) fn node_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Split { left, right } => 1 + left.node_count() + right.node_count(),
        }
    }

    /// Collect maximal marked runs, merging neighbours across leaf borders.
    pub(crate) fn marked_runs(&self, lo: usize, hi: usize, out: &mut Vec<(usize, usize)>) {
        match self {
            Node::Leaf(false) => {}
            Node::Leaf(true) => match out.last_mut() {
                Some(last) if last.1 == lo => last.1 = hi,
                _ => out.push((lo, hi)),
            },
            Node::Split { left, right } => {
                let mid = lo + (hi - lo) / 2;
                left.marked_runs(lo, mid, out);
                right.marked_runs(mid, hi, out);
            }
        }
    }
}
