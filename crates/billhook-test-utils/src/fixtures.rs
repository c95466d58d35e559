//! Linked payload types, graph builders, and drop probes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use billhook_arena::RegionError;
use billhook_core::Allocatable;
use billhook_rc::Strong;

/// Shared counter of payload drops.
///
/// Hand a [`DropToken`] to each fixture node; every token bumps the
/// counter from its `Drop` impl, so tests can assert exactly how many
/// payloads were torn down and when.
#[derive(Clone, Default)]
pub struct DropCounter {
    drops: Rc<Cell<usize>>,
}

impl DropCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that bumps this counter when dropped.
    pub fn token(&self) -> DropToken {
        DropToken {
            drops: Rc::clone(&self.drops),
        }
    }

    /// Number of tokens dropped so far.
    pub fn drops(&self) -> usize {
        self.drops.get()
    }
}

/// See [`DropCounter::token`].
pub struct DropToken {
    drops: Rc<Cell<usize>>,
}

impl Drop for DropToken {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

/// A singly-linked node with an interior-mutable link field, so chains
/// can be grown root-first by assigning each new node to the previous
/// node's link.
pub struct ChainNode {
    pub next: RefCell<Option<Strong<ChainNode>>>,
    pub probe: Option<DropToken>,
}

impl Allocatable for ChainNode {}

impl ChainNode {
    pub fn unlinked() -> Self {
        Self {
            next: RefCell::new(None),
            probe: None,
        }
    }

    pub fn probed(counter: &DropCounter) -> Self {
        Self {
            next: RefCell::new(None),
            probe: Some(counter.token()),
        }
    }
}

/// A node with an arbitrary number of children.
pub struct TreeNode {
    pub children: RefCell<Vec<Strong<TreeNode>>>,
    pub probe: Option<DropToken>,
}

impl Allocatable for TreeNode {}

/// Build a chain of `links + 1` nodes: a root plus `links` nodes, each
/// assigned to the previous node's link field (the construction order
/// of the reference micro-benchmark).
///
/// Placement follows the ambient scope: inside an open scope the nodes
/// are arena-resident, otherwise they go to the heap.
pub fn build_chain(links: usize) -> Result<Strong<ChainNode>, RegionError> {
    let root = Strong::new(ChainNode::unlinked())?;
    let mut tail = root.clone();
    for _ in 0..links {
        let node = Strong::new(ChainNode::unlinked())?;
        *tail.next.borrow_mut() = Some(node.clone());
        tail = node;
    }
    Ok(root)
}

/// [`build_chain`], with a probe token in every node.
pub fn build_probed_chain(
    links: usize,
    counter: &DropCounter,
) -> Result<Strong<ChainNode>, RegionError> {
    let root = Strong::new(ChainNode::probed(counter))?;
    let mut tail = root.clone();
    for _ in 0..links {
        let node = Strong::new(ChainNode::probed(counter))?;
        *tail.next.borrow_mut() = Some(node.clone());
        tail = node;
    }
    Ok(root)
}

/// Build a complete tree of the given depth and fanout, with a probe
/// token in every node. A depth of zero is a single leaf.
pub fn build_tree(
    depth: usize,
    fanout: usize,
    counter: &DropCounter,
) -> Result<Strong<TreeNode>, RegionError> {
    let mut children = Vec::new();
    if depth > 0 {
        children.reserve(fanout);
        for _ in 0..fanout {
            children.push(build_tree(depth - 1, fanout, counter)?);
        }
    }
    Strong::new(TreeNode {
        children: RefCell::new(children),
        probe: Some(counter.token()),
    })
}

/// Number of nodes in a complete tree of the given depth and fanout.
pub fn tree_node_count(depth: usize, fanout: usize) -> usize {
    if fanout <= 1 {
        return depth + 1;
    }
    (fanout.pow(depth as u32 + 1) - 1) / (fanout - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_has_expected_length() {
        let root = build_chain(3).unwrap();
        let mut len = 1;
        let mut cursor = root;
        loop {
            let next = cursor.next.borrow().clone();
            match next {
                Some(node) => {
                    len += 1;
                    cursor = node;
                }
                None => break,
            }
        }
        assert_eq!(len, 4);
    }

    #[test]
    fn probed_chain_counts_drops() {
        let counter = DropCounter::new();
        let root = build_probed_chain(5, &counter).unwrap();
        assert_eq!(counter.drops(), 0);
        drop(root);
        assert_eq!(counter.drops(), 6);
    }

    #[test]
    fn tree_node_count_matches_builder() {
        let counter = DropCounter::new();
        let root = build_tree(3, 2, &counter).unwrap();
        drop(root);
        assert_eq!(counter.drops(), tree_node_count(3, 2));
        assert_eq!(tree_node_count(3, 2), 15);
    }
}
