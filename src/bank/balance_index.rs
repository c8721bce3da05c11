//! Balance-ordered binary search tree used for range queries.
//!
//! Each account is keyed by its balance at the moment it was inserted. The tree is
//! never re-keyed, so after a balance changes the index describes the past until it
//! is rebuilt. No balancing is done; sorted insertion degrades to a list.
use crate::bank::{AccountNumber, Money};

#[derive(Debug, Clone)]
struct Node {
    key: Money,
    account: AccountNumber,
    left: Option<usize>,
    right: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct BalanceIndex {
    nodes: Vec<Node>,
}

impl BalanceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes `account` under `balance`. Strictly smaller keys go left, equal or greater go right.
    pub fn insert(&mut self, account: AccountNumber, balance: Money) {
        let index = self.nodes.len();
        self.nodes.push(Node {
            key: balance,
            account,
            left: None,
            right: None,
        });
        if index == 0 {
            return;
        }

        let mut cursor = 0;
        loop {
            let node = &mut self.nodes[cursor];
            let child = if balance < node.key {
                &mut node.left
            } else {
                &mut node.right
            };
            match *child {
                Some(next) => cursor = next,
                None => {
                    *child = Some(index);
                    return;
                }
            }
        }
    }

    /// Returns every indexed account whose key lies in `[low, high]`, in ascending key order.
    pub fn search_range(&self, low: Money, high: Money) -> Vec<&AccountNumber> {
        let mut result = Vec::new();
        if !self.nodes.is_empty() && low <= high {
            self.collect_range(0, low, high, &mut result);
        }
        result
    }

    fn collect_range<'a>(
        &'a self,
        index: usize,
        low: Money,
        high: Money,
        result: &mut Vec<&'a AccountNumber>,
    ) {
        let node = &self.nodes[index];
        if node.key >= low {
            if let Some(left) = node.left {
                self.collect_range(left, low, high, result);
            }
        }
        if low <= node.key && node.key <= high {
            result.push(&node.account);
        }
        if node.key <= high {
            if let Some(right) = node.right {
                self.collect_range(right, low, high, result);
            }
        }
    }

    /// Drops every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Height of the tree, counting the root as 1.
    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[Node], index: Option<usize>) -> usize {
            match index {
                Some(i) => 1 + depth_of(nodes, nodes[i].left).max(depth_of(nodes, nodes[i].right)),
                None => 0,
            }
        }
        depth_of(&self.nodes, (!self.nodes.is_empty()).then_some(0))
    }
}
