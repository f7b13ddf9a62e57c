// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Output layers and k-best label search.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::args::LossKind;
use super::matrix::DenseMatrix;

const SIGMOID_TABLE_SIZE: usize = 512;
const MAX_SIGMOID: f32 = 8.0;
const LOG_EPSILON: f32 = 1e-5;

fn std_log(x: f32) -> f32 {
    (x + LOG_EPSILON).ln()
}

/// Heap entry ordered so the heap top is the weakest candidate.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.index.cmp(&other.index))
    }
}

pub(super) struct KBest {
    k: usize,
    heap: BinaryHeap<Candidate>,
}

impl KBest {
    pub fn new(k: usize) -> Self {
        Self { k, heap: BinaryHeap::with_capacity(k.saturating_add(1).min(4096)) }
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() == self.k
    }

    pub fn weakest(&self) -> Option<f32> {
        self.heap.peek().map(|c| c.score)
    }

    pub fn push(&mut self, score: f32, index: usize) {
        self.heap.push(Candidate { score, index });
        if self.heap.len() > self.k {
            self.heap.pop();
        }
    }

    /// Candidates by descending score, ties by ascending index.
    pub fn into_sorted(self) -> Vec<(f32, usize)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| (c.score, c.index))
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    left: Option<usize>,
    right: Option<usize>,
    count: i64,
}

/// Huffman tree over label frequencies, built the way training builds it.
#[derive(Debug)]
struct HuffmanTree {
    nodes: Vec<Node>,
    leaves: usize,
}

impl HuffmanTree {
    fn build(counts: &[i64]) -> Self {
        let osz = counts.len();
        if osz == 0 {
            return Self { nodes: Vec::new(), leaves: 0 };
        }
        let mut nodes = vec![Node { left: None, right: None, count: i64::MAX }; 2 * osz - 1];
        for (node, count) in nodes.iter_mut().zip(counts) {
            node.count = *count;
        }
        // counts arrive sorted descending, so leaves are consumed from the back
        let mut leaf = osz as isize - 1;
        let mut next = osz;
        for i in osz..2 * osz - 1 {
            let mut mini = [0usize; 2];
            for slot in mini.iter_mut() {
                if leaf >= 0 && nodes[leaf as usize].count < nodes[next].count {
                    *slot = leaf as usize;
                    leaf -= 1;
                } else {
                    *slot = next;
                    next += 1;
                }
            }
            nodes[i].left = Some(mini[0]);
            nodes[i].right = Some(mini[1]);
            nodes[i].count = nodes[mini[0]].count.saturating_add(nodes[mini[1]].count);
        }
        Self { nodes, leaves: osz }
    }

    fn root(&self) -> Option<usize> {
        self.nodes.len().checked_sub(1)
    }
}

enum OutputLayer {
    Softmax,
    Sigmoid,
    Tree(HuffmanTree),
}

/// Precomputed sigmoid table plus the output layer used for prediction.
pub(crate) struct Loss {
    layer: OutputLayer,
    sigmoid_table: Vec<f32>,
}

impl Loss {
    pub fn new(kind: LossKind, label_counts: &[i64]) -> Self {
        let layer = match kind {
            LossKind::Softmax => OutputLayer::Softmax,
            LossKind::NegativeSampling | LossKind::OneVsAll => OutputLayer::Sigmoid,
            LossKind::HierarchicalSoftmax => OutputLayer::Tree(HuffmanTree::build(label_counts)),
        };
        let sigmoid_table = (0..=SIGMOID_TABLE_SIZE)
            .map(|i| {
                let x = (i as f32 * 2.0 * MAX_SIGMOID) / SIGMOID_TABLE_SIZE as f32 - MAX_SIGMOID;
                1.0 / (1.0 + (-x).exp())
            })
            .collect();
        Self { layer, sigmoid_table }
    }

    fn sigmoid(&self, x: f32) -> f32 {
        if x < -MAX_SIGMOID {
            0.0
        } else if x > MAX_SIGMOID {
            1.0
        } else {
            let i = ((x + MAX_SIGMOID) * SIGMOID_TABLE_SIZE as f32 / MAX_SIGMOID / 2.0) as usize;
            self.sigmoid_table[i.min(SIGMOID_TABLE_SIZE)]
        }
    }

    /// Up to `k` labels whose probability is at least `threshold`, as
    /// (log-probability, label index) pairs in descending order.
    pub fn predict(&self, wo: &DenseMatrix, hidden: &[f32], k: usize, threshold: f32) -> Vec<(f32, usize)> {
        if k == 0 {
            return Vec::new();
        }
        let mut best = KBest::new(k);
        match &self.layer {
            OutputLayer::Softmax => {
                let output = self.softmax(wo, hidden);
                find_k_best(&mut best, &output, threshold);
            }
            OutputLayer::Sigmoid => {
                let output: Vec<f32> = (0..wo.rows())
                    .map(|i| self.sigmoid(wo.dot_row(hidden, i)))
                    .collect();
                find_k_best(&mut best, &output, threshold);
            }
            OutputLayer::Tree(tree) => self.tree_search(tree, wo, hidden, threshold, &mut best),
        }
        best.into_sorted()
    }

    fn softmax(&self, wo: &DenseMatrix, hidden: &[f32]) -> Vec<f32> {
        let mut output: Vec<f32> = (0..wo.rows()).map(|i| wo.dot_row(hidden, i)).collect();
        let max = output.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut z = 0.0;
        for o in output.iter_mut() {
            *o = (*o - max).exp();
            z += *o;
        }
        if z > 0.0 {
            for o in output.iter_mut() {
                *o /= z;
            }
        }
        output
    }

    fn tree_search(
        &self,
        tree: &HuffmanTree,
        wo: &DenseMatrix,
        hidden: &[f32],
        threshold: f32,
        best: &mut KBest,
    ) {
        let Some(root) = tree.root() else { return };
        let floor = std_log(threshold);
        let mut stack = vec![(root, 0.0f32)];
        while let Some((node, score)) = stack.pop() {
            if score < floor {
                continue;
            }
            if best.is_full() && best.weakest().is_some_and(|w| score < w) {
                continue;
            }
            let n = tree.nodes[node];
            match (n.left, n.right) {
                (Some(left), Some(right)) => {
                    let f = self.sigmoid(wo.dot_row(hidden, node - tree.leaves));
                    stack.push((right, score + std_log(f)));
                    stack.push((left, score + std_log(1.0 - f)));
                }
                _ => best.push(score, node),
            }
        }
    }
}

fn find_k_best(best: &mut KBest, output: &[f32], threshold: f32) {
    for (i, p) in output.iter().enumerate() {
        if *p < threshold {
            continue;
        }
        let score = std_log(*p);
        if best.is_full() && best.weakest().is_some_and(|w| score < w) {
            continue;
        }
        best.push(score, i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_ranks_highest_logit_first() {
        let wo = DenseMatrix::from_rows(&[&[1.0, 0.0], &[0.0, 1.0], &[0.5, 0.5]]);
        let loss = Loss::new(LossKind::Softmax, &[3, 2, 1]);
        let out = loss.predict(&wo, &[2.0, 0.0], 3, 0.0);
        let order: Vec<usize> = out.iter().map(|(_, i)| *i).collect();
        assert_eq!(order, vec![0, 2, 1]);
        let total: f32 = out.iter().map(|(s, _)| s.exp()).sum();
        assert!((total - 1.0).abs() < 1e-3);
    }

    #[test]
    fn k_limits_result_count() {
        let wo = DenseMatrix::from_rows(&[&[1.0], &[2.0], &[3.0]]);
        let loss = Loss::new(LossKind::Softmax, &[1, 1, 1]);
        assert_eq!(loss.predict(&wo, &[1.0], 1, 0.0).len(), 1);
        assert!(loss.predict(&wo, &[1.0], 0, 0.0).is_empty());
        assert_eq!(loss.predict(&wo, &[1.0], 10, 0.0).len(), 3);
    }

    #[test]
    fn threshold_drops_unlikely_labels() {
        let wo = DenseMatrix::from_rows(&[&[10.0], &[-10.0]]);
        let loss = Loss::new(LossKind::OneVsAll, &[1, 1]);
        let out = loss.predict(&wo, &[1.0], 2, 0.5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1, 0);
    }

    #[test]
    fn sigmoid_table_saturates() {
        let loss = Loss::new(LossKind::NegativeSampling, &[]);
        assert_eq!(loss.sigmoid(-100.0), 0.0);
        assert_eq!(loss.sigmoid(100.0), 1.0);
        assert!((loss.sigmoid(0.0) - 0.5).abs() < 0.02);
    }

    #[test]
    fn huffman_tree_pairs_rarest_first() {
        let tree = HuffmanTree::build(&[5, 3, 1]);
        assert_eq!(tree.nodes.len(), 5);
        assert_eq!(tree.nodes[3].left, Some(2));
        assert_eq!(tree.nodes[3].right, Some(1));
        assert_eq!(tree.nodes[4].count, 9);
    }

    #[test]
    fn tree_search_probabilities_sum_to_one() {
        // two internal nodes for three labels
        let wo = DenseMatrix::from_rows(&[&[0.3, -0.2], &[1.0, 0.4], &[0.0, 0.0]]);
        let loss = Loss::new(LossKind::HierarchicalSoftmax, &[5, 3, 1]);
        let out = loss.predict(&wo, &[1.0, 1.0], 3, 0.0);
        assert_eq!(out.len(), 3);
        let total: f32 = out.iter().map(|(s, _)| s.exp()).sum();
        assert!((total - 1.0).abs() < 0.01);
        assert!(out.windows(2).all(|w| w[0].0 >= w[1].0));
    }
}
