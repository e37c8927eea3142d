//! Huffman tree construction.
//!
//! Nodes live in an arena owned by [`HuffmanTree`] and refer to each other by [`NodeId`]. Children
//! point down, and every non-root node keeps a handle to its parent which is only ever used to
//! derive a character's code path bottom-up.
//!
//! The merge order is part of the container format. The working list is scanned left to right and
//! the first node of strictly minimal weight is taken, twice per round; the merged node is appended
//! at the end of the list. A heap would produce an equally valid tree that the other side of the
//! format could not decode.

use core::fmt;

use crate::frequency::{ALPHABET_SIZE, FrequencyTable};

if_tracing! {
    use tracing::{debug, trace};
}

/// Handle of a node inside its tree's arena. Also serves as the node's identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    character: Option<u8>,
    weight: u64,
    children: Option<[NodeId; 2]>,
    parent: Option<NodeId>,
}

impl Node {
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// The character of a leaf, `None` for internal nodes.
    pub const fn character(&self) -> Option<u8> {
        self.character
    }

    pub const fn weight(&self) -> u64 {
        self.weight
    }

    /// `[left, right]`, or `None` for a leaf.
    pub const fn children(&self) -> Option<[NodeId; 2]> {
        self.children
    }

    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub const fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.character {
            Some(c) => write!(f, "'{}' (weight={}, has_parent={})", c.escape_ascii(), self.weight, self.parent.is_some()),
            None => write!(f, "#{} (weight={}, has_parent={})", self.id.0, self.weight, self.parent.is_some()),
        }
    }
}

/// A prefix-code tree together with the table mapping each character to its leaf.
#[derive(Clone, Debug)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: NodeId,
    leaves: [Option<NodeId>; ALPHABET_SIZE],
}

impl HuffmanTree {
    /// Builds the tree for `frequencies`, or `None` if the table is empty.
    ///
    /// Building twice from the same table always yields the same tree.
    pub fn build(frequencies: &FrequencyTable) -> Option<Self> {
        if frequencies.is_empty() {
            return None;
        }

        let leaf_count = frequencies.len();
        let mut nodes = Vec::with_capacity(2 * leaf_count - 1);
        let mut leaves = [None; ALPHABET_SIZE];
        let mut working = Vec::with_capacity(leaf_count);

        for &(character, count) in frequencies.entries() {
            let id = NodeId(nodes.len() as u32);
            nodes.push(Node {
                id,
                character: Some(character),
                weight: u64::from(count),
                children: None,
                parent: None,
            });
            leaves[character as usize] = Some(id);
            working.push(id);
        }

        while working.len() >= 2 {
            let last = pop_min(&nodes, &mut working);
            let second_last = pop_min(&nodes, &mut working);

            let id = NodeId(nodes.len() as u32);
            let weight = nodes[last.index()].weight + nodes[second_last.index()].weight;
            nodes[last.index()].parent = Some(id);
            nodes[second_last.index()].parent = Some(id);
            nodes.push(Node {
                id,
                character: None,
                weight,
                children: Some([second_last, last]),
                parent: None,
            });

            if_tracing! {
                trace!(target = "tree", left = %nodes[second_last.index()], right = %nodes[last.index()], weight, "merged");
            }

            working.push(id);
        }

        let root = working[0];

        if_tracing! {
            debug!(target = "tree", leaves = leaf_count, nodes = nodes.len(), root_weight = nodes[root.index()].weight, "huffman tree built");
        }

        Some(Self { nodes, root, leaves })
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Total number of nodes, leaves included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        (self.nodes.len() + 1) / 2
    }

    /// The leaf holding `character`, if the tree has one.
    pub fn leaf_for(&self, character: u8) -> Option<NodeId> {
        *self.leaves.get(character as usize)?
    }

    /// The child of `node` selected by `bit` (`0` = left, anything else = right), or `None` if
    /// `node` is a leaf.
    pub fn child(&self, node: NodeId, bit: u8) -> Option<NodeId> {
        self.nodes[node.index()].children.map(|[left, right]| if bit == 0 { left } else { right })
    }

    /// Root-to-leaf child selections leading to `character`'s leaf.
    ///
    /// Walks up from the leaf through the parent handles and reverses the result. A tree with a
    /// single leaf gives every character of it the empty path.
    pub fn code_path(&self, character: u8) -> Option<Vec<u8>> {
        let mut current = self.leaf_for(character)?;
        let mut path = Vec::new();
        while let Some(parent) = self.nodes[current.index()].parent {
            let [left, _] = self.nodes[parent.index()].children?;
            path.push(if left == current { 0 } else { 1 });
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    /// Every character with its code path, in leaf order.
    pub fn code_table(&self) -> Vec<(u8, Vec<u8>)> {
        self.nodes
            .iter()
            .filter_map(|node| node.character)
            .filter_map(|c| self.code_path(c).map(|path| (c, path)))
            .collect()
    }
}

/// Removes and returns the first node of minimal weight, keeping the rest in order.
fn pop_min(nodes: &[Node], working: &mut Vec<NodeId>) -> NodeId {
    let mut min_index = 0;
    let mut min_weight = u64::MAX;
    for (i, id) in working.iter().enumerate() {
        let weight = nodes[id.index()].weight;
        if weight < min_weight {
            min_index = i;
            min_weight = weight;
        }
    }
    working.remove(min_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_for(entries: &[(u8, u32)]) -> HuffmanTree {
        let table = FrequencyTable::from_entries(entries.to_vec()).unwrap();
        HuffmanTree::build(&table).unwrap()
    }

    fn code(tree: &HuffmanTree, c: u8) -> Vec<u8> {
        tree.code_path(c).unwrap()
    }

    #[test]
    fn empty_table_has_no_tree() {
        assert!(HuffmanTree::build(&FrequencyTable::new()).is_none());
    }

    #[test]
    fn single_leaf_has_empty_code() {
        let tree = tree_for(&[(b'z', 7)]);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.leaf_count(), 1);
        assert!(tree.node(tree.root()).is_leaf());
        assert_eq!(tree.node(tree.root()).character(), Some(b'z'));
        assert_eq!(code(&tree, b'z'), Vec::<u8>::new());
        assert_eq!(tree.child(tree.root(), 0), None);
    }

    #[test]
    fn first_minimum_goes_right() {
        let tree = tree_for(&[(b'a', 4), (b'b', 1)]);
        assert_eq!(code(&tree, b'a'), vec![0]);
        assert_eq!(code(&tree, b'b'), vec![1]);
    }

    #[test]
    fn ties_break_by_position() {
        // a and b tie: a is found first, becomes "last" and goes right
        let tree = tree_for(&[(b'a', 1), (b'b', 1)]);
        assert_eq!(code(&tree, b'a'), vec![1]);
        assert_eq!(code(&tree, b'b'), vec![0]);

        // rounds: [c, a] appended at the end, then [x2, b], then [x3, d]
        let tree = tree_for(&[(b'a', 1), (b'b', 2), (b'c', 1), (b'd', 4)]);
        assert_eq!(code(&tree, b'd'), vec![1]);
        assert_eq!(code(&tree, b'b'), vec![0, 1]);
        assert_eq!(code(&tree, b'c'), vec![0, 0, 0]);
        assert_eq!(code(&tree, b'a'), vec![0, 0, 1]);
    }

    #[test]
    fn merged_node_is_appended_after_equal_weights() {
        // after merging a+b the new node (2) ties with c (2); c sits earlier so it is taken first
        let tree = tree_for(&[(b'a', 1), (b'b', 1), (b'c', 2)]);
        assert_eq!(code(&tree, b'c'), vec![1]);
        assert_eq!(code(&tree, b'b'), vec![0, 0]);
        assert_eq!(code(&tree, b'a'), vec![0, 1]);
    }

    #[test]
    fn mississippi_codes() {
        let tree = tree_for(&[(b'm', 1), (b'i', 4), (b's', 4), (b'p', 2)]);
        assert_eq!(code(&tree, b's'), vec![1]);
        assert_eq!(code(&tree, b'i'), vec![0, 0]);
        assert_eq!(code(&tree, b'p'), vec![0, 1, 0]);
        assert_eq!(code(&tree, b'm'), vec![0, 1, 1]);
        assert_eq!(tree.node(tree.root()).weight(), 11);
    }

    #[test]
    fn building_twice_gives_identical_codes() {
        let entries: Vec<(u8, u32)> = (0u8..128).map(|c| (c, 1 + u32::from(c % 7) * 3)).collect();
        let first = tree_for(&entries);
        let second = tree_for(&entries);
        assert_eq!(first.code_table(), second.code_table());
        assert_eq!(first.code_table().len(), 128);
    }

    #[test]
    fn weights_and_parents_are_consistent() {
        let tree = tree_for(&[(b'x', 5), (b'y', 9), (b'z', 12), (b'w', 13), (b'v', 16), (b'u', 45)]);
        assert_eq!(tree.node_count(), 11);
        for i in 0..tree.node_count() {
            let node = tree.node(NodeId(i as u32));
            match node.children() {
                Some([left, right]) => {
                    assert!(node.character().is_none());
                    assert_eq!(node.weight(), tree.node(left).weight() + tree.node(right).weight());
                    assert_eq!(tree.node(left).parent(), Some(node.id()));
                    assert_eq!(tree.node(right).parent(), Some(node.id()));
                }
                None => assert!(node.character().is_some()),
            }
            assert_eq!(node.parent().is_none(), node.id() == tree.root());
        }
    }

    #[test]
    fn code_paths_lead_back_to_their_leaves() {
        let tree = tree_for(&[(b'x', 5), (b'y', 9), (b'z', 12), (b'w', 13), (b'v', 16), (b'u', 45)]);
        for (character, path) in tree.code_table() {
            let leaf = path.iter().try_fold(tree.root(), |node, &bit| tree.child(node, bit)).unwrap();
            assert_eq!(Some(leaf), tree.leaf_for(character));
        }
        assert_eq!(tree.code_path(b'q'), None);
        assert_eq!(tree.code_path(0xff), None);
    }

    #[test]
    fn codes_are_prefix_free() {
        let tree = tree_for(&[(b'x', 5), (b'y', 9), (b'z', 12), (b'w', 13), (b'v', 16), (b'u', 45)]);
        let table = tree.code_table();
        for (a, code_a) in &table {
            for (b, code_b) in &table {
                if a != b {
                    assert!(!code_b.starts_with(code_a), "{} is a prefix of {}", a, b);
                }
            }
        }
    }
}
