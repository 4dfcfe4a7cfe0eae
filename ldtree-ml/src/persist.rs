//! Binary persistence for trained trees
//!
//! ## Format
//!
//! A file holds a root container: a `u32` count of root entries (0 or 1)
//! followed by each entry as a tagged node. Nodes nest recursively.
//!
//! ```text
//! tag u8   0 = null, 1 = table (never persisted), 2 = decision, 3 = action
//!
//! decision: [i32] states, u32 split column, u32 child count, children...
//! action:   [i32] actions, [u32] weights
//! ```
//!
//! Integers are little-endian and arrays are `u32` count prefixed, matching
//! the table format in `ldtree_core::codec`.

use ldtree_core::{ByteReader, ByteWriter, CodecError, CodecResult};

use crate::node::{ActionNode, DecisionNode, Node, NodeId};
use crate::tree::DecisionTree;

const TAG_NULL: u8 = 0;
const TAG_TABLE: u8 = 1;
const TAG_DECISION: u8 = 2;
const TAG_ACTION: u8 = 3;

/// Deepest nesting accepted when decoding
const MAX_DEPTH: usize = 1024;

/// Write the root container for `tree` (an absent tree writes zero roots)
pub fn encode_tree(tree: Option<&DecisionTree>, writer: &mut ByteWriter) {
    match tree {
        Some(tree) => {
            writer.write_u32(1);
            encode_node(tree, tree.root(), writer);
        }
        None => writer.write_u32(0),
    }
}

fn encode_node(tree: &DecisionTree, id: NodeId, writer: &mut ByteWriter) {
    match tree.node(id) {
        None => writer.write_u8(TAG_NULL),
        Some(Node::Decision(decision)) => {
            writer.write_u8(TAG_DECISION);
            writer.write_i32_slice(decision.states());
            writer.write_len(decision.column());
            writer.write_len(decision.children().len());
            for &child in decision.children() {
                encode_node(tree, child, writer);
            }
        }
        Some(Node::Action(leaf)) => {
            writer.write_u8(TAG_ACTION);
            writer.write_i32_slice(leaf.actions());
            writer.write_u32_slice(leaf.weights());
        }
    }
}

/// Read a root container
///
/// Returns `None` for an empty container or a null root.
pub fn decode_tree(reader: &mut ByteReader<'_>) -> CodecResult<Option<DecisionTree>> {
    let roots = reader.read_u32()?;
    match roots {
        0 => return Ok(None),
        1 => {}
        _ => {
            return Err(CodecError::Inconsistent {
                reason: "more than one root node",
            })
        }
    }

    let mut nodes = Vec::new();
    if decode_node(reader, &mut nodes, 0)?.is_none() {
        return Ok(None);
    }
    DecisionTree::from_nodes(nodes, NodeId(0))
        .map(|tree| Some(tree.into_breadth_first()))
        .ok_or(CodecError::Inconsistent {
            reason: "invalid node links",
        })
}

/// Decode one node in pre-order, returning its id (`None` for a null tag)
fn decode_node(
    reader: &mut ByteReader<'_>,
    nodes: &mut Vec<Node>,
    depth: usize,
) -> CodecResult<Option<NodeId>> {
    if depth > MAX_DEPTH {
        return Err(CodecError::Inconsistent {
            reason: "tree nested too deeply",
        });
    }

    match reader.read_u8()? {
        TAG_NULL => Ok(None),
        TAG_TABLE => Err(CodecError::TableNodeNotPersistable),
        TAG_DECISION => {
            let states = reader.read_i32_vec()?;
            let column = reader.read_u32()? as usize;
            let child_count = reader.read_len(1)?;
            if child_count != states.len() {
                return Err(CodecError::Inconsistent {
                    reason: "decision states and children differ in length",
                });
            }

            // Reserve the parent slot so children land after it
            let id = NodeId(nodes.len());
            nodes.push(Node::Action(ActionNode {
                actions: Vec::new(),
                weights: Vec::new(),
            }));

            let mut children = Vec::with_capacity(child_count);
            for _ in 0..child_count {
                let child = decode_node(reader, nodes, depth + 1)?.ok_or(
                    CodecError::Inconsistent {
                        reason: "null child under a decision node",
                    },
                )?;
                children.push(child);
            }

            nodes[id.0] = Node::Decision(DecisionNode {
                states,
                column,
                children,
            });
            Ok(Some(id))
        }
        TAG_ACTION => {
            let actions = reader.read_i32_vec()?;
            let weights = reader.read_u32_vec()?;
            let leaf = ActionNode::new(actions, weights).ok_or(CodecError::Inconsistent {
                reason: "action and weight lists differ in length",
            })?;
            let id = NodeId(nodes.len());
            nodes.push(Node::Action(leaf));
            Ok(Some(id))
        }
        tag => Err(CodecError::InvalidNodeTag(tag)),
    }
}

impl DecisionTree {
    /// Encode as a single-root container
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        encode_tree(Some(self), &mut writer);
        writer.into_bytes()
    }

    /// Decode a root container, requiring exactly one tree and no trailing bytes
    pub fn from_bytes(bytes: &[u8]) -> CodecResult<DecisionTree> {
        let mut reader = ByteReader::new(bytes);
        let tree = decode_tree(&mut reader)?.ok_or(CodecError::Inconsistent {
            reason: "container holds no tree",
        })?;
        if !reader.is_exhausted() {
            return Err(CodecError::Inconsistent {
                reason: "trailing bytes after tree",
            });
        }
        Ok(tree)
    }
}
