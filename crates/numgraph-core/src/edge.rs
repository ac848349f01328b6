//! Data flow edges of the IR graph.

use serde::{Deserialize, Serialize};

/// SSA-style data dependency: the source node's output at `source_port`
/// feeds the target node's input at `target_port`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEdge {
    /// Which output of the source node (most nodes have port 0 only).
    pub source_port: u16,
    /// Which input position of the target node.
    pub target_port: u16,
}
