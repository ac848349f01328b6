pub mod edge;
pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod ops;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use error::{CoreError, ValueError};
pub use graph::OpGraph;
pub use id::NodeId;
pub use node::IrNode;
pub use ops::{ArithOp, GenericFunction, HostFn, NodeOp};
pub use types::{combine_descriptors, DataType, DescriptorCombiner, ValueDescriptor};
pub use value::Value;
