//! Graph tracing: build an [`OpGraph`](numgraph_core::OpGraph) by writing
//! ordinary arithmetic against placeholder [`Tracer`] values.
//!
//! ```ignore
//! let graph = trace(&[("x", desc)], TraceConfig::default(), |params| {
//!     let y = (&params[0] * 3i64)?;
//!     Ok(vec![(&y / 2i64)?])
//! })?;
//! ```

pub mod error;
pub mod family;
pub mod ops;
pub mod session;
pub mod tracer;

// Re-export commonly used types
pub use error::TraceError;
pub use family::{NumericFamily, Operand, TracerFamily};
pub use session::{trace, TraceConfig, TraceSession};
pub use tracer::{StaticIndex, Traced, Tracer};
