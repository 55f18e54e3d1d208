//! Layout passes.
//!
//! - [`edge`] keeps each edge consistent with its dockers, docked shapes,
//!   labels and attached nodes.
//! - [`container`] keeps pools, lanes and sub-processes consistent with
//!   their children and moves the free dockers crossing them.
//!
//! Both are driven by [`Diagram::flush`](crate::diagram::Diagram::flush),
//! which runs edge passes before container passes and repeats until nothing
//! is left dirty.

pub mod container;
pub mod edge;

pub use container::{ContainerLayout, ContainerOutcome};
pub use edge::{AttachedMove, EdgeLayoutOutcome, layout_edge};
