//! Swimlane Core Types and Definitions
//!
//! This crate provides the value types shared by the Swimlane layout engine:
//!
//! - **Geometry**: Points, sizes, bounds and segment math ([`geometry`] module)
//! - **Identifiers**: Interned shape resource ids ([`identifier::Id`])
//! - **Stencils**: Shape roles resolved from stencil ids ([`stencil`] module)

pub mod geometry;
pub mod identifier;
pub mod stencil;
