//! Typed, navigable metadata graph for the side-effects engine.
//!
//! The conversion from a raw service schema into this graph happens in an
//! external converter; this crate only defines the shapes that converter
//! produces and the engine consumes:
//!
//! - [`MetadataGraph`] / [`EntityType`] - the entity-relationship model with
//!   path resolution ([`MetadataGraph::resolve_path`])
//! - [`SideEffectsRecord`] / [`PathExpression`] - raw annotation records as
//!   they appear on entity types and bound actions
//! - [`GraphBuilder`] / [`EntityTypeBuilder`] - fluent construction for
//!   converters and tests

mod annotation;
mod build;
mod graph;

pub use annotation::{PathExpression, SideEffectsRecord};
pub use build::{ActionBuilder, EntityTypeBuilder, GraphBuilder};
pub use graph::{
	Action, EntityType, MetadataGraph, NavigationProperty, Property, PropertyKind, ResolvedElement,
};
