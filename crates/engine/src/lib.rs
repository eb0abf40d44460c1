//! SideEffects resolution engine.
//!
//! Given a [`ripple_metadata::MetadataGraph`] annotated with declarative
//! "when field X changes, Y and Z become stale, and action A must run"
//! records, this crate builds a queryable [`SideEffectsIndex`] once per
//! session, and at runtime resolves - for an edited field, a navigated-into
//! relationship, or an executed action - the exact set of properties,
//! entities, and trigger actions to forward to the data-binding layer.
//!
//! The engine never performs network round-trips itself; it crosses the
//! boundary only through the [`BindingContext`] trait.
//!
//! ```no_run
//! # async fn demo(graph: ripple_metadata::MetadataGraph, context: ripple_engine::SharedContext) {
//! use ripple_engine::{Resolver, SideEffectsIndex};
//!
//! let mut index = SideEffectsIndex::new();
//! index.initialize(&graph);
//!
//! let resolver = Resolver::new(&index);
//! resolver.request_for_field_change("Quantity", &context).await;
//! # }
//! ```

mod context;
mod dedup;
mod error;
mod index;
mod normalize;
mod resolver;
mod types;

pub use context::{BindingContext, SharedContext};
pub use dedup::dedup_targets;
pub use error::SideEffectsError;
pub use index::SideEffectsIndex;
pub use normalize::{normalize_record, source_owner};
pub use resolver::Resolver;
pub use types::{
	ActionSideEffect, Capabilities, ControlSideEffect, ODataSideEffect, ResolvedTargets,
	TargetPath,
};
