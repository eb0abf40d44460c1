//! Runtime resolution and dispatch.
//!
//! A pure request/response layer over the immutable-after-build
//! [`SideEffectsIndex`]: no state of its own, no locks. Suspension happens
//! only at the two boundary calls (refresh, action execution).
//!
//! # Ordering
//!
//! [`request_for_action`](Resolver::request_for_action) issues every
//! trigger-action future and the aggregated refresh future in the same
//! scheduling turn and waits for all of them as a single unit. Nothing
//! guarantees a trigger action completes before the sibling refresh reads
//! data; callers relying on post-action values must sequence explicitly.

use std::sync::Arc;

use futures::future::{BoxFuture, try_join_all};
use indexmap::IndexMap;

use crate::context::{BindingContext, SharedContext};
use crate::error::SideEffectsError;
use crate::index::SideEffectsIndex;
use crate::types::{ActionSideEffect, ODataSideEffect, ResolvedTargets, TargetPath};

/// Resolves triggering events against the registry and forwards the merged
/// result to the binding layer.
pub struct Resolver<'i> {
	index: &'i SideEffectsIndex,
}

impl<'i> Resolver<'i> {
	pub fn new(index: &'i SideEffectsIndex) -> Self {
		Self { index }
	}

	/// All service-declared side effects of an entity type.
	pub fn entity_side_effects(&self, entity_type: &str) -> &'i IndexMap<String, ODataSideEffect> {
		self.index.entity_side_effects(entity_type)
	}

	/// Side effects with no source conditions; these apply unconditionally
	/// (for example on every save).
	pub fn global_entity_side_effects(&self, entity_type: &str) -> Vec<&'i ODataSideEffect> {
		self.index
			.entity_side_effects(entity_type)
			.values()
			.filter(|effect| effect.is_global())
			.collect()
	}

	/// Aggregated side effects of a bound action, resolved through the
	/// context's entity type. `None` when the entity type cannot be
	/// determined or the action carries no side effects.
	pub fn action_side_effects(
		&self,
		action: &str,
		context: &dyn BindingContext,
	) -> Option<&'i ActionSideEffect> {
		let entity_type = context.entity_type()?;
		self.index.action_side_effects(&entity_type).get(action)
	}

	/// Resolves and dispatches the side effects of an edited field.
	///
	/// Matches annotations listing `field_path` among their source
	/// properties. Trigger actions fire without being awaited; a refresh
	/// failure is logged, never returned.
	pub async fn request_for_field_change(&self, field_path: &str, context: &SharedContext) {
		let matching: Vec<&ODataSideEffect> = self
			.effects_of(context)
			.filter(|effect| effect.source_properties.iter().any(|p| p == field_path))
			.collect();
		self.dispatch_matches(matching, context).await;
	}

	/// Resolves and dispatches the side effects of a navigated-into
	/// relationship.
	///
	/// An annotation matches when one of its source properties is a direct
	/// child of the navigation (`"<nav>/Field"`, nothing deeper) or one of
	/// its source entities names the navigation exactly.
	pub async fn request_for_navigation(
		&self,
		navigation_property: &str,
		context: &SharedContext,
	) {
		let prefix = format!("{navigation_property}/");
		let matching: Vec<&ODataSideEffect> = self
			.effects_of(context)
			.filter(|effect| {
				effect.source_properties.iter().any(|p| {
					p.strip_prefix(&prefix)
						.is_some_and(|rest| !rest.contains('/'))
				}) || effect
					.source_entities
					.iter()
					.any(|e| e == navigation_property)
			})
			.collect();
		self.dispatch_matches(matching, context).await;
	}

	/// Dispatches the side effects of a completed action: one future per
	/// trigger action plus one for the combined refresh, all issued
	/// concurrently and awaited together. Resolves immediately when the
	/// effect is empty. Failures propagate to the caller.
	pub async fn request_for_action(
		&self,
		effect: &ActionSideEffect,
		context: &SharedContext,
	) -> Result<(), SideEffectsError> {
		let mut pending: Vec<BoxFuture<'_, Result<(), SideEffectsError>>> = Vec::new();
		for action in &effect.trigger_actions {
			pending.push(Box::pin(self.execute_action(action, context, None)));
		}
		if !effect.path_expressions.is_empty() {
			pending.push(Box::pin(context.request_side_effects(&effect.path_expressions, None)));
		}
		if pending.is_empty() {
			return Ok(());
		}
		try_join_all(pending).await.map(|_| ())
	}

	/// Executes a bound action through the context's model, with the
	/// context's own update group unless overridden.
	pub async fn execute_action(
		&self,
		action: &str,
		context: &SharedContext,
		group_id: Option<&str>,
	) -> Result<(), SideEffectsError> {
		let group = group_id
			.map(str::to_owned)
			.or_else(|| context.update_group_id());
		context.execute_bound_action(action, group.as_deref()).await
	}

	/// Forwards an explicit target list to the refresh layer.
	pub async fn request_side_effects(
		&self,
		targets: &[TargetPath],
		context: &SharedContext,
		group_id: Option<&str>,
	) -> Result<(), SideEffectsError> {
		context.request_side_effects(targets, group_id).await
	}

	fn effects_of(&self, context: &SharedContext) -> impl Iterator<Item = &'i ODataSideEffect> {
		context
			.entity_type()
			.map(|entity_type| self.index.entity_side_effects(&entity_type).values())
			.into_iter()
			.flatten()
	}

	/// Shared tail of the field-change and navigation paths: fire trigger
	/// actions without awaiting them, merge and deduplicate targets, and
	/// request the refresh, swallowing (but logging) its failure.
	async fn dispatch_matches(&self, matching: Vec<&ODataSideEffect>, context: &SharedContext) {
		let mut targets = ResolvedTargets::default();
		for effect in matching {
			targets.absorb(effect);
		}

		// Deduplicated set: two annotations naming the same trigger fire it
		// once.
		for action in &targets.trigger_actions {
			let action = action.clone();
			let context = Arc::clone(context);
			tokio::spawn(async move {
				let group = context.update_group_id();
				if let Err(error) = context
					.execute_bound_action(&action, group.as_deref())
					.await
				{
					tracing::warn!(%action, %error, "side_effects.trigger_failed");
				}
			});
		}

		if targets.is_empty() {
			return;
		}
		let paths = targets.into_target_paths();
		if let Err(error) = context.request_side_effects(&paths, None).await {
			tracing::warn!(
				%error,
				context = %context.path(),
				"side_effects.refresh_failed"
			);
		}
	}
}
