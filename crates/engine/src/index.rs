//! The session-lifetime side-effects registry.
//!
//! Built exactly once from the metadata graph, read-only afterwards except
//! the control section, which UI controls mutate on mount and unmount.

use indexmap::{IndexMap, IndexSet};
use ripple_metadata::MetadataGraph;
use rustc_hash::FxHashMap;

use crate::dedup::dedup_targets;
use crate::normalize::normalize_record;
use crate::types::{
	ActionSideEffect, Capabilities, ControlSideEffect, ODataSideEffect, TargetPath,
};

/// Queryable index of every side-effects declaration known to the session.
///
/// An explicit, owned value: construct with [`new`](Self::new), populate
/// with [`initialize`](Self::initialize), and hand it by reference to a
/// [`Resolver`](crate::Resolver). Accessors return empty maps for unknown
/// entity types, never a missing lookup.
#[derive(Debug, Default)]
pub struct SideEffectsIndex {
	/// Service-declared effects per entity type, keyed by annotation key.
	entities: FxHashMap<String, IndexMap<String, ODataSideEffect>>,
	/// Aggregated action effects per entity type, keyed by action name.
	actions: FxHashMap<String, IndexMap<String, ActionSideEffect>>,
	/// Control-declared effects per entity type, keyed by control id.
	/// The only section that changes after initialization.
	control: FxHashMap<String, IndexMap<String, ControlSideEffect>>,
	initialized: bool,
	empty_odata: IndexMap<String, ODataSideEffect>,
	empty_actions: IndexMap<String, ActionSideEffect>,
	empty_control: IndexMap<String, ControlSideEffect>,
}

impl SideEffectsIndex {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds the OData sections from the graph with default
	/// [`Capabilities`]. Idempotent: a second call is a no-op.
	pub fn initialize(&mut self, graph: &MetadataGraph) {
		self.initialize_with(graph, Capabilities::default());
	}

	pub fn initialize_with(&mut self, graph: &MetadataGraph, capabilities: Capabilities) {
		if self.initialized {
			tracing::debug!("side_effects.initialize_skipped");
			return;
		}

		for entity_type in graph.entity_types() {
			let mut effects = IndexMap::new();
			for record in &entity_type.side_effects {
				let effect = normalize_record(graph, entity_type, record, None, &capabilities);
				effects.insert(effect.fully_qualified_name.clone(), effect);
			}

			let mut action_effects = IndexMap::new();
			for action in &entity_type.actions {
				let mut properties: Vec<String> = Vec::new();
				let mut entities: Vec<String> = Vec::new();
				let mut triggers: IndexSet<String> = IndexSet::new();
				for record in &action.side_effects {
					let effect = normalize_record(
						graph,
						entity_type,
						record,
						action.binding_parameter.as_deref(),
						&capabilities,
					);
					properties.extend(effect.target_properties);
					entities.extend(effect.target_entities);
					if let Some(trigger) = effect.trigger_action {
						triggers.insert(trigger);
					}
				}
				let (properties, entities) = dedup_targets(properties, entities);
				action_effects.insert(
					action.name.clone(),
					ActionSideEffect {
						path_expressions: properties
							.into_iter()
							.map(TargetPath::Property)
							.chain(entities.into_iter().map(TargetPath::NavigationPath))
							.collect(),
						trigger_actions: triggers.into_iter().collect(),
					},
				);
			}

			tracing::trace!(
				entity = %entity_type.fully_qualified_name,
				annotations = effects.len(),
				actions = action_effects.len(),
				"side_effects.entity_indexed"
			);
			self.entities
				.insert(entity_type.fully_qualified_name.clone(), effects);
			self.actions
				.insert(entity_type.fully_qualified_name.clone(), action_effects);
		}

		self.initialized = true;
		tracing::debug!(
			entity_types = graph.entity_types().len(),
			"side_effects.initialized"
		);
	}

	pub fn is_initialized(&self) -> bool {
		self.initialized
	}

	/// Service-declared effects of an entity type; empty (not missing) when
	/// the type has none or is unknown.
	pub fn entity_side_effects(&self, entity_type: &str) -> &IndexMap<String, ODataSideEffect> {
		self.entities.get(entity_type).unwrap_or(&self.empty_odata)
	}

	/// Aggregated bound-action effects of an entity type.
	pub fn action_side_effects(&self, entity_type: &str) -> &IndexMap<String, ActionSideEffect> {
		self.actions.get(entity_type).unwrap_or(&self.empty_actions)
	}

	/// Registers (or replaces) a control-declared side effect.
	///
	/// A declaration without a source control id is rejected: there would
	/// be nothing to key the definition on or to remove it by later.
	pub fn add_control_side_effects(&mut self, entity_type: &str, mut effect: ControlSideEffect) {
		if effect.source_control_id.is_empty() {
			tracing::warn!(
				entity = %entity_type,
				"side_effects.control_rejected"
			);
			return;
		}
		effect.fully_qualified_name = format!(
			"{entity_type}/SideEffectsForControl/{}",
			effect.source_control_id
		);
		tracing::trace!(
			entity = %entity_type,
			control = %effect.source_control_id,
			"side_effects.control_added"
		);
		self.control
			.entry(entity_type.to_owned())
			.or_default()
			.insert(effect.source_control_id.clone(), effect);
	}

	/// Removes a control's declarations from every entity type. Idempotent.
	pub fn remove_control_side_effects(&mut self, control_id: &str) {
		for effects in self.control.values_mut() {
			effects.shift_remove(control_id);
		}
	}

	/// Control-declared effects of an entity type; empty when none.
	pub fn control_entity_side_effects(
		&self,
		entity_type: &str,
	) -> &IndexMap<String, ControlSideEffect> {
		self.control.get(entity_type).unwrap_or(&self.empty_control)
	}
}
