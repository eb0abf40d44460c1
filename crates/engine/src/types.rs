//! Normalized side-effect definitions and runtime result types.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A path forwarded to the refresh layer.
///
/// Property paths refresh individual fields; navigation paths refresh the
/// whole related entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetPath {
	Property(String),
	NavigationPath(String),
}

impl TargetPath {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Property(p) | Self::NavigationPath(p) => p,
		}
	}
}

/// One normalized `SideEffects` annotation, owned by the entity type it was
/// declared on. Immutable after registry build.
///
/// All paths are relative to the owning entity type: binding-parameter
/// prefixes are stripped and target lists deduplicated during
/// normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ODataSideEffect {
	pub fully_qualified_name: String,
	pub qualifier: Option<String>,
	pub source_properties: Vec<String>,
	/// Navigation paths; `""` is the annotated entity itself.
	pub source_entities: Vec<String>,
	pub target_properties: Vec<String>,
	/// Navigation paths of entities to refresh wholesale.
	pub target_entities: Vec<String>,
	pub trigger_action: Option<String>,
}

impl ODataSideEffect {
	/// Global effects have no source conditions and apply unconditionally.
	/// A `""` source entity names the annotated entity itself and carries no
	/// condition, so a list of only self entries still counts as global.
	pub fn is_global(&self) -> bool {
		self.source_properties.is_empty()
			&& self.source_entities.iter().all(String::is_empty)
	}
}

/// Aggregated side effects of one bound action: the union of every
/// contributing annotation record, keyed by action name in the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSideEffect {
	pub path_expressions: Vec<TargetPath>,
	pub trigger_actions: Vec<String>,
}

impl ActionSideEffect {
	pub fn is_empty(&self) -> bool {
		self.path_expressions.is_empty() && self.trigger_actions.is_empty()
	}
}

/// A side effect declared by a UI control rather than the service schema.
///
/// Deliberately narrower than [`ODataSideEffect`]: only flat source
/// property paths are recognized as triggers, and at most one definition
/// exists per (entity type, control id) pair. The declaring control queries
/// these back itself; the resolver never merges them into service-declared
/// resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSideEffect {
	pub source_control_id: String,
	/// Synthesized at registration; any declared value is overwritten.
	pub fully_qualified_name: String,
	pub source_properties: Vec<String>,
	pub target_properties: Vec<String>,
	pub target_entities: Vec<String>,
}

/// Deduplicated union of targets accumulated over several matching
/// annotations, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTargets {
	pub target_properties: IndexSet<String>,
	pub target_entities: IndexSet<String>,
	pub trigger_actions: IndexSet<String>,
}

impl ResolvedTargets {
	pub fn absorb(&mut self, effect: &ODataSideEffect) {
		self.target_properties
			.extend(effect.target_properties.iter().cloned());
		self.target_entities
			.extend(effect.target_entities.iter().cloned());
		if let Some(action) = &effect.trigger_action {
			self.trigger_actions.insert(action.clone());
		}
	}

	/// True when there is nothing to refresh (trigger actions alone do not
	/// warrant a refresh round-trip).
	pub fn is_empty(&self) -> bool {
		self.target_properties.is_empty() && self.target_entities.is_empty()
	}

	pub fn into_target_paths(self) -> Vec<TargetPath> {
		self.target_properties
			.into_iter()
			.map(TargetPath::Property)
			.chain(self.target_entities.into_iter().map(TargetPath::NavigationPath))
			.collect()
	}
}

/// Build-time capabilities, the optional argument of
/// [`SideEffectsIndex::initialize_with`](crate::SideEffectsIndex::initialize_with).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
	/// Expand `Common.Text` associations of target properties into
	/// additional targets.
	pub expand_text_associations: bool,
}

impl Default for Capabilities {
	fn default() -> Self {
		Self {
			expand_text_associations: true,
		}
	}
}
