//! Raw side-effects annotation records, as attached to entity types and
//! bound actions by the metadata converter.

use serde::{Deserialize, Serialize};

/// A typed path expression from the annotation vocabulary.
///
/// The schema carries paths either as plain strings or as typed path
/// objects (`$PropertyPath` / `$NavigationPropertyPath`). Which variants a
/// given slot accepts depends on the slot: target *properties* reject
/// navigation paths, target *entities* reject property paths. The engine
/// enforces that during normalization; the record itself stores whatever
/// the schema said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathExpression {
	/// Plain string path.
	Path(String),
	/// `$PropertyPath`-typed path.
	PropertyPath(String),
	/// `$NavigationPropertyPath`-typed path.
	NavigationPropertyPath(String),
}

impl PathExpression {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Path(p) | Self::PropertyPath(p) | Self::NavigationPropertyPath(p) => p,
		}
	}
}

/// One raw `SideEffects` annotation record.
///
/// Several records may exist on the same element, disambiguated by
/// [`qualifier`](Self::qualifier). Paths are as written in the schema:
/// action-owned records still carry the binding-parameter prefix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SideEffectsRecord {
	pub qualifier: Option<String>,
	/// Property paths whose change triggers the effect.
	pub source_properties: Vec<String>,
	/// Navigation paths whose entity change triggers the effect
	/// (`""` means the annotated entity itself).
	pub source_entities: Vec<String>,
	pub target_properties: Vec<PathExpression>,
	pub target_entities: Vec<PathExpression>,
	/// Action to execute when the effect fires.
	pub trigger_action: Option<String>,
}
