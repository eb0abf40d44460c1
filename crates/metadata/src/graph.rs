//! The entity-relationship metadata graph.

use rustc_hash::FxHashMap;

use crate::annotation::SideEffectsRecord;

/// Scalar or structured property of an entity type.
///
/// Complex-typed members are flattened by the converter: a `City` member of
/// a complex `Address` property appears as a property named `"Address/City"`.
#[derive(Debug, Clone)]
pub struct Property {
	pub name: String,
	pub kind: PropertyKind,
	/// `Common.Text` association: path (relative to the owning entity
	/// type) of the display-text property, if any.
	pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
	Primitive,
	Complex,
}

/// Typed relationship to another entity type.
#[derive(Debug, Clone)]
pub struct NavigationProperty {
	pub name: String,
	/// Fully qualified name of the target entity type.
	pub target_type: String,
	pub collection: bool,
}

/// A bound action of an entity type.
#[derive(Debug, Clone)]
pub struct Action {
	/// Name the UI invokes the action by.
	pub name: String,
	/// Name of the bound-entity parameter. The converter leaves annotation
	/// paths untouched, so action-owned paths still carry this prefix.
	pub binding_parameter: Option<String>,
	pub side_effects: Vec<SideEffectsRecord>,
}

/// A named record shape in the graph.
#[derive(Debug, Clone)]
pub struct EntityType {
	pub fully_qualified_name: String,
	pub properties: Vec<Property>,
	pub navigation_properties: Vec<NavigationProperty>,
	pub actions: Vec<Action>,
	/// `SideEffects` annotation records declared on this type.
	pub side_effects: Vec<SideEffectsRecord>,
}

impl EntityType {
	pub fn property(&self, name: &str) -> Option<&Property> {
		self.properties.iter().find(|p| p.name == name)
	}

	pub fn navigation_property(&self, name: &str) -> Option<&NavigationProperty> {
		self.navigation_properties.iter().find(|n| n.name == name)
	}

	pub fn action(&self, name: &str) -> Option<&Action> {
		self.actions.iter().find(|a| a.name == name)
	}
}

/// Element a path resolved to, together with the type it was found on.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedElement<'g> {
	EntityType(&'g EntityType),
	Property {
		owner: &'g EntityType,
		property: &'g Property,
	},
	NavigationProperty {
		owner: &'g EntityType,
		navigation: &'g NavigationProperty,
	},
}

/// The fully materialized metadata graph.
///
/// Built once by the external converter (or [`GraphBuilder`](crate::GraphBuilder)
/// in tests) before the engine runs; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct MetadataGraph {
	entity_types: Vec<EntityType>,
	by_name: FxHashMap<String, usize>,
}

impl MetadataGraph {
	pub fn new(entity_types: Vec<EntityType>) -> Self {
		let by_name = entity_types
			.iter()
			.enumerate()
			.map(|(i, et)| (et.fully_qualified_name.clone(), i))
			.collect();
		Self {
			entity_types,
			by_name,
		}
	}

	pub fn entity_types(&self) -> &[EntityType] {
		&self.entity_types
	}

	pub fn entity_type(&self, fully_qualified_name: &str) -> Option<&EntityType> {
		self.by_name
			.get(fully_qualified_name)
			.map(|&i| &self.entity_types[i])
	}

	/// Entity type a navigation property points at.
	pub fn navigation_target(&self, navigation: &NavigationProperty) -> Option<&EntityType> {
		self.entity_type(&navigation.target_type)
	}

	/// Resolves a path relative to `owner`.
	///
	/// Grammar: `""` (the type itself), `"Field"`, `"Nav"`, or
	/// `"Nav/Field"` - at most one navigation segment. Flattened complex
	/// member paths (`"Address/City"`) match as direct properties before
	/// any navigation lookup. Anything deeper resolves to `None`.
	pub fn resolve_path<'g>(
		&'g self,
		owner: &'g EntityType,
		path: &str,
	) -> Option<ResolvedElement<'g>> {
		if path.is_empty() {
			return Some(ResolvedElement::EntityType(owner));
		}
		if let Some(property) = owner.property(path) {
			return Some(ResolvedElement::Property { owner, property });
		}
		if let Some(navigation) = owner.navigation_property(path) {
			return Some(ResolvedElement::NavigationProperty { owner, navigation });
		}
		let (head, rest) = path.split_once('/')?;
		let navigation = owner.navigation_property(head)?;
		let target = self.navigation_target(navigation)?;
		if let Some(property) = target.property(rest) {
			return Some(ResolvedElement::Property {
				owner: target,
				property,
			});
		}
		if let Some(navigation) = target.navigation_property(rest) {
			return Some(ResolvedElement::NavigationProperty {
				owner: target,
				navigation,
			});
		}
		None
	}
}
