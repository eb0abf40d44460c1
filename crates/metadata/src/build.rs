//! Fluent construction of [`MetadataGraph`] values.
//!
//! The production converter assembles graphs from a raw service schema;
//! tests and smaller collaborators use these builders instead.

use crate::annotation::SideEffectsRecord;
use crate::graph::{
	Action, EntityType, MetadataGraph, NavigationProperty, Property, PropertyKind,
};

#[derive(Debug, Default)]
pub struct GraphBuilder {
	entity_types: Vec<EntityType>,
}

impl GraphBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn entity_type(mut self, builder: EntityTypeBuilder) -> Self {
		self.entity_types.push(builder.build());
		self
	}

	pub fn build(self) -> MetadataGraph {
		MetadataGraph::new(self.entity_types)
	}
}

#[derive(Debug)]
pub struct EntityTypeBuilder {
	entity_type: EntityType,
}

impl EntityTypeBuilder {
	pub fn new(fully_qualified_name: &str) -> Self {
		Self {
			entity_type: EntityType {
				fully_qualified_name: fully_qualified_name.to_owned(),
				properties: Vec::new(),
				navigation_properties: Vec::new(),
				actions: Vec::new(),
				side_effects: Vec::new(),
			},
		}
	}

	pub fn property(mut self, name: &str) -> Self {
		self.entity_type.properties.push(Property {
			name: name.to_owned(),
			kind: PropertyKind::Primitive,
			text: None,
		});
		self
	}

	/// Property carrying a `Common.Text` association.
	pub fn property_with_text(mut self, name: &str, text: &str) -> Self {
		self.entity_type.properties.push(Property {
			name: name.to_owned(),
			kind: PropertyKind::Primitive,
			text: Some(text.to_owned()),
		});
		self
	}

	pub fn complex_property(mut self, name: &str) -> Self {
		self.entity_type.properties.push(Property {
			name: name.to_owned(),
			kind: PropertyKind::Complex,
			text: None,
		});
		self
	}

	pub fn navigation(mut self, name: &str, target_type: &str, collection: bool) -> Self {
		self.entity_type.navigation_properties.push(NavigationProperty {
			name: name.to_owned(),
			target_type: target_type.to_owned(),
			collection,
		});
		self
	}

	pub fn side_effects(mut self, record: SideEffectsRecord) -> Self {
		self.entity_type.side_effects.push(record);
		self
	}

	pub fn action(mut self, builder: ActionBuilder) -> Self {
		self.entity_type.actions.push(builder.build());
		self
	}

	pub fn build(self) -> EntityType {
		self.entity_type
	}
}

#[derive(Debug)]
pub struct ActionBuilder {
	action: Action,
}

impl ActionBuilder {
	pub fn new(name: &str) -> Self {
		Self {
			action: Action {
				name: name.to_owned(),
				binding_parameter: None,
				side_effects: Vec::new(),
			},
		}
	}

	pub fn binding_parameter(mut self, name: &str) -> Self {
		self.action.binding_parameter = Some(name.to_owned());
		self
	}

	pub fn side_effects(mut self, record: SideEffectsRecord) -> Self {
		self.action.side_effects.push(record);
		self
	}

	pub fn build(self) -> Action {
		self.action
	}
}
