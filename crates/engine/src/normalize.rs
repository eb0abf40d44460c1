//! Annotation normalization: target-shape coercion, binding-parameter
//! stripping, and `Common.Text` association expansion.
//!
//! Normalization never fails. Malformed target entries and unresolvable
//! paths are dropped with a log line and the rest of the record is kept,
//! so a single bad annotation cannot abort a registry build.

use ripple_metadata::{EntityType, MetadataGraph, PathExpression, Property, SideEffectsRecord};

use crate::dedup::dedup_targets;
use crate::types::{Capabilities, ODataSideEffect};

/// Registry key of a record: `<owner>@SideEffects`, `#qualifier`-suffixed
/// when qualified. Unique within the owning entity type's map.
pub(crate) fn annotation_key(owner: &EntityType, qualifier: Option<&str>) -> String {
	match qualifier {
		Some(q) => format!("{}@SideEffects#{q}", owner.fully_qualified_name),
		None => format!("{}@SideEffects", owner.fully_qualified_name),
	}
}

/// Normalizes one raw annotation record into an [`ODataSideEffect`] with
/// entity-relative, deduplicated target lists.
///
/// `binding_parameter` is the bound-entity parameter name for action-owned
/// records; entity-owned records pass `None`.
pub fn normalize_record(
	graph: &MetadataGraph,
	owner: &EntityType,
	record: &SideEffectsRecord,
	binding_parameter: Option<&str>,
	capabilities: &Capabilities,
) -> ODataSideEffect {
	let mut target_properties = coerce_target_properties(owner, &record.target_properties);
	let mut target_entities = coerce_target_entities(owner, &record.target_entities);

	if let Some(parameter) = binding_parameter {
		strip_binding_parameter(&mut target_properties, parameter);
		strip_binding_parameter(&mut target_entities, parameter);
	}

	drop_unresolvable_targets(graph, owner, &mut target_properties, &mut target_entities);

	if capabilities.expand_text_associations {
		expand_text_associations(graph, owner, &mut target_properties, &mut target_entities);
	}

	let (target_properties, target_entities) = dedup_targets(target_properties, target_entities);

	ODataSideEffect {
		fully_qualified_name: annotation_key(owner, record.qualifier.as_deref()),
		qualifier: record.qualifier.clone(),
		source_properties: record.source_properties.clone(),
		source_entities: record.source_entities.clone(),
		target_properties,
		target_entities,
		trigger_action: record.trigger_action.clone(),
	}
}

/// Entity type a source property path is attributed to: `"Nav/Field"`
/// belongs to the navigation target of `Nav`, not to the annotated type.
pub fn source_owner<'g>(
	graph: &'g MetadataGraph,
	owner: &'g EntityType,
	source_path: &str,
) -> Option<&'g EntityType> {
	use ripple_metadata::ResolvedElement;
	match graph.resolve_path(owner, source_path)? {
		ResolvedElement::EntityType(et) => Some(et),
		ResolvedElement::Property { owner, .. } => Some(owner),
		ResolvedElement::NavigationProperty { owner, .. } => Some(owner),
	}
}

/// Target properties accept plain and `$PropertyPath` entries; a
/// navigation-typed entry cannot name a property and is dropped.
fn coerce_target_properties(owner: &EntityType, entries: &[PathExpression]) -> Vec<String> {
	entries
		.iter()
		.filter_map(|entry| match entry {
			PathExpression::Path(p) | PathExpression::PropertyPath(p) => Some(p.clone()),
			PathExpression::NavigationPropertyPath(p) => {
				tracing::error!(
					path = %p,
					entity = %owner.fully_qualified_name,
					"side_effects.target_property_dropped"
				);
				None
			}
		})
		.collect()
}

/// Target entities accept plain and `$NavigationPropertyPath` entries.
fn coerce_target_entities(owner: &EntityType, entries: &[PathExpression]) -> Vec<String> {
	entries
		.iter()
		.filter_map(|entry| match entry {
			PathExpression::Path(p) | PathExpression::NavigationPropertyPath(p) => Some(p.clone()),
			PathExpression::PropertyPath(p) => {
				tracing::error!(
					path = %p,
					entity = %owner.fully_qualified_name,
					"side_effects.target_entity_dropped"
				);
				None
			}
		})
		.collect()
}

/// Drops target entries that cannot be located in the graph. Sources are
/// deliberately left untouched: removing an unresolvable source would
/// reclassify the effect as global.
fn drop_unresolvable_targets(
	graph: &MetadataGraph,
	owner: &EntityType,
	target_properties: &mut Vec<String>,
	target_entities: &mut Vec<String>,
) {
	target_properties.retain(|path| {
		let resolvable = match star_scope(path) {
			Some(scope) => scope_entity_type(graph, owner, scope).is_some(),
			None => resolve_target_property(graph, owner, path).is_some(),
		};
		if !resolvable {
			tracing::info!(
				path = %path,
				entity = %owner.fully_qualified_name,
				"side_effects.target_unresolved"
			);
		}
		resolvable
	});
	target_entities.retain(|path| {
		let resolvable = path.is_empty()
			|| matches!(
				graph.resolve_path(owner, path),
				Some(ripple_metadata::ResolvedElement::NavigationProperty { .. })
			);
		if !resolvable {
			tracing::info!(
				path = %path,
				entity = %owner.fully_qualified_name,
				"side_effects.target_entity_unresolved"
			);
		}
		resolvable
	});
}

/// Star scope of a path: `""` for `"*"`, `"Nav"` for `"Nav/*"`, `None`
/// otherwise.
fn star_scope(path: &str) -> Option<&str> {
	if path == "*" {
		Some("")
	} else {
		path.strip_suffix("/*")
	}
}

/// Strips a leading `"<parameter>/"`, anchored at the start only.
fn strip_binding_parameter(paths: &mut [String], parameter: &str) {
	let prefix = format!("{parameter}/");
	for path in paths {
		if let Some(rest) = path.strip_prefix(&prefix) {
			*path = rest.to_owned();
		}
	}
}

/// Appends the `Common.Text` property of every target property unless it
/// is already listed or implied by a `*` / `Nav/*` scope. Text reached
/// across a navigation property becomes a target *entity*; text inside a
/// flattened complex property stays a target property.
fn expand_text_associations(
	graph: &MetadataGraph,
	owner: &EntityType,
	target_properties: &mut Vec<String>,
	target_entities: &mut Vec<String>,
) {
	let star_scopes: Vec<String> = target_properties
		.iter()
		.filter_map(|p| star_scope(p).map(str::to_owned))
		.collect();

	let mut extra_properties: Vec<String> = Vec::new();
	let mut extra_entities: Vec<String> = Vec::new();

	// Unresolvable paths were already dropped; resolution cannot fail here.
	for path in target_properties.iter() {
		if let Some(scope) = star_scope(path) {
			let Some(scope_type) = scope_entity_type(graph, owner, scope) else {
				continue;
			};
			for property in &scope_type.properties {
				if let Some(text) = &property.text {
					consider_text(
						scope,
						scope_type,
						text,
						&star_scopes,
						target_properties,
						target_entities,
						&mut extra_properties,
						&mut extra_entities,
					);
				}
			}
		} else {
			let Some((scope, scope_type, property)) = resolve_target_property(graph, owner, path)
			else {
				continue;
			};
			if let Some(text) = &property.text {
				consider_text(
					scope,
					scope_type,
					text,
					&star_scopes,
					target_properties,
					target_entities,
					&mut extra_properties,
					&mut extra_entities,
				);
			}
		}
	}

	target_properties.extend(extra_properties);
	target_entities.extend(extra_entities);
}

/// Resolves a non-star target property path to (scope prefix, scope entity
/// type, property). Flattened complex member paths resolve on the owner
/// itself; otherwise one navigation segment is followed.
fn resolve_target_property<'g, 'p>(
	graph: &'g MetadataGraph,
	owner: &'g EntityType,
	path: &'p str,
) -> Option<(&'p str, &'g EntityType, &'g Property)> {
	if let Some(property) = owner.property(path) {
		return Some(("", owner, property));
	}
	let (head, rest) = path.split_once('/')?;
	let navigation = owner.navigation_property(head)?;
	let target = graph.navigation_target(navigation)?;
	let property = target.property(rest)?;
	Some((head, target, property))
}

fn scope_entity_type<'g>(
	graph: &'g MetadataGraph,
	owner: &'g EntityType,
	scope: &str,
) -> Option<&'g EntityType> {
	if scope.is_empty() {
		return Some(owner);
	}
	let navigation = owner.navigation_property(scope)?;
	graph.navigation_target(navigation)
}

fn join_scope(scope: &str, path: &str) -> String {
	if scope.is_empty() {
		path.to_owned()
	} else {
		format!("{scope}/{path}")
	}
}

#[allow(clippy::too_many_arguments)]
fn consider_text(
	scope: &str,
	scope_type: &EntityType,
	text: &str,
	star_scopes: &[String],
	target_properties: &[String],
	target_entities: &[String],
	extra_properties: &mut Vec<String>,
	extra_entities: &mut Vec<String>,
) {
	let full = join_scope(scope, text);
	let text_scope = full.rsplit_once('/').map_or("", |(s, _)| s);
	if star_scopes.iter().any(|s| s == text_scope) {
		// Already covered by a star expansion of the same scope.
		return;
	}

	let crossed_navigation = text
		.split_once('/')
		.map(|(head, _)| head)
		.filter(|head| scope_type.navigation_property(head).is_some());

	if let Some(head) = crossed_navigation {
		// The text lives on a related entity: refresh that entity.
		let navigation_path = join_scope(scope, head);
		if !target_entities.contains(&navigation_path) && !extra_entities.contains(&navigation_path)
		{
			extra_entities.push(navigation_path);
		}
	} else if !target_properties.contains(&full) && !extra_properties.contains(&full) {
		extra_properties.push(full);
	}
}
