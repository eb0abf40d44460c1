//! Target deduplication, shared by normalization and resolution-time
//! merging.

use indexmap::IndexSet;

/// Removes duplicate target paths, keeping first-seen order.
pub fn dedup_targets(
	target_properties: Vec<String>,
	target_entities: Vec<String>,
) -> (Vec<String>, Vec<String>) {
	let properties: IndexSet<String> = target_properties.into_iter().collect();
	let entities: IndexSet<String> = target_entities.into_iter().collect();
	(
		properties.into_iter().collect(),
		entities.into_iter().collect(),
	)
}
