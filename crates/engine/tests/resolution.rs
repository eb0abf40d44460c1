//! End-to-end resolution tests over a small order/item model, with a mock
//! binding context standing in for the data-binding layer.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use ripple_engine::{
	ActionSideEffect, BindingContext, Resolver, SharedContext, SideEffectsError,
	SideEffectsIndex, TargetPath,
};
use ripple_metadata::{
	ActionBuilder, EntityTypeBuilder, GraphBuilder, MetadataGraph, PathExpression,
	SideEffectsRecord,
};
use tokio::sync::Barrier;

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn path(p: &str) -> PathExpression {
	PathExpression::Path(p.to_owned())
}

/// Order/item model used throughout:
/// - editing `Quantity` refreshes `Total` and `Tax` and fires `Reprice`
/// - a global (source-less) annotation refreshes `Total`
/// - a direct-child source under `ToItems` and a source-entity annotation
///   both react to navigation, a two-segment source does not
fn graph() -> MetadataGraph {
	GraphBuilder::new()
		.entity_type(
			EntityTypeBuilder::new("com.acme.Order")
				.property("Quantity")
				.property("Total")
				.property("Tax")
				.property("Discount")
				.navigation("ToItems", "com.acme.Item", true)
				.side_effects(SideEffectsRecord {
					source_properties: vec!["Quantity".into()],
					target_properties: vec![path("Total"), path("Tax")],
					trigger_action: Some("com.acme.Reprice".into()),
					..Default::default()
				})
				.side_effects(SideEffectsRecord {
					qualifier: Some("global".into()),
					source_entities: vec!["".into()],
					target_properties: vec![path("Total")],
					..Default::default()
				})
				.side_effects(SideEffectsRecord {
					qualifier: Some("items".into()),
					source_properties: vec!["ToItems/Quantity".into()],
					target_properties: vec![path("Total"), path("Discount")],
					..Default::default()
				})
				.side_effects(SideEffectsRecord {
					qualifier: Some("deep".into()),
					source_properties: vec!["ToItems/SubNav/Price".into()],
					target_properties: vec![path("Tax")],
					..Default::default()
				})
				.side_effects(SideEffectsRecord {
					qualifier: Some("entity".into()),
					source_entities: vec!["ToItems".into()],
					target_properties: vec![path("Total")],
					..Default::default()
				})
				.action(
					ActionBuilder::new("Recalculate")
						.binding_parameter("_it")
						.side_effects(SideEffectsRecord {
							target_properties: vec![path("_it/Total"), path("_it/Tax")],
							trigger_action: Some("com.acme.Reprice".into()),
							..Default::default()
						}),
				),
		)
		.entity_type(
			EntityTypeBuilder::new("com.acme.Item")
				.property("Quantity")
				.property("Price"),
		)
		.build()
}

fn index() -> SideEffectsIndex {
	let mut index = SideEffectsIndex::new();
	index.initialize(&graph());
	index
}

#[derive(Default)]
struct MockContext {
	entity_type: Option<String>,
	group: Option<String>,
	fail_refresh: bool,
	failing_action: Option<String>,
	barrier: Option<Barrier>,
	refreshes: Mutex<Vec<(Vec<TargetPath>, Option<String>)>>,
	actions: Mutex<Vec<(String, Option<String>)>>,
}

impl MockContext {
	fn on_order() -> Self {
		Self {
			entity_type: Some("com.acme.Order".into()),
			..Default::default()
		}
	}

	fn refreshes(&self) -> Vec<(Vec<TargetPath>, Option<String>)> {
		self.refreshes.lock().unwrap().clone()
	}

	fn actions(&self) -> Vec<(String, Option<String>)> {
		self.actions.lock().unwrap().clone()
	}
}

/// The typed handle inspects recorded calls; the erased one feeds the
/// resolver.
fn contexts(mock: MockContext) -> (Arc<MockContext>, SharedContext) {
	let mock = Arc::new(mock);
	let context: SharedContext = mock.clone();
	(mock, context)
}

#[async_trait]
impl BindingContext for MockContext {
	fn path(&self) -> String {
		"/Orders(1)".into()
	}

	fn entity_type(&self) -> Option<String> {
		self.entity_type.clone()
	}

	fn update_group_id(&self) -> Option<String> {
		self.group.clone()
	}

	async fn request_side_effects(
		&self,
		targets: &[TargetPath],
		group_id: Option<&str>,
	) -> Result<(), SideEffectsError> {
		if let Some(barrier) = &self.barrier {
			barrier.wait().await;
		}
		self.refreshes
			.lock()
			.unwrap()
			.push((targets.to_vec(), group_id.map(str::to_owned)));
		if self.fail_refresh {
			return Err(SideEffectsError::refresh("backend rejected batch"));
		}
		Ok(())
	}

	async fn execute_bound_action(
		&self,
		action: &str,
		group_id: Option<&str>,
	) -> Result<(), SideEffectsError> {
		if let Some(barrier) = &self.barrier {
			barrier.wait().await;
		}
		self.actions
			.lock()
			.unwrap()
			.push((action.to_owned(), group_id.map(str::to_owned)));
		if self.failing_action.as_deref() == Some(action) {
			return Err(SideEffectsError::action(action, "boom"));
		}
		Ok(())
	}
}

fn props(paths: &[&str]) -> Vec<TargetPath> {
	paths
		.iter()
		.map(|p| TargetPath::Property((*p).to_owned()))
		.collect()
}

/// Lets fire-and-forget trigger tasks run on the current-thread runtime.
async fn settle() {
	for _ in 0..8 {
		tokio::task::yield_now().await;
	}
}

#[tokio::test]
async fn global_accessor_returns_only_sourceless_annotations() {
	let index = index();
	let resolver = Resolver::new(&index);

	let global = resolver.global_entity_side_effects("com.acme.Order");
	assert_eq!(global.len(), 1);
	assert_eq!(
		global[0].fully_qualified_name,
		"com.acme.Order@SideEffects#global"
	);

	// The full accessor still sees everything.
	assert_eq!(resolver.entity_side_effects("com.acme.Order").len(), 5);
	assert!(resolver.entity_side_effects("com.acme.Nothing").is_empty());
}

#[tokio::test]
async fn field_change_resolves_merged_deduplicated_targets() {
	init_tracing();
	let index = index();
	let resolver = Resolver::new(&index);
	let (mock, context) = contexts(MockContext::on_order());

	resolver.request_for_field_change("Quantity", &context).await;
	settle().await;

	let refreshes = mock.refreshes();
	assert_eq!(refreshes.len(), 1);
	assert_eq!(refreshes[0].0, props(&["Total", "Tax"]));
	// The trigger action fired even though the call never awaited it.
	assert_eq!(mock.actions(), [("com.acme.Reprice".to_owned(), None)]);
}

#[tokio::test]
async fn overlapping_annotations_union_without_duplicates() {
	let index = index();
	let resolver = Resolver::new(&index);
	let (mock, context) = contexts(MockContext::on_order());

	// "ToItems" matches both the direct-child source (Total, Discount) and
	// the source-entity annotation (Total): union is {Total, Discount}.
	resolver.request_for_navigation("ToItems", &context).await;

	let refreshes = mock.refreshes();
	assert_eq!(refreshes.len(), 1);
	assert_eq!(refreshes[0].0, props(&["Total", "Discount"]));
}

#[tokio::test]
async fn navigation_matching_ignores_paths_deeper_than_one_segment() {
	let index = index();
	let resolver = Resolver::new(&index);
	let (mock, context) = contexts(MockContext::on_order());

	resolver.request_for_navigation("ToItems", &context).await;

	let refreshes = mock.refreshes();
	// "ToItems/SubNav/Price" must not have contributed Tax.
	assert_eq!(refreshes.len(), 1);
	assert!(!refreshes[0].0.contains(&TargetPath::Property("Tax".into())));
}

#[tokio::test]
async fn navigation_without_matches_requests_nothing() {
	let index = index();
	let resolver = Resolver::new(&index);
	let (mock, context) = contexts(MockContext::on_order());

	resolver.request_for_navigation("ToNowhere", &context).await;

	assert!(mock.refreshes().is_empty());
}

#[tokio::test]
async fn navigation_refresh_failure_is_swallowed() {
	init_tracing();
	let index = index();
	let resolver = Resolver::new(&index);
	let (mock, context) = contexts(MockContext {
		fail_refresh: true,
		..MockContext::on_order()
	});

	// Must complete normally; the failure only shows up in the log.
	resolver.request_for_navigation("ToItems", &context).await;
	assert_eq!(mock.refreshes().len(), 1);
}

#[tokio::test]
async fn unresolvable_context_matches_nothing() {
	let index = index();
	let resolver = Resolver::new(&index);
	let (mock, context) = contexts(MockContext::default());

	resolver.request_for_field_change("Quantity", &context).await;

	assert!(mock.refreshes().is_empty());
	assert!(resolver
		.action_side_effects("Recalculate", mock.as_ref())
		.is_none());
}

#[tokio::test]
async fn action_side_effects_resolve_through_context_entity_type() {
	let index = index();
	let resolver = Resolver::new(&index);
	let (mock, _context) = contexts(MockContext::on_order());

	let effect = resolver
		.action_side_effects("Recalculate", mock.as_ref())
		.unwrap();
	assert_eq!(effect.path_expressions, props(&["Total", "Tax"]));
	assert_eq!(effect.trigger_actions, ["com.acme.Reprice"]);
	assert!(resolver.action_side_effects("Missing", mock.as_ref()).is_none());
}

#[tokio::test]
async fn action_dispatch_issues_triggers_and_refresh_concurrently() {
	let index = index();
	let resolver = Resolver::new(&index);
	// Barrier of two parties: the trigger action and the refresh. If the
	// resolver awaited one before issuing the other, this would deadlock.
	let (mock, context) = contexts(MockContext {
		barrier: Some(Barrier::new(2)),
		..MockContext::on_order()
	});

	let effect = resolver
		.action_side_effects("Recalculate", mock.as_ref())
		.unwrap()
		.clone();
	resolver.request_for_action(&effect, &context).await.unwrap();

	assert_eq!(mock.actions(), [("com.acme.Reprice".to_owned(), None)]);
	assert_eq!(mock.refreshes().len(), 1);
}

#[tokio::test]
async fn empty_action_effect_resolves_without_boundary_calls() {
	let index = index();
	let resolver = Resolver::new(&index);
	let (mock, context) = contexts(MockContext::on_order());

	resolver
		.request_for_action(&ActionSideEffect::default(), &context)
		.await
		.unwrap();

	assert!(mock.refreshes().is_empty());
	assert!(mock.actions().is_empty());
}

#[tokio::test]
async fn action_execution_failure_propagates() {
	let index = index();
	let resolver = Resolver::new(&index);
	let (mock, context) = contexts(MockContext {
		failing_action: Some("com.acme.Reprice".into()),
		..MockContext::on_order()
	});

	let effect = resolver
		.action_side_effects("Recalculate", mock.as_ref())
		.unwrap()
		.clone();
	let error = resolver
		.request_for_action(&effect, &context)
		.await
		.unwrap_err();
	assert!(matches!(error, SideEffectsError::ActionExecution { .. }));
}

#[tokio::test]
async fn execute_action_prefers_explicit_group_over_context_group() {
	let index = index();
	let resolver = Resolver::new(&index);
	let (mock, context) = contexts(MockContext {
		group: Some("$auto.Workers".into()),
		..MockContext::on_order()
	});

	resolver
		.execute_action("com.acme.Reprice", &context, None)
		.await
		.unwrap();
	resolver
		.execute_action("com.acme.Reprice", &context, Some("$direct"))
		.await
		.unwrap();

	assert_eq!(
		mock.actions(),
		[
			("com.acme.Reprice".to_owned(), Some("$auto.Workers".to_owned())),
			("com.acme.Reprice".to_owned(), Some("$direct".to_owned())),
		]
	);
}

#[tokio::test]
async fn control_side_effects_stay_out_of_service_resolution() {
	let mut index = index();
	index.add_control_side_effects(
		"com.acme.Order",
		ripple_engine::ControlSideEffect {
			source_control_id: "filter-bar".into(),
			source_properties: vec!["ToItems/Quantity".into()],
			target_properties: vec!["Discount".into()],
			..Default::default()
		},
	);
	let resolver = Resolver::new(&index);
	let (mock, context) = contexts(MockContext::on_order());

	resolver.request_for_navigation("ToItems", &context).await;

	// The declaring control consumes its own entry directly instead.
	let refreshes = mock.refreshes();
	assert_eq!(refreshes[0].0, props(&["Total", "Discount"]));
	assert_eq!(
		index
			.control_entity_side_effects("com.acme.Order")
			.get("filter-bar")
			.unwrap()
			.target_properties,
		["Discount"]
	);
}
