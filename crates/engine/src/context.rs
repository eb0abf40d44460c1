//! The seam to the external data-binding layer.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SideEffectsError;
use crate::types::TargetPath;

/// A binding context over one entity instance, owned by the external
/// data-binding layer. The engine resolves *what* to refresh; the context
/// performs the round-trips.
#[async_trait]
pub trait BindingContext: Send + Sync {
	/// Binding path of the context (diagnostics only).
	fn path(&self) -> String;

	/// Fully qualified name of the entity type the context is bound to,
	/// when it can be determined.
	fn entity_type(&self) -> Option<String>;

	/// The context's own update group, used when no explicit group is
	/// passed to action execution.
	fn update_group_id(&self) -> Option<String>;

	/// Re-fetches the given properties and entities.
	async fn request_side_effects(
		&self,
		targets: &[TargetPath],
		group_id: Option<&str>,
	) -> Result<(), SideEffectsError>;

	/// Executes a bound action on this context.
	async fn execute_bound_action(
		&self,
		action: &str,
		group_id: Option<&str>,
	) -> Result<(), SideEffectsError>;
}

/// Shared handle to a binding context; required because trigger actions may
/// outlive the resolver call that fired them.
pub type SharedContext = Arc<dyn BindingContext>;
