use thiserror::Error;

/// Errors crossing the [`BindingContext`](crate::BindingContext) boundary.
///
/// Annotation problems never surface here: unresolvable paths and malformed
/// target entries are logged and dropped during registry build (the build
/// never aborts). Only the two runtime boundary calls can fail.
#[derive(Error, Debug, Clone)]
pub enum SideEffectsError {
	/// A bound action invocation was rejected by the model layer.
	#[error("action '{action}' failed: {message}")]
	ActionExecution { action: String, message: String },
	/// A refresh request was rejected by the model layer.
	#[error("side-effects request failed: {0}")]
	Refresh(String),
}

impl SideEffectsError {
	pub fn action(action: impl Into<String>, message: impl Into<String>) -> Self {
		Self::ActionExecution {
			action: action.into(),
			message: message.into(),
		}
	}

	pub fn refresh(message: impl Into<String>) -> Self {
		Self::Refresh(message.into())
	}
}
