use thiserror::Error;

/// Failures surfaced by the dual-graph tree.
///
/// Graph variants describe a broken contract between callers and the graphs
/// (ids that were never allocated or never registered). None of them occur when
/// ids only come from traversal or picking of registered nodes.
/// [`TreeError::InvalidConfig`] is raised before a tree is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
	#[error("branch pair (interaction {interaction}, visualization {visualization}) is already registered")]
	AlreadyRegistered { interaction: u32, visualization: u32 },
	#[error("interaction node {0} has no visualization counterpart")]
	UnregisteredInteraction(u32),
	#[error("visualization node {0} has no interaction counterpart")]
	UnregisteredVisualization(u32),
	#[error("{graph} graph has no node {id}")]
	UnknownNode { graph: &'static str, id: u32 },
	#[error("{graph} graph already has a root")]
	RootExists { graph: &'static str },
	#[error("invalid tree config: {field} {reason}")]
	InvalidConfig { field: &'static str, reason: &'static str },
}
