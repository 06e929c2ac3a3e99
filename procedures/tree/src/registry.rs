use crate::error::TreeError;
use crate::graph::{InteractionId, VisualizationId};
use std::collections::HashMap;

/// Bidirectional index between interaction and visualization nodes.
///
/// This is the only place where cross-graph correspondence is recorded; it is
/// never inferred from positions in the trees.
#[derive(Debug, Clone, Default)]
pub struct DualGraphRegistry {
	to_visualization: HashMap<InteractionId, VisualizationId>,
	to_interaction: HashMap<VisualizationId, InteractionId>,
}

impl DualGraphRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records both directions of a pair. Either node already being known is a
	/// contract violation and leaves the registry untouched.
	pub fn register(
		&mut self,
		interaction: InteractionId,
		visualization: VisualizationId,
	) -> Result<(), TreeError> {
		if self.to_visualization.contains_key(&interaction)
			|| self.to_interaction.contains_key(&visualization)
		{
			return Err(TreeError::AlreadyRegistered {
				interaction: interaction.raw(),
				visualization: visualization.raw(),
			});
		}

		self.to_visualization.insert(interaction, visualization);
		self.to_interaction.insert(visualization, interaction);
		Ok(())
	}

	pub fn to_visualization(&self, interaction: InteractionId) -> Result<VisualizationId, TreeError> {
		self.to_visualization
			.get(&interaction)
			.copied()
			.ok_or(TreeError::UnregisteredInteraction(interaction.raw()))
	}

	pub fn to_interaction(&self, visualization: VisualizationId) -> Result<InteractionId, TreeError> {
		self.to_interaction
			.get(&visualization)
			.copied()
			.ok_or(TreeError::UnregisteredVisualization(visualization.raw()))
	}

	/// Number of registered pairs.
	pub fn len(&self) -> usize {
		self.to_visualization.len()
	}

	pub fn is_empty(&self) -> bool {
		self.to_visualization.is_empty()
	}

	pub fn pairs(&self) -> impl Iterator<Item = (InteractionId, VisualizationId)> + '_ {
		self.to_visualization.iter().map(|(interaction, visualization)| (*interaction, *visualization))
	}

	/// Both maps are exact inverses of each other.
	pub fn is_bijective(&self) -> bool {
		self.to_visualization.len() == self.to_interaction.len()
			&& self
				.pairs()
				.all(|(interaction, visualization)| {
					self.to_interaction.get(&visualization) == Some(&interaction)
				})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ids(interaction: u32, visualization: u32) -> (InteractionId, VisualizationId) {
		(InteractionId::from_raw(interaction).unwrap(), VisualizationId::from_raw(visualization).unwrap())
	}

	#[test]
	fn test_register_and_lookup() {
		let mut registry = DualGraphRegistry::new();
		let (interaction, visualization) = ids(1, 1);
		registry.register(interaction, visualization).unwrap();

		assert_eq!(registry.to_visualization(interaction), Ok(visualization));
		assert_eq!(registry.to_interaction(visualization), Ok(interaction));
		assert_eq!(registry.len(), 1);
		assert!(registry.is_bijective());
	}

	#[test]
	fn test_double_registration_rejected() {
		let mut registry = DualGraphRegistry::new();
		let (interaction, visualization) = ids(1, 1);
		let (_, other_visualization) = ids(2, 2);
		registry.register(interaction, visualization).unwrap();

		let result = registry.register(interaction, other_visualization);
		assert_eq!(result, Err(TreeError::AlreadyRegistered { interaction: 1, visualization: 2 }));
		assert_eq!(registry.len(), 1);
		assert!(registry.is_bijective());
	}

	#[test]
	fn test_unregistered_lookup() {
		let registry = DualGraphRegistry::new();
		let (interaction, visualization) = ids(3, 4);
		assert_eq!(registry.to_visualization(interaction), Err(TreeError::UnregisteredInteraction(3)));
		assert_eq!(registry.to_interaction(visualization), Err(TreeError::UnregisteredVisualization(4)));
	}
}
