use crate::error::TreeError;
use crate::factory::{BranchPair, BranchPairFactory};
use crate::graph::{InteractionGraph, VisualizationGraph, VisualizationId};
use crate::registry::DualGraphRegistry;
use bevy::prelude::*;

/// Both branch hierarchies together with the registry tying them.
///
/// Every mutation that adds nodes goes through [`DualGraph::spawn_pair`], so
/// the two trees only ever grow in lockstep.
#[derive(Debug, Clone)]
pub struct DualGraph {
	interaction: InteractionGraph,
	visualization: VisualizationGraph,
	registry: DualGraphRegistry,
	root: BranchPair,
}

impl DualGraph {
	/// Creates both graphs with a single registered level 0 branch.
	pub fn new(origin: Transform, factory: &BranchPairFactory) -> Result<Self, TreeError> {
		let mut interaction = InteractionGraph::new(origin);
		let mut visualization = VisualizationGraph::new(origin);
		let mut registry = DualGraphRegistry::new();

		let root =
			factory.create_branch_pair(&mut interaction, &mut visualization, None, Transform::IDENTITY, 0)?;
		registry.register(root.interaction, root.visualization)?;

		Ok(Self { interaction, visualization, registry, root })
	}

	pub fn interaction(&self) -> &InteractionGraph {
		&self.interaction
	}

	pub fn visualization(&self) -> &VisualizationGraph {
		&self.visualization
	}

	pub(crate) fn visualization_mut(&mut self) -> &mut VisualizationGraph {
		&mut self.visualization
	}

	pub fn registry(&self) -> &DualGraphRegistry {
		&self.registry
	}

	pub fn root(&self) -> BranchPair {
		self.root
	}

	/// Creates a branch pair under `parents` and registers it.
	pub fn spawn_pair(
		&mut self,
		factory: &BranchPairFactory,
		parents: BranchPair,
		transform: Transform,
		level: u32,
	) -> Result<BranchPair, TreeError> {
		let pair = factory.create_branch_pair(
			&mut self.interaction,
			&mut self.visualization,
			Some(parents),
			transform,
			level,
		)?;
		self.registry.register(pair.interaction, pair.visualization)?;
		Ok(pair)
	}

	/// The pair a visualization node belongs to.
	pub fn pair_of(&self, visualization: VisualizationId) -> Result<BranchPair, TreeError> {
		let interaction = self.registry.to_interaction(visualization)?;
		Ok(BranchPair { interaction, visualization })
	}

	/// Rotates a branch about its parent's growth axis in both graphs at once.
	pub fn rotate_pair_y(&mut self, visualization: VisualizationId, angle: f32) -> Result<(), TreeError> {
		let pair = self.pair_of(visualization)?;
		self.visualization.rotate_y(pair.visualization, angle)?;
		self.interaction.rotate_y(pair.interaction, angle)
	}

	/// Checks the registry bijection and that both trees have the same shape,
	/// with every registered pair placed identically.
	pub fn is_consistent(&self) -> bool {
		self.registry.is_bijective()
			&& self.registry.len() == self.interaction.len()
			&& self.registry.len() == self.visualization.len()
			&& self.interaction.shape() == self.visualization.shape()
			&& self.registry.pairs().all(|(interaction, visualization)| {
				match (self.interaction.get(interaction), self.visualization.get(visualization)) {
					(Ok(a), Ok(b)) => {
						a.transform() == b.transform()
							&& a.scale() == b.scale() && a.level() == b.level()
					}
					_ => false,
				}
			})
	}
}
