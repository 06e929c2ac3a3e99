use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::graph::{InteractionGraph, InteractionId, NodeSeed, VisualizationGraph, VisualizationId};
use crate::material::BranchMaterial;
use crate::picking::PickColor;
use bevy::prelude::*;

/// Level-derived mesh scale: radius and depth shrink by one factor, height by another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelScale {
	pub shrink_radius: f32,
	pub shrink_height: f32,
}

impl LevelScale {
	pub fn from_config(config: &TreeConfig) -> Self {
		Self { shrink_radius: config.shrink_radius, shrink_height: config.shrink_height }
	}

	pub fn scale_for(&self, level: u32) -> Vec3 {
		let radius = self.shrink_radius.powi(level as i32);
		let height = self.shrink_height.powi(level as i32);
		Vec3::new(radius, height, radius)
	}
}

/// One branch, present once in each graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchPair {
	pub interaction: InteractionId,
	pub visualization: VisualizationId,
}

/// Builds matching nodes in both graphs.
///
/// The interaction node gets a material encoding its own id, the visualization
/// node the shared display material. Registration is left to the caller.
#[derive(Debug, Clone)]
pub struct BranchPairFactory {
	scale: LevelScale,
}

impl BranchPairFactory {
	pub fn new(scale: LevelScale) -> Self {
		Self { scale }
	}

	pub fn level_scale(&self) -> &LevelScale {
		&self.scale
	}

	pub fn create_branch_pair(
		&self,
		interaction: &mut InteractionGraph,
		visualization: &mut VisualizationGraph,
		parents: Option<BranchPair>,
		transform: Transform,
		level: u32,
	) -> Result<BranchPair, TreeError> {
		let seed = NodeSeed { transform, scale: self.scale.scale_for(level), level };

		if let Some(parents) = parents {
			// validate both parents before touching either graph
			interaction.get(parents.interaction)?;
			visualization.get(parents.visualization)?;
		}

		let interaction_id = interaction.insert_with(parents.map(|p| p.interaction), seed, |id| {
			BranchMaterial::Interaction(PickColor::of(id))
		})?;
		let visualization_id = visualization.insert_with(
			parents.map(|p| p.visualization),
			seed,
			|_| BranchMaterial::Display,
		)?;

		Ok(BranchPair { interaction: interaction_id, visualization: visualization_id })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_scale_for_level() {
		let scale = LevelScale { shrink_radius: 0.5, shrink_height: 0.6 };
		assert_eq!(scale.scale_for(0), Vec3::ONE);
		assert_eq!(scale.scale_for(1), Vec3::new(0.5, 0.6, 0.5));
		assert_eq!(scale.scale_for(3), Vec3::new(0.125, 0.6f32.powi(3), 0.125));
	}

	#[test]
	fn test_pair_materials_and_scale() {
		let factory = BranchPairFactory::new(LevelScale::from_config(&TreeConfig::default()));
		let mut interaction = InteractionGraph::new(Transform::IDENTITY);
		let mut visualization = VisualizationGraph::new(Transform::IDENTITY);

		let root = factory
			.create_branch_pair(&mut interaction, &mut visualization, None, Transform::IDENTITY, 0)
			.unwrap();
		let child = factory
			.create_branch_pair(
				&mut interaction,
				&mut visualization,
				Some(root),
				Transform::from_xyz(0.0, 0.5, 0.0),
				1,
			)
			.unwrap();

		let interaction_node = interaction.get(child.interaction).unwrap();
		let visualization_node = visualization.get(child.visualization).unwrap();
		assert_eq!(
			interaction_node.material(),
			BranchMaterial::Interaction(PickColor::of(child.interaction))
		);
		assert_eq!(visualization_node.material(), BranchMaterial::Display);
		assert_eq!(interaction_node.scale(), Vec3::new(0.5, 0.6, 0.5));
		assert_eq!(interaction_node.scale(), visualization_node.scale());
		assert_eq!(interaction_node.transform(), visualization_node.transform());
		assert_eq!(interaction_node.parent(), Some(root.interaction));
	}

	#[test]
	fn test_unknown_parent_leaves_graphs_untouched() {
		let factory = BranchPairFactory::new(LevelScale::from_config(&TreeConfig::default()));
		let mut interaction = InteractionGraph::new(Transform::IDENTITY);
		let mut visualization = VisualizationGraph::new(Transform::IDENTITY);
		let root = factory
			.create_branch_pair(&mut interaction, &mut visualization, None, Transform::IDENTITY, 0)
			.unwrap();

		let bogus = BranchPair {
			interaction: root.interaction,
			visualization: VisualizationId::from_raw(9).unwrap(),
		};
		let result =
			factory.create_branch_pair(&mut interaction, &mut visualization, Some(bogus), Transform::IDENTITY, 1);
		assert!(result.is_err());
		assert_eq!(interaction.len(), 1);
		assert_eq!(visualization.len(), 1);
	}
}
