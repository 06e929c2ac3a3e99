use crate::config::{ChildrenCount, TreeConfig};
use crate::dual::DualGraph;
use crate::error::TreeError;
use crate::factory::{BranchPair, BranchPairFactory};
use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::TAU;

/// Grows every current leaf by one level of randomized, bounded branches.
#[derive(Debug, Clone)]
pub struct GrowthEngine {
	pub children: ChildrenCount,
	pub growing_portion: f32,
	pub deviation_factor: f32,
	pub branch_tilt: f32,
}

impl GrowthEngine {
	pub fn from_config(config: &TreeConfig) -> Self {
		Self {
			children: config.children,
			growing_portion: config.growing_portion,
			deviation_factor: config.deviation_factor,
			branch_tilt: config.branch_tilt,
		}
	}

	/// Attaches new children to every leaf of the interaction graph and its
	/// visualization counterpart. Existing nodes are never modified.
	pub fn grow_another_level<R: Rng + ?Sized>(
		&self,
		graphs: &mut DualGraph,
		factory: &BranchPairFactory,
		rng: &mut R,
	) -> Result<Vec<BranchPair>, TreeError> {
		let leaves = graphs.interaction().leaves();
		let mut grown = Vec::new();

		for leaf in leaves {
			let parents = BranchPair {
				interaction: leaf,
				visualization: graphs.registry().to_visualization(leaf)?,
			};
			let level = graphs.interaction().level_of(leaf)? + 1;
			let parent_length = graphs.interaction().get(leaf)?.length();
			let count = self.children.sample(rng);

			for transform in self.branch_transforms(parent_length, count, rng) {
				grown.push(graphs.spawn_pair(factory, parents, transform, level)?);
			}
		}

		log::info!("Grew {} branches", grown.len());
		Ok(grown)
	}

	/// Local transforms of `count` siblings on a parent of length `parent_length`.
	///
	/// Children are spread along the growing portion of the parent in equal
	/// segments and fanned around its axis, each jittered by up to
	/// `deviation_factor`, then bent off the axis by `branch_tilt`.
	pub fn branch_transforms<R: Rng + ?Sized>(
		&self,
		parent_length: f32,
		count: usize,
		rng: &mut R,
	) -> Vec<Transform> {
		if count == 0 {
			return Vec::new();
		}

		let n = count as f32;
		let base = parent_length * (1.0 - self.growing_portion);
		let segment = parent_length * self.growing_portion / n;
		// shared by all siblings of this parent
		let y_offset = TAU * self.deviation_factor * rng.random::<f32>() / n;

		(0..count)
			.map(|i| {
				let i = i as f32;
				let height = base + segment * (i + 0.5 + rng.random::<f32>() * self.deviation_factor);
				let yaw =
					y_offset + TAU * (1.0 + rng.random::<f32>() * self.deviation_factor) * i / n;

				Transform::from_xyz(0.0, height, 0.0).with_rotation(
					Quat::from_rotation_y(yaw) * Quat::from_rotation_z(self.branch_tilt),
				)
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::factory::LevelScale;
	use rand::{rngs::StdRng, SeedableRng};
	use std::collections::HashSet;

	fn setup(config: &TreeConfig) -> (DualGraph, BranchPairFactory, GrowthEngine) {
		let factory = BranchPairFactory::new(LevelScale::from_config(config));
		let graphs = DualGraph::new(Transform::IDENTITY, &factory).unwrap();
		(graphs, factory, GrowthEngine::from_config(config))
	}

	#[test]
	fn test_transforms_stay_in_growing_portion() {
		let engine = GrowthEngine::from_config(&TreeConfig::default());
		let mut rng = StdRng::seed_from_u64(1);

		for _ in 0..50 {
			let transforms = engine.branch_transforms(1.0, 4, &mut rng);
			assert_eq!(transforms.len(), 4);
			for (i, transform) in transforms.iter().enumerate() {
				let segment = 0.8 / 4.0;
				let low = 0.2 + segment * (i as f32 + 0.5);
				let high = low + segment * 0.2;
				let y = transform.translation.y;
				assert!(y >= low - 1e-6 && y <= high + 1e-6, "child {} at {}", i, y);
				assert_eq!(transform.translation.x, 0.0);
				assert_eq!(transform.translation.z, 0.0);
			}
		}
	}

	#[test]
	fn test_transforms_are_tilted() {
		let engine = GrowthEngine::from_config(&TreeConfig::default());
		let mut rng = StdRng::seed_from_u64(2);
		for transform in engine.branch_transforms(1.0, 3, &mut rng) {
			// the tilt bends the growth axis 60 degrees away from vertical
			let axis = transform.rotation * Vec3::Y;
			assert!((axis.dot(Vec3::Y) - 0.5).abs() < 1e-5);
		}
	}

	#[test]
	fn test_zero_children_is_noop() {
		let config = TreeConfig { children: ChildrenCount::Fixed(0), ..TreeConfig::default() };
		let (mut graphs, factory, engine) = setup(&config);
		let mut rng = StdRng::seed_from_u64(3);
		assert!(engine.grow_another_level(&mut graphs, &factory, &mut rng).unwrap().is_empty());
		assert_eq!(graphs.interaction().len(), 1);
	}

	#[test]
	fn test_growth_is_additive_and_consistent() {
		let config = TreeConfig::default();
		let (mut graphs, factory, engine) = setup(&config);
		let mut rng = StdRng::seed_from_u64(4);

		let before = graphs.interaction().get(graphs.root().interaction).unwrap().clone();
		engine.grow_another_level(&mut graphs, &factory, &mut rng).unwrap();
		let first_leaves: HashSet<_> = graphs.interaction().leaves().into_iter().collect();
		engine.grow_another_level(&mut graphs, &factory, &mut rng).unwrap();
		let second_leaves: HashSet<_> = graphs.interaction().leaves().into_iter().collect();

		let after = graphs.interaction().get(graphs.root().interaction).unwrap();
		assert_eq!(before.transform(), after.transform());
		assert_eq!(before.scale(), after.scale());

		assert_eq!(first_leaves.len(), 2);
		assert_eq!(second_leaves.len(), 4);
		assert!(first_leaves.is_disjoint(&second_leaves));
		assert_eq!(graphs.interaction().len(), 7);
		assert!(graphs.is_consistent());
	}

	#[test]
	fn test_random_children_every_leaf_grows() {
		let config =
			TreeConfig { children: ChildrenCount::Random { min: 2, max: 6 }, ..TreeConfig::default() };
		let (mut graphs, factory, engine) = setup(&config);
		let mut rng = StdRng::seed_from_u64(5);

		engine.grow_another_level(&mut graphs, &factory, &mut rng).unwrap();
		let leaves = graphs.interaction().leaves();
		engine.grow_another_level(&mut graphs, &factory, &mut rng).unwrap();

		for leaf in leaves {
			let children = graphs.interaction().get(leaf).unwrap().children().len();
			assert!((2..=6).contains(&children));
		}
		assert!(graphs.is_consistent());
	}
}
