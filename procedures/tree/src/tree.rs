use crate::config::TreeConfig;
use crate::controller::{InteractionController, InteractionMode, SpeculativeBranch};
use crate::dual::DualGraph;
use crate::error::TreeError;
use crate::factory::{BranchPair, BranchPairFactory, LevelScale};
use crate::graph::{InteractionId, VisualizationId};
use crate::growth::GrowthEngine;
use crate::material::BranchGeometry;
use crate::picking::{Picker, PickingTarget};
use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;

/// Owning context of the interactive tree.
///
/// Holds both graphs, the registry, every engine operating on them and the
/// transient interaction state. The host drives it once per frame:
/// [`InteractiveTree::render`] picks, then
/// [`InteractiveTree::perform_interaction`] updates the active mode.
#[derive(Debug, Clone)]
pub struct InteractiveTree {
	config: TreeConfig,
	geometry: BranchGeometry,
	graphs: DualGraph,
	factory: BranchPairFactory,
	growth: GrowthEngine,
	picker: Picker,
	controller: InteractionController,
	cursor: Option<Vec2>,
	interaction_index: Option<InteractionId>,
	rng: StdRng,
}

impl InteractiveTree {
	/// Builds a tree holding a single root branch pair.
	pub fn new(config: TreeConfig, viewport: UVec2, seed: u64) -> Result<Self, TreeError> {
		config.validate()?;
		let geometry = BranchGeometry::standard();
		let factory = BranchPairFactory::new(LevelScale::from_config(&config));
		let graphs = DualGraph::new(Transform::from_xyz(0.0, config.scene_offset, 0.0), &factory)?;
		let growth = GrowthEngine::from_config(&config);
		let controller = InteractionController::new(&config, geometry);

		log::info!("Created tree with seed {} and viewport {}", seed, viewport);

		Ok(Self {
			config,
			geometry,
			graphs,
			factory,
			growth,
			picker: Picker::new(viewport),
			controller,
			cursor: None,
			interaction_index: None,
			rng: StdRng::seed_from_u64(seed),
		})
	}

	pub fn config(&self) -> &TreeConfig {
		&self.config
	}

	pub fn geometry(&self) -> &BranchGeometry {
		&self.geometry
	}

	pub fn graphs(&self) -> &DualGraph {
		&self.graphs
	}

	pub fn picker(&self) -> &Picker {
		&self.picker
	}

	pub fn grow_another_level(&mut self) -> Result<Vec<BranchPair>, TreeError> {
		self.growth.grow_another_level(&mut self.graphs, &self.factory, &mut self.rng)
	}

	/// Renders the interaction graph and picks the node under the cursor.
	///
	/// Picking only happens while the visualization is shown and both cursor
	/// coordinates are known; otherwise the frame has no pick.
	pub fn render<T: PickingTarget + ?Sized>(&mut self, target: &mut T, show_visualization: bool) {
		self.interaction_index = match (show_visualization, self.cursor) {
			(true, Some(cursor)) => {
				self.picker.render_and_pick(target, self.graphs.interaction(), cursor)
			}
			_ => None,
		};
		log::debug!("Picked {:?}", self.interaction_index);
	}

	/// Runs the active mode's per-frame update with the latest pick.
	///
	/// `ray` is the world-space ray under the cursor, used for placement in add mode.
	pub fn perform_interaction(&mut self, ray: Option<Ray3d>) -> Result<(), TreeError> {
		match self.controller.mode() {
			InteractionMode::Add => {
				self.controller.update_add_mode(&self.graphs, self.interaction_index, ray)
			}
			InteractionMode::Select => {
				self.controller.update_select_mode(&mut self.graphs, self.interaction_index)
			}
		}
	}

	/// Call between frames whenever the viewport changes size.
	pub fn update_render_target_size(&mut self, size: UVec2) {
		self.picker.resize(size);
	}

	pub fn rotate_potential_branch(&mut self, angle: f32) {
		self.controller.rotate_speculative(angle);
	}

	pub fn attach_potential_branch(&mut self) -> Result<Option<BranchPair>, TreeError> {
		self.controller.commit_speculative(&mut self.graphs, &self.factory)
	}

	pub fn rotate_hovered_branch(&mut self, angle: f32) -> Result<bool, TreeError> {
		self.controller.rotate_hovered(&mut self.graphs, angle)
	}

	pub fn has_hovered_visualization_group(&self) -> bool {
		self.controller.last_hovered().is_some()
	}

	pub fn potential_branch_visible(&self) -> bool {
		self.controller.speculative().is_visible()
	}

	pub fn set_mouse_position(&mut self, cursor: Vec2) {
		self.cursor = Some(cursor);
	}

	pub fn clear_mouse_position(&mut self) {
		self.cursor = None;
	}

	pub fn mouse_position(&self) -> Option<Vec2> {
		self.cursor
	}

	pub fn picked(&self) -> Option<InteractionId> {
		self.interaction_index
	}

	pub fn mode(&self) -> InteractionMode {
		self.controller.mode()
	}

	pub fn set_mode(&mut self, mode: InteractionMode) -> Result<(), TreeError> {
		self.controller.set_mode(&mut self.graphs, mode)
	}

	pub fn speculative(&self) -> &SpeculativeBranch {
		self.controller.speculative()
	}

	pub fn hovered(&self) -> Option<VisualizationId> {
		self.controller.last_hovered()
	}

	pub fn is_selected(&self) -> bool {
		self.controller.is_selected()
	}

	pub fn toggle_selected(&mut self) -> bool {
		self.controller.toggle_selected()
	}

	/// Advances the selection rotation; returns how many rotation steps ran.
	pub fn tick_selection(&mut self, delta: Duration) -> Result<u32, TreeError> {
		self.controller.tick_selection(&mut self.graphs, delta)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::picking::PickColor;

	/// Answers every read with the encoded color of a fixed id.
	struct Always(Option<u32>);

	impl PickingTarget for Always {
		fn render_and_read(&mut self, _graph: &crate::graph::InteractionGraph, _texel: UVec2) -> Option<[f32; 4]> {
			Some(self.0.map_or([0.0; 4], |id| PickColor::encode(id).rgba()))
		}
	}

	fn tree() -> InteractiveTree {
		InteractiveTree::new(TreeConfig::default(), UVec2::new(800, 600), 7).unwrap()
	}

	#[test]
	fn test_new_rejects_invalid_config() {
		let config = TreeConfig { selection_period_ms: 0, ..TreeConfig::default() };
		assert!(matches!(
			InteractiveTree::new(config, UVec2::new(800, 600), 7),
			Err(TreeError::InvalidConfig { field: "selection_period_ms", .. })
		));
	}

	#[test]
	fn test_render_requires_cursor() {
		let mut tree = tree();
		tree.render(&mut Always(Some(1)), true);
		assert_eq!(tree.picked(), None);

		tree.set_mouse_position(Vec2::new(10.0, 10.0));
		tree.render(&mut Always(Some(1)), true);
		assert_eq!(tree.picked(), Some(tree.graphs().root().interaction));

		tree.clear_mouse_position();
		tree.render(&mut Always(Some(1)), true);
		assert_eq!(tree.picked(), None);
	}

	#[test]
	fn test_interaction_view_skips_picking() {
		let mut tree = tree();
		tree.set_mouse_position(Vec2::new(10.0, 10.0));
		tree.render(&mut Always(Some(1)), false);
		assert_eq!(tree.picked(), None);
	}

	#[test]
	fn test_cursor_outside_resized_target() {
		let mut tree = tree();
		tree.set_mouse_position(Vec2::new(500.0, 100.0));
		tree.update_render_target_size(UVec2::new(400, 300));
		tree.render(&mut Always(Some(1)), true);
		assert_eq!(tree.picked(), None);
	}

	#[test]
	fn test_select_mode_hover_and_rotate() {
		let mut tree = tree();
		tree.set_mode(InteractionMode::Select).unwrap();
		tree.set_mouse_position(Vec2::new(10.0, 10.0));
		tree.render(&mut Always(Some(1)), true);
		tree.perform_interaction(None).unwrap();

		assert!(tree.has_hovered_visualization_group());
		assert_eq!(tree.rotate_hovered_branch(0.5), Ok(true));
		assert!(tree.graphs().is_consistent());

		tree.render(&mut Always(None), true);
		tree.perform_interaction(None).unwrap();
		assert!(!tree.has_hovered_visualization_group());
		assert_eq!(tree.rotate_hovered_branch(0.5), Ok(false));
	}

	#[test]
	fn test_same_seed_grows_same_tree() {
		let mut a = tree();
		let mut b = tree();
		a.grow_another_level().unwrap();
		b.grow_another_level().unwrap();

		for (x, y) in a.graphs().visualization().iter().zip(b.graphs().visualization().iter()) {
			assert_eq!(x.transform(), y.transform());
		}
	}
}
