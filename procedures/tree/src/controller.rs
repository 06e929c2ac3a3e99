use crate::config::TreeConfig;
use crate::dual::DualGraph;
use crate::error::TreeError;
use crate::factory::{BranchPair, BranchPairFactory, LevelScale};
use crate::graph::{InteractionId, VisualizationId};
use crate::material::{BranchGeometry, BranchMaterial};
use crate::ray::ray_hits_branch;
use bevy::prelude::*;
use std::time::Duration;

/// The two mutually exclusive ways the pointer interacts with the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
	/// Position a speculative branch on the hovered branch and commit it.
	#[default]
	Add,
	/// Highlight the hovered branch and rotate it while selected.
	Select,
}

impl InteractionMode {
	pub fn toggled(self) -> Self {
		match self {
			Self::Add => Self::Select,
			Self::Select => Self::Add,
		}
	}
}

/// The single, reused branch that follows the pointer in add mode.
///
/// It lives beside the graphs rather than inside them: it is attached to at
/// most one visualization node at a time and is never registered.
#[derive(Debug, Clone)]
pub struct SpeculativeBranch {
	parent: Option<VisualizationId>,
	height: f32,
	yaw: f32,
	tilt: f32,
	level: u32,
	scale: Vec3,
	visible: bool,
}

impl SpeculativeBranch {
	pub fn new(tilt: f32) -> Self {
		Self { parent: None, height: 0.0, yaw: 0.0, tilt, level: 0, scale: Vec3::ONE, visible: false }
	}

	pub fn parent(&self) -> Option<VisualizationId> {
		self.parent
	}

	pub fn is_visible(&self) -> bool {
		self.visible
	}

	pub fn level(&self) -> u32 {
		self.level
	}

	pub fn scale(&self) -> Vec3 {
		self.scale
	}

	pub fn yaw(&self) -> f32 {
		self.yaw
	}

	/// Local transform under the current parent.
	pub fn transform(&self) -> Transform {
		Transform::from_xyz(0.0, self.height, 0.0)
			.with_rotation(Quat::from_rotation_y(self.yaw) * Quat::from_rotation_z(self.tilt))
	}

	fn place(&mut self, parent: VisualizationId, level: u32, scale: Vec3, height: f32) {
		self.parent = Some(parent);
		self.level = level;
		self.scale = scale;
		self.height = height;
		self.visible = true;
	}

	fn detach(&mut self) {
		self.parent = None;
		self.visible = false;
	}

	/// Turns the branch about the parent's axis; ignored while detached.
	pub fn rotate(&mut self, angle: f32) {
		if self.parent.is_some() {
			self.yaw += angle;
		}
	}
}

/// State machine for add and select interaction.
///
/// Mutates only materials, transforms and the speculative branch, except for
/// [`InteractionController::commit_speculative`] which adds one branch pair.
#[derive(Debug, Clone)]
pub struct InteractionController {
	mode: InteractionMode,
	speculative: SpeculativeBranch,
	last_hovered: Option<VisualizationId>,
	selected: bool,
	selection_timer: Timer,
	selection_angle: f32,
	geometry: BranchGeometry,
	scale: LevelScale,
}

impl InteractionController {
	pub fn new(config: &TreeConfig, geometry: BranchGeometry) -> Self {
		Self {
			mode: InteractionMode::default(),
			speculative: SpeculativeBranch::new(config.speculative_tilt),
			last_hovered: None,
			selected: false,
			selection_timer: Timer::new(config.selection_period(), TimerMode::Repeating),
			selection_angle: config.selection_angle,
			geometry,
			scale: LevelScale::from_config(config),
		}
	}

	pub fn mode(&self) -> InteractionMode {
		self.mode
	}

	pub fn speculative(&self) -> &SpeculativeBranch {
		&self.speculative
	}

	pub fn last_hovered(&self) -> Option<VisualizationId> {
		self.last_hovered
	}

	pub fn is_selected(&self) -> bool {
		self.selected
	}

	/// Switches mode, clearing whatever the previous mode left on screen.
	pub fn set_mode(&mut self, graphs: &mut DualGraph, mode: InteractionMode) -> Result<(), TreeError> {
		if self.mode == mode {
			return Ok(());
		}

		match self.mode {
			InteractionMode::Add => self.speculative.detach(),
			InteractionMode::Select => {
				self.selected = false;
				self.clear_hover(graphs)?;
			}
		}

		log::info!("Interaction mode: {:?} -> {:?}", self.mode, mode);
		self.mode = mode;
		Ok(())
	}

	/// Per-frame add mode update.
	///
	/// A picked branch that the cursor ray actually hits receives the
	/// speculative branch at the hit height; anything else detaches it.
	pub fn update_add_mode(
		&mut self,
		graphs: &DualGraph,
		picked: Option<InteractionId>,
		ray: Option<Ray3d>,
	) -> Result<(), TreeError> {
		let (Some(picked), Some(ray)) = (picked, ray) else {
			self.speculative.detach();
			return Ok(());
		};

		let interaction = graphs.interaction();
		let Some(hit) = ray_hits_branch(ray, interaction.mesh_matrix(picked)?, &self.geometry) else {
			self.speculative.detach();
			return Ok(());
		};

		let parent = graphs.registry().to_visualization(picked)?;
		let local = interaction.world_matrix(picked)?.inverse().transform_point3(hit);
		let level = graphs.visualization().level_of(parent)? + 1;

		self.speculative.place(parent, level, self.scale.scale_for(level), local.y);
		Ok(())
	}

	/// Per-frame select mode update. Hover is frozen while a branch is selected.
	pub fn update_select_mode(
		&mut self,
		graphs: &mut DualGraph,
		picked: Option<InteractionId>,
	) -> Result<(), TreeError> {
		if self.selected {
			return Ok(());
		}

		self.clear_hover(graphs)?;

		if let Some(picked) = picked {
			let hovered = graphs.registry().to_visualization(picked)?;
			graphs.visualization_mut().set_subtree_material(hovered, BranchMaterial::Hover)?;
			self.last_hovered = Some(hovered);
		}

		Ok(())
	}

	fn clear_hover(&mut self, graphs: &mut DualGraph) -> Result<(), TreeError> {
		if let Some(previous) = self.last_hovered.take() {
			graphs.visualization_mut().set_subtree_material(previous, BranchMaterial::Display)?;
		}
		Ok(())
	}

	pub fn rotate_speculative(&mut self, angle: f32) {
		self.speculative.rotate(angle);
	}

	/// Turns the speculative branch into a real branch pair under its parent.
	///
	/// The speculative branch itself is left as it is, ready for reuse.
	pub fn commit_speculative(
		&mut self,
		graphs: &mut DualGraph,
		factory: &BranchPairFactory,
	) -> Result<Option<BranchPair>, TreeError> {
		let Some(parent) = self.speculative.parent.filter(|_| self.speculative.visible) else {
			return Ok(None);
		};

		let parents = graphs.pair_of(parent)?;
		let pair =
			graphs.spawn_pair(factory, parents, self.speculative.transform(), self.speculative.level)?;

		log::info!("Committed speculative branch as {:?}", pair);
		Ok(Some(pair))
	}

	/// Rotates the hovered branch in both graphs. Returns whether anything turned.
	pub fn rotate_hovered(&mut self, graphs: &mut DualGraph, angle: f32) -> Result<bool, TreeError> {
		let Some(hovered) = self.last_hovered else { return Ok(false) };
		graphs.rotate_pair_y(hovered, angle)?;
		Ok(true)
	}

	/// Toggles rotation of the hovered branch; selecting requires a hover.
	pub fn toggle_selected(&mut self) -> bool {
		self.selected = !self.selected && self.last_hovered.is_some();
		self.selection_timer.reset();
		log::info!("Branch selection: {}", self.selected);
		self.selected
	}

	/// Advances the selection timer and rotates by one step per elapsed period,
	/// applied as a single turn.
	pub fn tick_selection(&mut self, graphs: &mut DualGraph, delta: Duration) -> Result<u32, TreeError> {
		if !self.selected {
			return Ok(0);
		}

		self.selection_timer.tick(delta);
		let ticks = self.selection_timer.times_finished_this_tick();
		if ticks > 0 {
			self.rotate_hovered(graphs, self.selection_angle * ticks as f32)?;
		}
		Ok(ticks)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Fixture {
		graphs: DualGraph,
		factory: BranchPairFactory,
		controller: InteractionController,
	}

	fn fixture() -> Fixture {
		let config = TreeConfig::default();
		let factory = BranchPairFactory::new(LevelScale::from_config(&config));
		let graphs = DualGraph::new(Transform::from_xyz(0.0, config.scene_offset, 0.0), &factory).unwrap();
		let controller = InteractionController::new(&config, BranchGeometry::standard());
		Fixture { graphs, factory, controller }
	}

	fn ray_at_height(y: f32) -> Ray3d {
		Ray3d::new(Vec3::new(0.0, y, 2.0), Dir3::NEG_Z)
	}

	#[test]
	fn test_add_mode_places_on_hit() {
		let mut f = fixture();
		let root = f.graphs.root();

		f.controller.update_add_mode(&f.graphs, Some(root.interaction), Some(ray_at_height(0.0))).unwrap();

		let speculative = f.controller.speculative();
		assert_eq!(speculative.parent(), Some(root.visualization));
		assert!(speculative.is_visible());
		assert_eq!(speculative.level(), 1);
		assert_eq!(speculative.scale(), Vec3::new(0.5, 0.6, 0.5));
		// the root spans world y -0.5..0.5, so world 0 is local 0.5
		assert!((speculative.transform().translation.y - 0.5).abs() < 1e-5);
	}

	#[test]
	fn test_add_mode_miss_detaches() {
		let mut f = fixture();
		let root = f.graphs.root();
		f.controller.update_add_mode(&f.graphs, Some(root.interaction), Some(ray_at_height(0.0))).unwrap();

		f.controller.update_add_mode(&f.graphs, Some(root.interaction), Some(ray_at_height(3.0))).unwrap();
		assert!(!f.controller.speculative().is_visible());
		assert_eq!(f.controller.speculative().parent(), None);
	}

	#[test]
	fn test_rotate_speculative_requires_parent() {
		let mut f = fixture();
		f.controller.rotate_speculative(0.5);
		assert_eq!(f.controller.speculative().yaw(), 0.0);

		let root = f.graphs.root();
		f.controller.update_add_mode(&f.graphs, Some(root.interaction), Some(ray_at_height(0.0))).unwrap();
		f.controller.rotate_speculative(0.5);
		assert_eq!(f.controller.speculative().yaw(), 0.5);
	}

	#[test]
	fn test_commit_without_placement_is_noop() {
		let mut f = fixture();
		assert_eq!(f.controller.commit_speculative(&mut f.graphs, &f.factory), Ok(None));
		assert_eq!(f.graphs.interaction().len(), 1);
	}

	#[test]
	fn test_commit_copies_placement() {
		let mut f = fixture();
		let root = f.graphs.root();
		f.controller.update_add_mode(&f.graphs, Some(root.interaction), Some(ray_at_height(0.2))).unwrap();
		f.controller.rotate_speculative(0.25);

		let pair = f.controller.commit_speculative(&mut f.graphs, &f.factory).unwrap().unwrap();

		let visualization = f.graphs.visualization().get(pair.visualization).unwrap();
		let interaction = f.graphs.interaction().get(pair.interaction).unwrap();
		assert_eq!(*visualization.transform(), f.controller.speculative().transform());
		assert_eq!(visualization.parent(), Some(root.visualization));
		assert_eq!(interaction.parent(), Some(root.interaction));
		assert_eq!(visualization.material(), BranchMaterial::Display);
		assert!(matches!(interaction.material(), BranchMaterial::Interaction(_)));
		assert!(f.controller.speculative().is_visible());
		assert!(f.graphs.is_consistent());
	}

	#[test]
	fn test_select_mode_hover_moves() {
		let mut f = fixture();
		let root = f.graphs.root();
		let child = f.graphs.spawn_pair(&f.factory, root, Transform::from_xyz(0.0, 0.5, 0.0), 1).unwrap();
		f.controller.set_mode(&mut f.graphs, InteractionMode::Select).unwrap();

		f.controller.update_select_mode(&mut f.graphs, Some(root.interaction)).unwrap();
		let material = |graphs: &DualGraph, id| graphs.visualization().get(id).unwrap().material();
		assert_eq!(material(&f.graphs, root.visualization), BranchMaterial::Hover);
		assert_eq!(material(&f.graphs, child.visualization), BranchMaterial::Hover);

		f.controller.update_select_mode(&mut f.graphs, Some(child.interaction)).unwrap();
		assert_eq!(material(&f.graphs, root.visualization), BranchMaterial::Display);
		assert_eq!(material(&f.graphs, child.visualization), BranchMaterial::Hover);
		assert_eq!(f.controller.last_hovered(), Some(child.visualization));

		f.controller.update_select_mode(&mut f.graphs, None).unwrap();
		assert_eq!(material(&f.graphs, child.visualization), BranchMaterial::Display);
		assert_eq!(f.controller.last_hovered(), None);
	}

	#[test]
	fn test_selection_freezes_hover_and_rotates_on_ticks() {
		let mut f = fixture();
		let root = f.graphs.root();
		let child = f.graphs.spawn_pair(&f.factory, root, Transform::from_xyz(0.0, 0.5, 0.0), 1).unwrap();
		f.controller.set_mode(&mut f.graphs, InteractionMode::Select).unwrap();
		f.controller.update_select_mode(&mut f.graphs, Some(child.interaction)).unwrap();

		assert!(f.controller.toggle_selected());
		f.controller.update_select_mode(&mut f.graphs, Some(root.interaction)).unwrap();
		assert_eq!(f.controller.last_hovered(), Some(child.visualization));

		let ticks = f.controller.tick_selection(&mut f.graphs, Duration::from_millis(250)).unwrap();
		assert_eq!(ticks, 2);
		let expected = Quat::from_rotation_y(0.1);
		let visualization = f.graphs.visualization().get(child.visualization).unwrap().transform().rotation;
		let interaction = f.graphs.interaction().get(child.interaction).unwrap().transform().rotation;
		assert!(visualization.abs_diff_eq(expected, 1e-5));
		assert!(interaction.abs_diff_eq(expected, 1e-5));

		assert!(!f.controller.toggle_selected());
		assert_eq!(f.controller.tick_selection(&mut f.graphs, Duration::from_secs(1)).unwrap(), 0);
	}

	#[test]
	fn test_add_mode_places_on_deep_branch() {
		let mut f = fixture();
		let mut parents = f.graphs.root();
		for level in 1..=9 {
			parents = f.graphs.spawn_pair(&f.factory, parents, Transform::IDENTITY, level).unwrap();
		}
		let height = f.graphs.interaction().get(parents.interaction).unwrap().length();
		let ray = ray_at_height(-0.5 + height * 0.5);

		f.controller.update_add_mode(&f.graphs, Some(parents.interaction), Some(ray)).unwrap();

		let speculative = f.controller.speculative();
		assert!(speculative.is_visible());
		assert_eq!(speculative.parent(), Some(parents.visualization));
		assert_eq!(speculative.level(), 10);
		assert!((speculative.transform().translation.y - height * 0.5).abs() < 1e-5);
	}

	#[test]
	fn test_zero_selection_period_rotates_once_per_tick() {
		let config = TreeConfig { selection_period_ms: 0, ..TreeConfig::default() };
		let factory = BranchPairFactory::new(LevelScale::from_config(&config));
		let mut graphs = DualGraph::new(Transform::IDENTITY, &factory).unwrap();
		let mut controller = InteractionController::new(&config, BranchGeometry::standard());
		let root = graphs.root();
		controller.set_mode(&mut graphs, InteractionMode::Select).unwrap();
		controller.update_select_mode(&mut graphs, Some(root.interaction)).unwrap();
		assert!(controller.toggle_selected());

		let ticks = controller.tick_selection(&mut graphs, Duration::from_millis(16)).unwrap();
		assert_eq!(ticks, 16);
		let rotation = graphs.visualization().get(root.visualization).unwrap().transform().rotation;
		assert!(rotation.abs_diff_eq(Quat::from_rotation_y(0.05 * 16.0), 1e-4));
	}

	#[test]
	fn test_selection_requires_hover() {
		let mut f = fixture();
		f.controller.set_mode(&mut f.graphs, InteractionMode::Select).unwrap();
		assert!(!f.controller.toggle_selected());
		assert!(!f.controller.is_selected());
	}

	#[test]
	fn test_leaving_select_mode_clears_hover() {
		let mut f = fixture();
		let root = f.graphs.root();
		f.controller.set_mode(&mut f.graphs, InteractionMode::Select).unwrap();
		f.controller.update_select_mode(&mut f.graphs, Some(root.interaction)).unwrap();

		f.controller.set_mode(&mut f.graphs, InteractionMode::Add).unwrap();
		assert_eq!(f.controller.last_hovered(), None);
		let material = f.graphs.visualization().get(root.visualization).unwrap().material();
		assert_eq!(material, BranchMaterial::Display);
	}
}
