use bevy::{prelude::*, window::PrimaryWindow};
use tree_graph::{InteractiveTree, TreeConfig};

mod camera;
mod input;
mod materials;
mod picking;
mod sync;
mod ui;

pub use camera::OrbitController;
pub use materials::InteractionMaterial;
pub use picking::{read_texel, PickBuffer};

/// Sky and ground colors of the hemisphere-style lighting.
const SKY_COLOR: Color = Color::srgb(1.0, 1.0, 0.733);
const GROUND_COLOR: Color = Color::srgb(0.031, 0.031, 0.125);

pub struct TreePlugin {
	pub seed: u64,
	pub config: TreeConfig,
}

/// Settings the tree is built from once the window exists.
#[derive(Resource, Debug, Clone)]
struct TreeSettings {
	seed: u64,
	config: TreeConfig,
}

/// The interactive tree driven by the frame loop.
#[derive(Resource, Debug, Deref, DerefMut)]
pub struct TreeState(pub InteractiveTree);

/// Whether the screen shows the visualization or the interaction graph.
#[derive(Resource, Debug, Clone, Copy)]
pub struct TreeView {
	pub show_visualization: bool,
}

impl Default for TreeView {
	fn default() -> Self {
		Self { show_visualization: true }
	}
}

impl Plugin for TreePlugin {
	fn build(&self, app: &mut App) {
		app.add_plugins(MaterialPlugin::<InteractionMaterial>::default());

		app.insert_resource(ClearColor(Color::BLACK))
			.insert_resource(TreeSettings { seed: self.seed, config: self.config.clone() })
			.init_resource::<TreeView>()
			.add_systems(
				Startup,
				(
					(camera::setup_camera, setup_lighting, ui::setup_status_ui, materials::setup_branch_assets),
					setup_tree,
					(picking::setup_pick_target, sync::setup_branch_entities)
						.run_if(resource_exists::<TreeState>),
				)
					.chain(),
			)
			.add_systems(
				Update,
				(
					camera::camera_controller,
					input::track_cursor,
					input::handle_keys,
					picking::resize_pick_target,
					pick_branch,
					perform_interaction,
					input::handle_click,
					tick_selection,
					sync::sync_branches,
					ui::update_status_display,
				)
					.chain()
					.run_if(resource_exists::<TreeState>)
					.run_if(resource_exists::<PickBuffer>)
					.run_if(resource_exists::<sync::BranchEntities>),
			);
	}
}

fn setup_tree(
	mut commands: Commands,
	settings: Res<TreeSettings>,
	window: Query<&Window, With<PrimaryWindow>>,
) {
	let viewport = window.single().map(|window| window.physical_size()).unwrap_or(UVec2::new(1280, 720));

	match InteractiveTree::new(settings.config.clone(), viewport, settings.seed) {
		Ok(tree) => commands.insert_resource(TreeState(tree)),
		Err(error) => log::error!("Failed to create tree: {}", error),
	}
}

fn setup_lighting(mut commands: Commands) {
	// Ground color from every direction
	commands.insert_resource(AmbientLight {
		color: GROUND_COLOR,
		brightness: 400.0,
		affects_lightmapped_meshes: true,
	});

	// Sky color from straight above
	commands.spawn((
		DirectionalLight { color: SKY_COLOR, illuminance: 3000.0, shadows_enabled: false, ..default() },
		Transform::from_xyz(0.0, 10.0, 0.0).looking_at(Vec3::ZERO, Vec3::Z),
	));
}

fn pick_branch(mut tree: ResMut<TreeState>, mut buffer: ResMut<PickBuffer>, view: Res<TreeView>) {
	tree.render(&mut *buffer, view.show_visualization);
}

fn perform_interaction(
	mut tree: ResMut<TreeState>,
	window: Query<&Window, With<PrimaryWindow>>,
	camera: Query<(&Camera, &GlobalTransform), With<OrbitController>>,
) {
	let ray = match (window.single(), camera.single()) {
		(Ok(window), Ok((camera, transform))) => window
			.cursor_position()
			.and_then(|cursor| camera.viewport_to_world(transform, cursor).ok()),
		_ => None,
	};

	if let Err(error) = tree.perform_interaction(ray) {
		log::error!("Interaction update failed: {}", error);
	}
}

fn tick_selection(time: Res<Time>, mut tree: ResMut<TreeState>) {
	if let Err(error) = tree.tick_selection(time.delta()) {
		log::error!("Rotating selection failed: {}", error);
	}
}
