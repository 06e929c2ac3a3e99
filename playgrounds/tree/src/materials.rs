use bevy::{
	prelude::*, reflect::TypePath, render::render_resource::AsBindGroup, shader::ShaderRef,
};
use tree_graph::{BranchGeometry, BranchMaterial, PickColor, DISPLAY_COLOR, HIGHLIGHT_COLOR};

/// Unlit material writing a branch's encoded id as its fragment color.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct InteractionMaterial {
	#[uniform(0)]
	pub interaction_index: Vec4,
}

impl InteractionMaterial {
	pub fn new(color: PickColor) -> Self {
		Self { interaction_index: color.as_vec4() }
	}
}

impl Material for InteractionMaterial {
	fn fragment_shader() -> ShaderRef {
		"shaders/interaction_material.wgsl".into()
	}
}

/// Shared mesh and visualization materials, created once at startup.
#[derive(Resource, Debug, Clone)]
pub struct BranchAssets {
	pub mesh: Handle<Mesh>,
	pub display: Handle<StandardMaterial>,
	pub hover: Handle<StandardMaterial>,
	pub speculative: Handle<StandardMaterial>,
}

impl BranchAssets {
	/// Visualization material for a branch. Interaction materials are per branch
	/// and live in [`crate::sync`].
	pub fn visualization(&self, material: BranchMaterial) -> Handle<StandardMaterial> {
		match material {
			BranchMaterial::Hover => self.hover.clone(),
			BranchMaterial::Speculative => self.speculative.clone(),
			BranchMaterial::Display | BranchMaterial::Interaction(_) => self.display.clone(),
		}
	}
}

fn diffuse(color: Color) -> StandardMaterial {
	StandardMaterial { base_color: color, perceptual_roughness: 1.0, reflectance: 0.0, ..default() }
}

fn translucent(color: Color) -> StandardMaterial {
	StandardMaterial { alpha_mode: AlphaMode::Blend, ..diffuse(color) }
}

pub fn setup_branch_assets(
	mut commands: Commands,
	mut meshes: ResMut<Assets<Mesh>>,
	mut materials: ResMut<Assets<StandardMaterial>>,
) {
	let geometry = BranchGeometry::standard();

	// Capped cylinder whose base sits at the group origin
	let mesh = Cylinder::new(geometry.radius, geometry.height)
		.mesh()
		.resolution(geometry.resolution)
		.build()
		.translated_by(geometry.base_offset());

	log::info!("Created branch mesh with resolution {}", geometry.resolution);

	commands.insert_resource(BranchAssets {
		mesh: meshes.add(mesh),
		display: materials.add(diffuse(DISPLAY_COLOR)),
		hover: materials.add(translucent(HIGHLIGHT_COLOR)),
		speculative: materials.add(translucent(HIGHLIGHT_COLOR)),
	});
}
