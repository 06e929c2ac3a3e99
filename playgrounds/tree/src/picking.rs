//! Off-screen interaction render target and its GPU read-back.
//!
//! A second camera, parented to the main one, renders only the interaction
//! meshes into a 32-bit float image the size of the window. The image is read
//! back every frame; picking answers from the most recent completed copy, so
//! results trail the rendered frame by the read-back latency.

use crate::camera::perspective;
use bevy::{
	asset::RenderAssetUsages,
	camera::{visibility::RenderLayers, ClearColorConfig, RenderTarget},
	core_pipeline::tonemapping::{DebandDither, Tonemapping},
	prelude::*,
	render::{
		gpu_readback::{Readback, ReadbackComplete},
		render_resource::{Extent3d, TextureDimension, TextureFormat, TextureUsages},
		view::Hdr,
	},
	window::{PrimaryWindow, WindowResized},
};
use tree_graph::{InteractionGraph, PickingTarget};

/// Render layer holding every interaction mesh.
pub const INTERACTION_LAYER: usize = 1;

const TEXEL_BYTES: usize = 16;

/// Latest read-back of the interaction target.
#[derive(Resource, Debug, Default)]
pub struct PickBuffer {
	data: Vec<u8>,
	size: UVec2,
}

impl PickBuffer {
	fn clear(&mut self, size: UVec2) {
		self.data.clear();
		self.size = size;
	}
}

impl PickingTarget for PickBuffer {
	// the GPU pass already ran this frame; only the read is left
	fn render_and_read(&mut self, _graph: &InteractionGraph, texel: UVec2) -> Option<[f32; 4]> {
		read_texel(&self.data, self.size, texel)
	}
}

/// Extracts one RGBA32F texel, addressed bottom-left, from a top-down image copy.
pub fn read_texel(data: &[u8], size: UVec2, texel: UVec2) -> Option<[f32; 4]> {
	if texel.x >= size.x || texel.y >= size.y || data.is_empty() {
		return None;
	}

	let height = size.y as usize;
	if data.len() % height != 0 {
		return None;
	}
	// rows may carry alignment padding
	let stride = data.len() / height;
	if stride < size.x as usize * TEXEL_BYTES {
		return None;
	}

	let row = height - 1 - texel.y as usize;
	let offset = row * stride + texel.x as usize * TEXEL_BYTES;
	let bytes = data.get(offset..offset + TEXEL_BYTES)?;
	Some(bytemuck::pod_read_unaligned::<[f32; 4]>(bytes))
}

#[derive(Resource, Debug, Clone)]
pub struct PickTarget {
	pub image: Handle<Image>,
}

fn pick_image(size: UVec2) -> Image {
	let extent = Extent3d { width: size.x.max(1), height: size.y.max(1), depth_or_array_layers: 1 };
	let mut image = Image::new_fill(
		extent,
		TextureDimension::D2,
		&[0; TEXEL_BYTES],
		TextureFormat::Rgba32Float,
		RenderAssetUsages::default(),
	);
	image.texture_descriptor.usage = TextureUsages::TEXTURE_BINDING
		| TextureUsages::COPY_SRC
		| TextureUsages::COPY_DST
		| TextureUsages::RENDER_ATTACHMENT;
	image
}

pub fn setup_pick_target(
	mut commands: Commands,
	mut images: ResMut<Assets<Image>>,
	window: Query<&Window, With<PrimaryWindow>>,
	main_camera: Query<Entity, With<crate::camera::OrbitController>>,
) {
	let Ok(window) = window.single() else {
		return;
	};
	let Ok(main_camera) = main_camera.single() else {
		log::error!("No main camera to attach the pick camera to");
		return;
	};

	let size = window.physical_size();
	let image = images.add(pick_image(size));
	log::info!("Created pick target of {}", size);

	commands.entity(main_camera).with_children(|parent| {
		parent.spawn((
			Camera3d::default(),
			Camera {
				order: -1,
				target: RenderTarget::Image(image.clone().into()),
				clear_color: ClearColorConfig::Custom(Color::NONE),
				..default()
			},
			perspective(),
			Transform::IDENTITY,
			// exact, unblended id values
			Hdr,
			Msaa::Off,
			Tonemapping::None,
			DebandDither::Disabled,
			RenderLayers::layer(INTERACTION_LAYER),
		));
	});

	commands.spawn(Readback::texture(image.clone())).observe(store_readback);
	commands.insert_resource(PickBuffer { data: Vec::new(), size });
	commands.insert_resource(PickTarget { image });
}

fn store_readback(event: On<ReadbackComplete>, mut buffer: ResMut<PickBuffer>) {
	buffer.data = event.to_vec();
}

/// Keeps the pick target the size of the window.
pub fn resize_pick_target(
	mut resized: MessageReader<WindowResized>,
	window: Query<&Window, With<PrimaryWindow>>,
	target: Res<PickTarget>,
	mut images: ResMut<Assets<Image>>,
	mut buffer: ResMut<PickBuffer>,
	mut tree: ResMut<crate::TreeState>,
) {
	if resized.read().count() == 0 {
		return;
	}
	let Ok(window) = window.single() else {
		return;
	};

	let size = window.physical_size();
	if size == buffer.size {
		return;
	}

	if let Some(image) = images.get_mut(&target.image) {
		image.resize(Extent3d { width: size.x.max(1), height: size.y.max(1), depth_or_array_layers: 1 });
	}
	// stale copies have the old layout
	buffer.clear(size);
	tree.update_render_target_size(size);
}
