use crate::{TreeState, TreeView};
use bevy::{camera::visibility::RenderLayers, prelude::*, window::PrimaryWindow};
use tree_graph::InteractionMode;

/// Buffers the latest cursor position, in physical pixels, on the tree.
pub fn track_cursor(window: Query<&Window, With<PrimaryWindow>>, mut tree: ResMut<TreeState>) {
	let Ok(window) = window.single() else {
		return;
	};

	match window.physical_cursor_position() {
		Some(cursor) => tree.set_mouse_position(cursor),
		None => tree.clear_mouse_position(),
	}
}

pub fn handle_keys(
	keyboard_input: Res<ButtonInput<KeyCode>>,
	mut tree: ResMut<TreeState>,
	mut view: ResMut<TreeView>,
	mut camera: Query<&mut RenderLayers, With<crate::camera::OrbitController>>,
) {
	if keyboard_input.just_pressed(KeyCode::KeyG) {
		if let Err(error) = tree.grow_another_level() {
			log::error!("Growing failed: {}", error);
		}
	}

	if keyboard_input.just_pressed(KeyCode::KeyV) {
		view.show_visualization = !view.show_visualization;
		let layer = if view.show_visualization { 0 } else { crate::picking::INTERACTION_LAYER };
		for mut layers in camera.iter_mut() {
			*layers = RenderLayers::layer(layer);
		}
		log::info!("Showing visualization: {}", view.show_visualization);
	}

	if keyboard_input.just_pressed(KeyCode::KeyM) {
		let mode = tree.mode().toggled();
		if let Err(error) = tree.set_mode(mode) {
			log::error!("Switching to {:?} failed: {}", mode, error);
		}
	}

	if tree.mode() == InteractionMode::Add {
		let step = tree.config().rotation_step;
		if keyboard_input.just_pressed(KeyCode::KeyW) {
			tree.rotate_potential_branch(step);
		}
		if keyboard_input.just_pressed(KeyCode::KeyS) {
			tree.rotate_potential_branch(-step);
		}
	}
}

pub fn handle_click(mouse_buttons: Res<ButtonInput<MouseButton>>, mut tree: ResMut<TreeState>) {
	if !mouse_buttons.just_pressed(MouseButton::Left) {
		return;
	}

	match tree.mode() {
		InteractionMode::Add => match tree.attach_potential_branch() {
			Ok(Some(_)) => {}
			Ok(None) => log::debug!("Nothing to attach"),
			Err(error) => log::error!("Attaching branch failed: {}", error),
		},
		InteractionMode::Select => {
			tree.toggle_selected();
		}
	}
}
