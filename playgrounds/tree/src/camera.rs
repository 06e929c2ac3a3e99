use bevy::camera::visibility::RenderLayers;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use std::f32::consts::PI;

/// Orbits the camera around a target: right drag turns, the wheel zooms.
#[derive(Component)]
pub struct OrbitController {
	pub target: Vec3,
	pub radius: f32,
	pub sensitivity: f32,
	pub zoom_speed: f32,
	pub yaw: f32,
	pub pitch: f32,
}

impl OrbitController {
	fn looking_from(position: Vec3, target: Vec3) -> Self {
		let offset = position - target;
		let radius = offset.length();
		Self {
			target,
			radius,
			sensitivity: 0.005,
			zoom_speed: 0.1,
			yaw: offset.x.atan2(offset.z),
			pitch: (offset.y / radius).asin(),
		}
	}

	fn position(&self) -> Vec3 {
		let horizontal = self.radius * self.pitch.cos();
		self.target
			+ Vec3::new(horizontal * self.yaw.sin(), self.radius * self.pitch.sin(), horizontal * self.yaw.cos())
	}
}

pub fn perspective() -> Projection {
	Projection::Perspective(PerspectiveProjection {
		fov: 75.0_f32.to_radians(),
		near: 0.1,
		far: 1000.0,
		..default()
	})
}

pub fn setup_camera(mut commands: Commands) {
	let camera_pos = Vec3::new(0.0, 1.0, 1.5);
	let look_at = Vec3::ZERO;

	log::info!("Setting up camera at position: {:?}, looking at: {:?}", camera_pos, look_at);

	commands.spawn((
		Camera3d::default(),
		Transform::from_translation(camera_pos).looking_at(look_at, Vec3::Y),
		perspective(),
		// swapped to the interaction layer by the view toggle
		RenderLayers::layer(0),
		OrbitController::looking_from(camera_pos, look_at),
	));
}

pub fn camera_controller(
	mouse_buttons: Res<ButtonInput<MouseButton>>,
	mut mouse_motion: MessageReader<MouseMotion>,
	mut mouse_wheel: MessageReader<MouseWheel>,
	mut query: Query<(&mut Transform, &mut OrbitController), With<Camera3d>>,
) {
	let Ok((mut transform, mut controller)) = query.single_mut() else {
		return;
	};

	let mut mouse_delta = Vec2::ZERO;
	for event in mouse_motion.read() {
		mouse_delta += event.delta;
	}
	if !mouse_buttons.pressed(MouseButton::Right) {
		mouse_delta = Vec2::ZERO;
	}

	let mut scroll = 0.0;
	for event in mouse_wheel.read() {
		scroll += match event.unit {
			MouseScrollUnit::Line => event.y,
			MouseScrollUnit::Pixel => event.y * 0.01,
		};
	}

	if mouse_delta == Vec2::ZERO && scroll == 0.0 {
		return;
	}

	controller.yaw -= mouse_delta.x * controller.sensitivity;
	controller.pitch += mouse_delta.y * controller.sensitivity;
	controller.pitch = controller.pitch.clamp(-PI / 2.0 + 0.1, PI / 2.0 - 0.1);
	controller.radius = (controller.radius * (1.0 - scroll * controller.zoom_speed)).clamp(0.2, 50.0);

	*transform = Transform::from_translation(controller.position()).looking_at(controller.target, Vec3::Y);
}
