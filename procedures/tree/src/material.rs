use crate::picking::PickColor;
use bevy::prelude::*;

/// Diffuse yellow used for committed branches.
pub const DISPLAY_COLOR: Color = Color::srgb(1.0, 1.0, 0.0);

/// Translucent cyan shared by hover highlighting and the speculative branch.
pub const HIGHLIGHT_COLOR: Color = Color::srgba(0.0, 0.8, 1.0, 0.5);

/// Material binding of a branch mesh.
///
/// Only the interaction variant carries per-node data; the others name one of
/// the shared materials created once by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BranchMaterial {
	/// Unlit program emitting the node's encoded id as its fragment color.
	Interaction(PickColor),
	Display,
	Hover,
	Speculative,
}

impl BranchMaterial {
	pub fn pick_color(&self) -> Option<PickColor> {
		match self {
			Self::Interaction(color) => Some(*color),
			_ => None,
		}
	}
}

/// Shared branch geometry: a capped cylinder whose base sits at the local origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchGeometry {
	pub radius: f32,
	pub height: f32,
	pub resolution: u32,
}

impl BranchGeometry {
	pub const fn standard() -> Self {
		Self { radius: 0.1, height: 1.0, resolution: 10 }
	}

	/// Offset applied to a centered cylinder so that its base rests on y = 0.
	pub fn base_offset(&self) -> Vec3 {
		Vec3::new(0.0, self.height * 0.5, 0.0)
	}
}

impl Default for BranchGeometry {
	fn default() -> Self {
		Self::standard()
	}
}
