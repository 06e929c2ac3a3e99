//! Color-encoded object picking.
//!
//! Every interaction node renders its id into the red and green channels of a
//! floating point target (base 256, so two channels address 65535 nodes). The
//! texel under the cursor is read back and decoded; 0 means "no object".

use crate::graph::{InteractionGraph, InteractionId};
use bevy::prelude::*;

/// Two-channel encoding of an interaction id.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PickColor {
	pub high: f32,
	pub low: f32,
}

impl PickColor {
	pub fn encode(id: u32) -> Self {
		Self { high: (id / 256) as f32 / 255.0, low: (id % 256) as f32 / 255.0 }
	}

	pub fn of(id: InteractionId) -> Self {
		Self::encode(id.raw())
	}

	/// Fragment color written by the interaction program: blue and alpha are fixed at 1.
	pub fn rgba(&self) -> [f32; 4] {
		[self.high, self.low, 1.0, 1.0]
	}

	pub fn as_vec4(&self) -> Vec4 {
		Vec4::from_array(self.rgba())
	}
}

/// Decodes a read-back texel into a raw id.
///
/// Each channel is snapped to its nearest multiple of 1/255 before combining,
/// which matches `floor(r * 255 * 256 + g * 255)` on exact values and stays
/// correct when the render pipeline stores channels at half precision.
pub fn decode_pixel(pixel: [f32; 4]) -> u32 {
	let high = (pixel[0] * 255.0).round().max(0.0) as u32;
	let low = (pixel[1] * 255.0).round().max(0.0) as u32;
	high * 256 + low
}

/// Renderer-side half of picking.
///
/// Implementors render the interaction graph into an off-screen floating point
/// target the size of the viewport and return one texel, addressed with a
/// bottom-left origin. A synchronous implementation stalls the frame until the
/// GPU copy completes; an asynchronous one may answer from the most recent
/// finished read-back instead.
pub trait PickingTarget {
	fn render_and_read(&mut self, graph: &InteractionGraph, texel: UVec2) -> Option<[f32; 4]>;
}

/// Tracks the render target size and turns cursor positions into picked nodes.
#[derive(Debug, Clone)]
pub struct Picker {
	size: UVec2,
}

impl Picker {
	pub fn new(size: UVec2) -> Self {
		Self { size }
	}

	pub fn size(&self) -> UVec2 {
		self.size
	}

	/// Must be called between frames whenever the viewport changes size.
	pub fn resize(&mut self, size: UVec2) {
		if self.size != size {
			log::info!("Resizing pick target from {} to {}", self.size, size);
		}
		self.size = size;
	}

	/// Flips a top-left cursor position into render target texel coordinates.
	pub fn texel_for_cursor(&self, cursor: Vec2) -> Option<UVec2> {
		if cursor.x < 0.0 || cursor.y < 0.0 {
			return None;
		}
		let (x, y) = (cursor.x.floor() as u32, cursor.y.floor() as u32);
		if x >= self.size.x || y >= self.size.y {
			return None;
		}
		Some(UVec2::new(x, self.size.y - y - 1))
	}

	pub fn render_and_pick<T: PickingTarget + ?Sized>(
		&self,
		target: &mut T,
		graph: &InteractionGraph,
		cursor: Vec2,
	) -> Option<InteractionId> {
		let texel = self.texel_for_cursor(cursor)?;
		let pixel = target.render_and_read(graph, texel)?;
		let id = InteractionId::from_raw(decode_pixel(pixel))?;
		graph.contains(id).then_some(id)
	}
}
