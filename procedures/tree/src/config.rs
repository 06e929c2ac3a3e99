use crate::error::TreeError;
use rand::Rng;
use serde::Deserialize;
use std::f32::consts::PI;
use std::time::Duration;

/// How many children each leaf receives per growth step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildrenCount {
	Fixed(usize),
	/// Drawn once per parent, inclusive on both ends.
	Random { min: usize, max: usize },
}

impl ChildrenCount {
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
		match *self {
			Self::Fixed(count) => count,
			Self::Random { min, max } if min >= max => min,
			Self::Random { min, max } => rng.random_range(min..=max),
		}
	}
}

impl Default for ChildrenCount {
	fn default() -> Self {
		Self::Fixed(2)
	}
}

/// Tunables of the interactive tree. Every field has a default, so a partial
/// JSON document only overrides what it names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
	pub children: ChildrenCount,
	/// Share of a parent branch (measured from its tip) where children may sprout.
	pub growing_portion: f32,
	/// Upper bound of the random jitter applied to child placement.
	pub deviation_factor: f32,
	/// Bend of every grown branch away from its parent's axis.
	pub branch_tilt: f32,
	/// Bend of the speculative branch away from the branch it hovers.
	pub speculative_tilt: f32,
	pub shrink_radius: f32,
	pub shrink_height: f32,
	/// Vertical offset of both scene roots.
	pub scene_offset: f32,
	/// Keyboard rotation step of the speculative branch, in radians.
	pub rotation_step: f32,
	pub selection_period_ms: u64,
	/// Rotation applied to the selected branch on every selection tick.
	pub selection_angle: f32,
}

impl TreeConfig {
	/// Selection timer period, never shorter than one millisecond.
	pub fn selection_period(&self) -> Duration {
		Duration::from_millis(self.selection_period_ms.max(1))
	}

	/// Rejects values that would make the tree unusable.
	pub fn validate(&self) -> Result<(), TreeError> {
		let invalid = |field: &'static str, reason: &'static str| Err(TreeError::InvalidConfig { field, reason });

		if self.selection_period_ms == 0 {
			return invalid("selection_period_ms", "must be at least 1");
		}
		if !(self.shrink_radius > 0.0 && self.shrink_radius.is_finite()) {
			return invalid("shrink_radius", "must be positive");
		}
		if !(self.shrink_height > 0.0 && self.shrink_height.is_finite()) {
			return invalid("shrink_height", "must be positive");
		}
		if let ChildrenCount::Random { min, max } = self.children {
			if min > max {
				return invalid("children", "min must not exceed max");
			}
		}
		Ok(())
	}
}

impl Default for TreeConfig {
	fn default() -> Self {
		Self {
			children: ChildrenCount::default(),
			growing_portion: 0.8,
			deviation_factor: 0.2,
			branch_tilt: PI / 3.0,
			speculative_tilt: -PI / 3.0,
			shrink_radius: 0.5,
			shrink_height: 0.6,
			scene_offset: -0.5,
			rotation_step: 0.1,
			selection_period_ms: 100,
			selection_angle: 0.05,
		}
	}
}
