use crate::material::BranchGeometry;
use bevy::prelude::*;

const PARALLEL_EPSILON: f32 = 1e-8;

/// Intersects a world-space ray with a branch mesh.
///
/// The ray is carried into mesh-local space with the inverse mesh matrix and
/// tested against the capped cylinder there. Returns the nearest world-space
/// hit in front of the ray origin.
pub fn ray_hits_branch(ray: Ray3d, mesh_matrix: Mat4, geometry: &BranchGeometry) -> Option<Vec3> {
	// deep branches have tiny but valid determinants; only singular matrices are rejected
	let determinant = mesh_matrix.determinant();
	if determinant == 0.0 || !determinant.is_finite() {
		return None;
	}

	let inverse = mesh_matrix.inverse();
	if !inverse.is_finite() {
		return None;
	}
	let direction = *ray.direction;
	let local_origin = inverse.transform_point3(ray.origin);
	let local_direction = inverse.transform_vector3(direction);

	// affine maps keep the ray parameter, so t is valid in both spaces
	let t = ray_capped_cylinder_t(local_origin, local_direction, geometry.radius, geometry.height)?;
	Some(ray.origin + direction * t)
}

/// Ray parameter of the first hit with a y-aligned cylinder spanning `[0, height]`.
pub fn ray_capped_cylinder_t(origin: Vec3, direction: Vec3, radius: f32, height: f32) -> Option<f32> {
	let mut best: Option<f32> = None;
	let mut consider = |t: f32| {
		if t >= 0.0 && best.is_none_or(|b| t < b) {
			best = Some(t);
		}
	};

	// side wall: x^2 + z^2 = r^2
	let a = direction.x * direction.x + direction.z * direction.z;
	if a > PARALLEL_EPSILON {
		let half_b = origin.x * direction.x + origin.z * direction.z;
		// quarter discriminant via the axis distance, stable for far origins
		let cross = origin.x * direction.z - origin.z * direction.x;
		let discriminant = a * radius * radius - cross * cross;
		if discriminant >= 0.0 {
			let root = discriminant.sqrt();
			for t in [(-half_b - root) / a, (-half_b + root) / a] {
				let y = origin.y + direction.y * t;
				if (0.0..=height).contains(&y) {
					consider(t);
				}
			}
		}
	}

	// caps
	if direction.y.abs() > PARALLEL_EPSILON {
		for plane in [0.0, height] {
			let t = (plane - origin.y) / direction.y;
			let x = origin.x + direction.x * t;
			let z = origin.z + direction.z * t;
			if x * x + z * z <= radius * radius {
				consider(t);
			}
		}
	}

	best
}
