use crate::error::TreeError;
use crate::material::BranchMaterial;
use bevy::prelude::*;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Distinguishes the two parallel hierarchies at the type level so that ids of
/// one graph can never be used to index the other.
pub trait GraphKind: 'static {
	const NAME: &'static str;
}

/// The invisible graph rendered off-screen with color-encoded ids.
#[derive(Debug, Clone, Copy)]
pub enum InteractionKind {}

/// The visible, lit graph.
#[derive(Debug, Clone, Copy)]
pub enum VisualizationKind {}

impl GraphKind for InteractionKind {
	const NAME: &'static str = "interaction";
}

impl GraphKind for VisualizationKind {
	const NAME: &'static str = "visualization";
}

/// Identifier of a node, unique within its graph. Ids start at 1; 0 is the
/// "no object" value of the picking encoding.
pub struct NodeId<K> {
	raw: u32,
	kind: PhantomData<fn() -> K>,
}

pub type InteractionId = NodeId<InteractionKind>;
pub type VisualizationId = NodeId<VisualizationKind>;

impl<K> NodeId<K> {
	/// Wraps a raw id, rejecting the reserved 0.
	pub fn from_raw(raw: u32) -> Option<Self> {
		(raw != 0).then_some(Self { raw, kind: PhantomData })
	}

	pub fn raw(self) -> u32 {
		self.raw
	}

	fn index(self) -> usize {
		self.raw as usize - 1
	}
}

impl<K> Clone for NodeId<K> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<K> Copy for NodeId<K> {}

impl<K> PartialEq for NodeId<K> {
	fn eq(&self, other: &Self) -> bool {
		self.raw == other.raw
	}
}

impl<K> Eq for NodeId<K> {}

impl<K> Hash for NodeId<K> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.raw.hash(state);
	}
}

impl<K> fmt::Debug for NodeId<K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = std::any::type_name::<K>().rsplit("::").next().unwrap_or("Node");
		write!(f, "{}#{}", kind, self.raw)
	}
}

/// One branch: a group transform carrying a single cylinder mesh.
///
/// `transform` is the group's local placement (translation along the parent's
/// growth axis and rotation); `scale` only applies to the branch mesh so that
/// children are not shrunk twice.
#[derive(Debug, Clone)]
pub struct BranchNode<K> {
	id: NodeId<K>,
	parent: Option<NodeId<K>>,
	children: Vec<NodeId<K>>,
	transform: Transform,
	scale: Vec3,
	level: u32,
	material: BranchMaterial,
}

impl<K> BranchNode<K> {
	pub fn id(&self) -> NodeId<K> {
		self.id
	}

	pub fn parent(&self) -> Option<NodeId<K>> {
		self.parent
	}

	pub fn children(&self) -> &[NodeId<K>] {
		&self.children
	}

	pub fn transform(&self) -> &Transform {
		&self.transform
	}

	pub fn scale(&self) -> Vec3 {
		self.scale
	}

	/// Level cached at creation; see [`BranchGraph::level_of`] for the structural one.
	pub fn level(&self) -> u32 {
		self.level
	}

	pub fn material(&self) -> BranchMaterial {
		self.material
	}

	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	/// Length of the branch along its growth axis.
	pub fn length(&self) -> f32 {
		self.scale.y
	}
}

/// Placement data for a node about to be inserted.
#[derive(Debug, Clone, Copy)]
pub struct NodeSeed {
	pub transform: Transform,
	pub scale: Vec3,
	pub level: u32,
}

/// Arena owning one branch hierarchy. Nodes are never removed, so ids index
/// the arena directly and creation order is always parent-before-child.
#[derive(Debug, Clone)]
pub struct BranchGraph<K> {
	nodes: Vec<BranchNode<K>>,
	origin: Transform,
}

pub type InteractionGraph = BranchGraph<InteractionKind>;
pub type VisualizationGraph = BranchGraph<VisualizationKind>;

impl<K: GraphKind> BranchGraph<K> {
	/// Creates an empty graph whose scene root is placed at `origin`.
	pub fn new(origin: Transform) -> Self {
		Self { nodes: Vec::new(), origin }
	}

	pub fn origin(&self) -> &Transform {
		&self.origin
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn root(&self) -> Option<NodeId<K>> {
		self.nodes.first().map(|node| node.id)
	}

	pub fn contains(&self, id: NodeId<K>) -> bool {
		id.index() < self.nodes.len()
	}

	pub fn get(&self, id: NodeId<K>) -> Result<&BranchNode<K>, TreeError> {
		self.nodes.get(id.index()).ok_or(Self::unknown(id))
	}

	fn get_mut(&mut self, id: NodeId<K>) -> Result<&mut BranchNode<K>, TreeError> {
		self.nodes.get_mut(id.index()).ok_or(Self::unknown(id))
	}

	fn unknown(id: NodeId<K>) -> TreeError {
		TreeError::UnknownNode { graph: K::NAME, id: id.raw }
	}

	/// Nodes in creation order.
	pub fn iter(&self) -> impl Iterator<Item = &BranchNode<K>> {
		self.nodes.iter()
	}

	/// Inserts a node under `parent` (or as the root when `parent` is `None`).
	///
	/// The material is computed from the freshly allocated id, which is how the
	/// interaction graph gets its id-encoding colors.
	pub fn insert_with(
		&mut self,
		parent: Option<NodeId<K>>,
		seed: NodeSeed,
		material: impl FnOnce(NodeId<K>) -> BranchMaterial,
	) -> Result<NodeId<K>, TreeError> {
		match parent {
			Some(parent) => {
				self.get(parent)?;
			}
			None if !self.nodes.is_empty() => {
				return Err(TreeError::RootExists { graph: K::NAME });
			}
			None => {}
		}

		let raw = self.nodes.len() as u32 + 1;
		let id = NodeId { raw, kind: PhantomData };
		self.nodes.push(BranchNode {
			id,
			parent,
			children: Vec::new(),
			transform: seed.transform,
			scale: seed.scale,
			level: seed.level,
			material: material(id),
		});

		if let Some(parent) = parent {
			self.get_mut(parent)?.children.push(id);
		}

		Ok(id)
	}

	/// Depth of a node counted from its ancestors, independent of the cached level.
	pub fn level_of(&self, id: NodeId<K>) -> Result<u32, TreeError> {
		let mut level = 0;
		let mut current = self.get(id)?;
		while let Some(parent) = current.parent {
			level += 1;
			current = self.get(parent)?;
		}
		Ok(level)
	}

	/// Nodes without branch children, found by a depth-first walk from the root.
	pub fn leaves(&self) -> Vec<NodeId<K>> {
		let mut leaves = Vec::new();
		let mut stack: Vec<NodeId<K>> = self.root().into_iter().collect();

		while let Some(id) = stack.pop() {
			let Some(node) = self.nodes.get(id.index()) else { continue };
			if node.children.is_empty() {
				leaves.push(id);
			} else {
				stack.extend(node.children.iter().copied());
			}
		}

		leaves
	}

	/// `id` followed by all of its descendants.
	pub fn subtree(&self, id: NodeId<K>) -> Result<Vec<NodeId<K>>, TreeError> {
		self.get(id)?;
		let mut visited = Vec::new();
		let mut stack = vec![id];

		while let Some(id) = stack.pop() {
			let node = self.get(id)?;
			stack.extend(node.children.iter().rev().copied());
			visited.push(id);
		}

		Ok(visited)
	}

	/// Pre-order listing of `(level, child count)`; two graphs with equal
	/// signatures have the same shape.
	pub fn shape(&self) -> Vec<(u32, usize)> {
		let Some(root) = self.root() else { return Vec::new() };
		self.subtree(root)
			.unwrap_or_default()
			.into_iter()
			.filter_map(|id| {
				let node = self.nodes.get(id.index())?;
				Some((self.level_of(id).ok()?, node.children.len()))
			})
			.collect()
	}

	/// World matrix of the node's group, including the scene origin.
	pub fn world_matrix(&self, id: NodeId<K>) -> Result<Mat4, TreeError> {
		let mut matrix = Mat4::IDENTITY;
		let mut current = Some(id);
		while let Some(id) = current {
			let node = self.get(id)?;
			matrix = transform_matrix(&node.transform) * matrix;
			current = node.parent;
		}
		Ok(transform_matrix(&self.origin) * matrix)
	}

	/// World matrix of the node's mesh (group matrix with the level scale applied).
	pub fn mesh_matrix(&self, id: NodeId<K>) -> Result<Mat4, TreeError> {
		let scale = self.get(id)?.scale;
		Ok(self.world_matrix(id)? * Mat4::from_scale(scale))
	}

	/// Turns a node about its parent's growth axis.
	pub fn rotate_y(&mut self, id: NodeId<K>, angle: f32) -> Result<(), TreeError> {
		self.get_mut(id)?.transform.rotate_y(angle);
		Ok(())
	}

	pub fn set_material(&mut self, id: NodeId<K>, material: BranchMaterial) -> Result<(), TreeError> {
		self.get_mut(id)?.material = material;
		Ok(())
	}

	/// Applies `material` to `id` and every descendant.
	pub fn set_subtree_material(
		&mut self,
		id: NodeId<K>,
		material: BranchMaterial,
	) -> Result<(), TreeError> {
		for node in self.subtree(id)? {
			self.set_material(node, material)?;
		}
		Ok(())
	}
}

pub(crate) fn transform_matrix(transform: &Transform) -> Mat4 {
	Mat4::from_scale_rotation_translation(transform.scale, transform.rotation, transform.translation)
}
