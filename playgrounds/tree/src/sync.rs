use crate::materials::{BranchAssets, InteractionMaterial};
use crate::picking::INTERACTION_LAYER;
use crate::TreeState;
use bevy::{camera::visibility::RenderLayers, light::NotShadowCaster, prelude::*};
use std::collections::HashMap;
use tree_graph::{
	BranchGraph, BranchMaterial, BranchNode, GraphKind, InteractionId, NodeId, PickColor, VisualizationId,
};

/// Entities standing in for one graph node: a group carrying the node
/// transform and a child mesh carrying the level scale.
#[derive(Debug, Clone, Copy)]
pub struct BranchEntity {
	pub group: Entity,
	pub mesh: Entity,
}

/// Maps both graphs, and the speculative branch, onto the ECS hierarchy.
#[derive(Resource, Debug)]
pub struct BranchEntities {
	interaction_root: Entity,
	visualization_root: Entity,
	interaction: HashMap<InteractionId, BranchEntity>,
	visualization: HashMap<VisualizationId, BranchEntity>,
	/// Material each visualization mesh currently shows.
	shown: HashMap<VisualizationId, BranchMaterial>,
	speculative: BranchEntity,
	speculative_parent: Entity,
}

pub fn setup_branch_entities(mut commands: Commands, assets: Res<BranchAssets>, tree: Res<TreeState>) {
	let origin = *tree.graphs().visualization().origin();
	let interaction_root = commands.spawn((origin, Visibility::default())).id();
	let visualization_root = commands.spawn((origin, Visibility::default())).id();

	// parked hidden under the root while detached
	let speculative = spawn_branch(
		&mut commands,
		visualization_root,
		Transform::IDENTITY,
		Vec3::ONE,
		(MeshMaterial3d(assets.speculative.clone()), NotShadowCaster),
		&assets,
	);
	commands.entity(speculative.group).insert(Visibility::Hidden);

	commands.insert_resource(BranchEntities {
		interaction_root,
		visualization_root,
		interaction: HashMap::new(),
		visualization: HashMap::new(),
		shown: HashMap::new(),
		speculative,
		speculative_parent: visualization_root,
	});
}

fn spawn_branch(
	commands: &mut Commands,
	parent: Entity,
	transform: Transform,
	scale: Vec3,
	material: impl Bundle,
	assets: &BranchAssets,
) -> BranchEntity {
	let group = commands.spawn((transform, Visibility::default(), ChildOf(parent))).id();
	let mesh = commands
		.spawn((
			Mesh3d(assets.mesh.clone()),
			material,
			Transform::from_scale(scale),
			ChildOf(group),
		))
		.id();
	BranchEntity { group, mesh }
}

/// Spawns entities for new nodes and mirrors transforms of known ones.
///
/// Nodes are visited parents first, which is the allocation order of the graphs.
fn mirror_graph<K: GraphKind>(
	commands: &mut Commands,
	graph: &BranchGraph<K>,
	root: Entity,
	known: &mut HashMap<NodeId<K>, BranchEntity>,
	mut spawn: impl FnMut(&mut Commands, &BranchNode<K>, Entity) -> BranchEntity,
	transforms: &mut Query<&mut Transform>,
) {
	for node in graph.iter() {
		if let Some(entity) = known.get(&node.id()) {
			if let Ok(mut transform) = transforms.get_mut(entity.group) {
				if *transform != *node.transform() {
					*transform = *node.transform();
				}
			}
			continue;
		}

		let parent = match node.parent() {
			Some(parent) => match known.get(&parent) {
				Some(parent) => parent.group,
				None => {
					log::error!("Parent {:?} of {:?} has no entity", parent, node.id());
					continue;
				}
			},
			None => root,
		};
		let entity = spawn(commands, node, parent);
		known.insert(node.id(), entity);
	}
}

pub fn sync_branches(
	mut commands: Commands,
	tree: Res<TreeState>,
	assets: Res<BranchAssets>,
	mut entities: ResMut<BranchEntities>,
	mut interaction_materials: ResMut<Assets<InteractionMaterial>>,
	mut transforms: Query<&mut Transform>,
	mut visibility: Query<&mut Visibility>,
) {
	let graphs = tree.graphs();
	let BranchEntities {
		interaction_root,
		visualization_root,
		interaction,
		visualization,
		shown,
		speculative,
		speculative_parent,
	} = &mut *entities;

	mirror_graph(
		&mut commands,
		graphs.interaction(),
		*interaction_root,
		interaction,
		|commands, node, parent| {
			let color = node.material().pick_color().unwrap_or_else(|| PickColor::of(node.id()));
			let material = interaction_materials.add(InteractionMaterial::new(color));
			spawn_branch(
				commands,
				parent,
				*node.transform(),
				node.scale(),
				(MeshMaterial3d(material), RenderLayers::layer(INTERACTION_LAYER), NotShadowCaster),
				&assets,
			)
		},
		&mut transforms,
	);

	mirror_graph(
		&mut commands,
		graphs.visualization(),
		*visualization_root,
		visualization,
		|commands, node, parent| {
			shown.insert(node.id(), node.material());
			spawn_branch(
				commands,
				parent,
				*node.transform(),
				node.scale(),
				MeshMaterial3d(assets.visualization(node.material())),
				&assets,
			)
		},
		&mut transforms,
	);

	for node in graphs.visualization().iter() {
		let (Some(entity), Some(material)) = (visualization.get(&node.id()), shown.get_mut(&node.id())) else {
			continue;
		};
		if *material != node.material() {
			*material = node.material();
			commands.entity(entity.mesh).insert(MeshMaterial3d(assets.visualization(node.material())));
		}
	}

	let parked = *visualization_root;
	sync_speculative(
		&mut commands,
		&tree,
		visualization,
		(&*speculative, speculative_parent, parked),
		&mut transforms,
		&mut visibility,
	);
}

/// Reparents the speculative group under its placement, or parks it hidden.
fn sync_speculative(
	commands: &mut Commands,
	tree: &TreeState,
	visualization: &HashMap<VisualizationId, BranchEntity>,
	(speculative, current_parent, parked): (&BranchEntity, &mut Entity, Entity),
	transforms: &mut Query<&mut Transform>,
	visibility: &mut Query<&mut Visibility>,
) {
	let branch = tree.speculative();
	let placed = branch
		.parent()
		.filter(|_| branch.is_visible())
		.and_then(|parent| visualization.get(&parent))
		.map(|parent| parent.group);

	let (parent, target) = match placed {
		Some(parent) => {
			if let Ok(mut transform) = transforms.get_mut(speculative.group) {
				*transform = branch.transform();
			}
			if let Ok(mut transform) = transforms.get_mut(speculative.mesh) {
				transform.scale = branch.scale();
			}
			(parent, Visibility::Inherited)
		}
		None => (parked, Visibility::Hidden),
	};

	if *current_parent != parent {
		commands.entity(speculative.group).insert(ChildOf(parent));
		*current_parent = parent;
	}
	if let Ok(mut current) = visibility.get_mut(speculative.group) {
		if *current != target {
			*current = target;
		}
	}
}
