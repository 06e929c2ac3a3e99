use crate::{TreeState, TreeView};
use bevy::prelude::*;

#[derive(Component)]
pub struct StatusDisplay;

const KEY_BINDINGS: &str = "G grow | V view | M mode | W/S rotate | click attach/select | right drag orbit";

pub fn setup_status_ui(mut commands: Commands) {
	log::info!("Setting up status UI");

	commands
		.spawn((
			Node {
				position_type: PositionType::Absolute,
				top: Val::Px(10.0),
				left: Val::Px(10.0),
				padding: UiRect::all(Val::Px(10.0)),
				..default()
			},
			BackgroundColor(Color::hsla(201.0, 0.69, 0.62, 0.7)),
			StatusDisplay,
		))
		.with_children(|parent| {
			parent.spawn((
				Text::new(KEY_BINDINGS),
				TextFont { font_size: 18.0, ..default() },
				TextColor(Color::WHITE),
			));
		});
}

pub fn update_status_display(
	tree: Res<TreeState>,
	view: Res<TreeView>,
	display: Query<&Children, With<StatusDisplay>>,
	mut text_query: Query<&mut Text>,
) {
	let Ok(children) = display.single() else {
		return;
	};
	let Some(mut text) = children.first().and_then(|&entity| text_query.get_mut(entity).ok()) else {
		return;
	};

	let graphs = tree.graphs();
	let status = format!(
		"Mode: {:?}\nView: {}\nBranches: {}\nLeaves: {}\nHovered: {}\nSelected: {}\nPotential branch: {}\n{}",
		tree.mode(),
		if view.show_visualization { "visualization" } else { "interaction" },
		graphs.visualization().len(),
		graphs.visualization().leaves().len(),
		tree.has_hovered_visualization_group(),
		tree.is_selected(),
		tree.potential_branch_visible(),
		KEY_BINDINGS,
	);
	if text.0 != status {
		text.0 = status;
	}
}
