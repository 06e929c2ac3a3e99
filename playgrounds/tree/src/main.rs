use anyhow::Context;
use bevy::prelude::*;
use tree_graph::TreeConfig;
use tree_playground::TreePlugin;

fn main() -> anyhow::Result<()> {
	// Parse seed and optional config path from command line
	let mut args = std::env::args().skip(1);
	let seed = args.next().and_then(|s| s.parse::<u64>().ok()).unwrap_or_else(rand::random);
	let config = match args.next() {
		Some(path) => load_config(&path)?,
		None => TreeConfig::default(),
	};

	println!("Starting tree playground with seed: {}", seed);

	App::new()
		.add_plugins(DefaultPlugins.set(WindowPlugin {
			primary_window: Some(Window {
				title: "Tree Playground".to_string(),
				resolution: (1280, 720).into(),
				..default()
			}),
			..default()
		}))
		.add_plugins(TreePlugin { seed, config })
		.run();

	Ok(())
}

fn load_config(path: &str) -> anyhow::Result<TreeConfig> {
	let raw = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
	let config: TreeConfig =
		serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path))?;
	config.validate().with_context(|| format!("validating config {}", path))?;
	Ok(config)
}
