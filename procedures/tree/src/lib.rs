pub mod config;
pub mod controller;
pub mod dual;
pub mod error;
pub mod factory;
pub mod graph;
pub mod growth;
pub mod material;
pub mod picking;
pub mod ray;
pub mod registry;
pub mod tree;

pub use config::{ChildrenCount, TreeConfig};
pub use controller::{InteractionController, InteractionMode, SpeculativeBranch};
pub use dual::DualGraph;
pub use error::TreeError;
pub use factory::{BranchPair, BranchPairFactory, LevelScale};
pub use graph::{
	BranchGraph, BranchNode, GraphKind, InteractionGraph, InteractionId, NodeId, VisualizationGraph,
	VisualizationId,
};
pub use growth::GrowthEngine;
pub use material::{BranchGeometry, BranchMaterial, DISPLAY_COLOR, HIGHLIGHT_COLOR};
pub use picking::{PickColor, Picker, PickingTarget};
pub use tree::InteractiveTree;
