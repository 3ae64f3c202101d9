pub mod classify;
pub mod connectivity;
pub mod graph;
pub mod path;
pub mod tree;

pub use classify::{Classification, RelationshipClassifier};
pub use connectivity::ConnectivityAnalyzer;
pub use graph::{FamilyGraph, GraphStatistics, Neighbor};
pub use path::{CancellationFlag, PathFinder, RelationshipPath, TraversalBudget};
pub use tree::TreeBuilder;
