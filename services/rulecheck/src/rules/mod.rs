//! Rule base → Intervals → Checkers → Findings pipeline
//!
//! This module implements semantic validation of a declarative rule base:
//! 1. Ingesting the JSON rule base into an immutable model
//! 2. Normalizing each rule's conditions into per-variable intervals
//! 3. Detecting self-contradictory rules
//! 4. Detecting conflicting assignments between overlapping rules
//! 5. Detecting redundant rules and formula aliases
//! 6. Aggregating and rendering findings

pub mod model;
pub mod ingest;
pub mod interval;
pub mod normalize;
pub mod findings;
pub mod contradiction;
pub mod conflicts;
pub mod redundancy;
pub mod formula;
pub mod naming;
pub mod detector;
pub mod outputs;

pub use model::*;
pub use ingest::*;
pub use interval::*;
pub use normalize::*;
pub use findings::*;
pub use contradiction::*;
pub use conflicts::*;
pub use redundancy::*;
pub use formula::*;
pub use naming::*;
pub use detector::*;
pub use outputs::*;
