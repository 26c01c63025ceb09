//! Non-adaptive grid generation.

pub mod hash_generator;
pub mod levels;
pub mod subspace;

pub use hash_generator::HashGenerator;
pub use levels::LevelVectors;
pub use subspace::{IndexInSubspaceGenerator, subspace_size};
