//! iconforge End-to-End Test Infrastructure
//!
//! Scenario tests for the thumbnail cache, run against real files in
//! temporary project directories:
//!
//! - **Fixtures**: PNG textures, glTF cubes with embedded buffers, prefab files
//! - **Doubles**: a scripted asset index and renderers that count or fail calls
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p iconforge-tests
//! ```
//!
//! Nothing here needs a GPU; 3-D previews go through the software renderer.

pub mod doubles;
pub mod fixtures;

pub use doubles::{CountingRenderer, FailingRenderer, ScriptedIndex};
pub use fixtures::ProjectFixture;
