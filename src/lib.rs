//! Model import with an on-disk snapshot cache, plus a free-fly camera for
//! looking at the result.
//!
//! [`ModelLoader`] turns a glTF or OBJ asset into a [`Model`] of GPU-ready
//! meshes. The first load runs the importer and writes a snapshot beside the
//! asset; later loads decode the snapshot instead.

pub mod config;
pub mod error;
pub mod gpu;
pub mod import;
pub mod model;
pub mod scene;
pub mod viewer;

pub use config::Config;
pub use error::ModelError;
pub use model::{Model, ModelLoader};
pub use scene::{Camera, Session};
pub use viewer::Viewer;
