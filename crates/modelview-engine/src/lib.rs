//! Model presentation pipeline shared by native and web viewers.
//!
//! A model resource, picked by name, uploaded, or produced by a
//! customization request, is loaded asynchronously, normalized into the
//! canonical viewing volume and swapped into the viewport as its only
//! model. The render loop keeps running independently of load state.
//!
//! Platform-specific pieces (HTTP, model fetching, session storage, status
//! display) sit behind traits with native and `wasm32` implementations.

#![cfg_attr(target_arch = "wasm32", allow(clippy::unused_unit))]

pub mod camera;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http_adapter;
pub mod loader;
pub mod resource;
pub mod session;
pub mod status;
pub mod storage;
pub mod viewer;
pub mod viewport;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use camera::{CameraRig, CameraUniform, SurfaceSize, ZoomDirection};
pub use config::ViewerConfig;
pub use error::{ActionError, ActionResult, Failure, LoadError, LoadFailure};
pub use gateway::{ActionGateway, CustomizeOptions};
pub use http_adapter::{ApiReply, ApiRequest, ApiTransport, ModelFile};
pub use loader::{parse_model, LoadEvent, LoadEventKind, LoadRequest, ModelLoader};
pub use resource::ResourceLocator;
pub use session::{LoadTracker, Progress, SessionToken};
pub use status::{StatusSink, TracingStatus};
pub use storage::{MemoryStore, SessionStore};
pub use viewer::{FrameState, ModelEntry, Viewer};
pub use viewport::{MemoryScene, NodeId, SceneGraph, ViewportState};

pub use modelview_core::{Aabb, NormalizedTransform, SceneNode};
