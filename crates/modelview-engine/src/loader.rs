//! Model loader boundary and glTF parsing.
//!
//! Loaders never call back into the viewer. They queue `LoadEvent`s tagged
//! with the session token of the request, and the host drains them once per
//! frame through `poll`. Per session the order is progress events first,
//! then exactly one terminal event.

use glam::{Quat, Vec3};
use modelview_core::{Aabb, MeshInfo, NodeTransform, SceneNode};
use tracing::debug;

use crate::error::LoadError;
use crate::resource::ResourceLocator;
use crate::session::SessionToken;

#[derive(Clone, Debug, PartialEq)]
pub struct LoadRequest {
    pub token: SessionToken,
    pub resource: ResourceLocator,
}

#[derive(Debug)]
pub enum LoadEventKind {
    /// `total` is `None` when the transfer size is unknown
    Progress { loaded: u64, total: Option<u64> },
    Loaded(SceneNode),
    Failed(LoadError),
}

#[derive(Debug)]
pub struct LoadEvent {
    pub token: SessionToken,
    pub resource: ResourceLocator,
    pub kind: LoadEventKind,
}

impl LoadEvent {
    pub fn progress(request: &LoadRequest, loaded: u64, total: Option<u64>) -> Self {
        Self::new(request, LoadEventKind::Progress { loaded, total })
    }

    pub fn loaded(request: &LoadRequest, scene: SceneNode) -> Self {
        Self::new(request, LoadEventKind::Loaded(scene))
    }

    pub fn failed(request: &LoadRequest, error: LoadError) -> Self {
        Self::new(request, LoadEventKind::Failed(error))
    }

    fn new(request: &LoadRequest, kind: LoadEventKind) -> Self {
        Self {
            token: request.token,
            resource: request.resource.clone(),
            kind,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.kind, LoadEventKind::Progress { .. })
    }
}

pub trait ModelLoader {
    /// Start fetching and parsing `request.resource`. Must not block on the
    /// transfer.
    fn load(&mut self, request: LoadRequest);

    /// Events that arrived since the last poll, in arrival order.
    fn poll(&mut self) -> Vec<LoadEvent>;
}

/// Parse `.glb` / `.gltf` bytes into a scene tree.
///
/// The returned root is a container with identity transform holding the
/// nodes of the default scene (or the first scene). Mesh bounds come from
/// the POSITION accessor min/max of each primitive.
pub fn parse_model(bytes: &[u8]) -> Result<SceneNode, LoadError> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| LoadError::Parse(e.to_string()))?;
    let document = &gltf.document;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());

    let mut root = SceneNode::group(scene.as_ref().and_then(|s| s.name()).unwrap_or("model"));
    if let Some(scene) = scene {
        root.children = scene.nodes().map(|n| convert_node(&n)).collect();
    }
    Ok(root)
}

fn convert_node(node: &gltf::Node) -> SceneNode {
    let (translation, rotation, scale) = node.transform().decomposed();

    SceneNode {
        name: node.name().map(str::to_string),
        transform: NodeTransform {
            translation: Vec3::from(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from(scale),
        },
        mesh: node.mesh().map(|mesh| convert_mesh(&mesh)),
        children: node.children().map(|c| convert_node(&c)).collect(),
    }
}

fn convert_mesh(mesh: &gltf::Mesh) -> MeshInfo {
    let mut bounds = Aabb::EMPTY;
    let mut primitive_count = 0;

    for prim in mesh.primitives() {
        primitive_count += 1;
        match primitive_bounds(&prim) {
            Some(b) => bounds = bounds.union(&b),
            None => debug!("Primitive {} of mesh {} has no position bounds", prim.index(), mesh.index()),
        }
    }

    MeshInfo {
        bounds,
        primitive_count,
        cast_shadow: false,
        receive_shadow: false,
    }
}

fn primitive_bounds(prim: &gltf::Primitive) -> Option<Aabb> {
    let positions = prim.get(&gltf::Semantic::Positions)?;
    let min: [f32; 3] = serde_json::from_value(positions.min()?).ok()?;
    let max: [f32; 3] = serde_json::from_value(positions.max()?).ok()?;
    Some(Aabb::new(Vec3::from(min), Vec3::from(max)))
}

// -----------------------------
// Native (disk) loader
// -----------------------------

/// Loads models from disk, mapping locators under `mount` (the server's
/// model directory, e.g. `/static/models`) to files below `assets_dir`.
#[cfg(not(target_arch = "wasm32"))]
pub struct FileModelLoader {
    assets_dir: std::path::PathBuf,
    mount: String,
    queue: std::collections::VecDeque<LoadEvent>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileModelLoader {
    pub fn new(assets_dir: impl Into<std::path::PathBuf>, mount: impl Into<String>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            mount: mount.into(),
            queue: std::collections::VecDeque::new(),
        }
    }

    /// File backing `resource`. Locators outside the mount are taken as
    /// plain filesystem paths; `..` segments are never followed.
    pub fn resolve(&self, resource: &ResourceLocator) -> Option<std::path::PathBuf> {
        let mount = self.mount.trim_end_matches('/');
        let rel = resource
            .as_str()
            .strip_prefix(mount)
            .and_then(|rest| rest.strip_prefix('/'));

        match rel {
            Some(rel) if !rel.split('/').any(|seg| seg == "..") && !rel.is_empty() => {
                Some(self.assets_dir.join(rel))
            }
            Some(_) => None,
            None => {
                let path = std::path::PathBuf::from(resource.as_str());
                path.is_file().then_some(path)
            }
        }
    }

    fn read(path: &std::path::Path) -> anyhow::Result<Vec<u8>> {
        use anyhow::Context;
        std::fs::read(path).with_context(|| format!("failed to read model: {}", path.display()))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ModelLoader for FileModelLoader {
    fn load(&mut self, request: LoadRequest) {
        let Some(path) = self.resolve(&request.resource) else {
            let err = LoadError::Unresolved(request.resource.to_string());
            self.queue.push_back(LoadEvent::failed(&request, err));
            return;
        };

        let total = std::fs::metadata(&path).ok().map(|m| m.len());
        self.queue.push_back(LoadEvent::progress(&request, 0, total));

        let event = match Self::read(&path) {
            Ok(bytes) => {
                let len = bytes.len() as u64;
                self.queue.push_back(LoadEvent::progress(&request, len, Some(len)));
                match parse_model(&bytes) {
                    Ok(scene) => LoadEvent::loaded(&request, scene),
                    Err(e) => LoadEvent::failed(&request, e),
                }
            }
            Err(e) => LoadEvent::failed(
                &request,
                LoadError::Fetch {
                    locator: request.resource.to_string(),
                    reason: format!("{e:#}"),
                },
            ),
        };
        self.queue.push_back(event);
    }

    fn poll(&mut self) -> Vec<LoadEvent> {
        self.queue.drain(..).collect()
    }
}

// -----------------------------
// WASM (HTTP) loader
// -----------------------------

/// Fetches models over HTTP on the browser event loop.
#[cfg(target_arch = "wasm32")]
#[derive(Default)]
pub struct FetchModelLoader {
    queue: std::rc::Rc<std::cell::RefCell<std::collections::VecDeque<LoadEvent>>>,
}

#[cfg(target_arch = "wasm32")]
impl FetchModelLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(target_arch = "wasm32")]
impl ModelLoader for FetchModelLoader {
    fn load(&mut self, request: LoadRequest) {
        let queue = self.queue.clone();
        wasm_bindgen_futures::spawn_local(async move {
            queue
                .borrow_mut()
                .push_back(LoadEvent::progress(&request, 0, None));

            let event = match crate::http_adapter::fetch_bytes(request.resource.as_str()).await {
                Ok(bytes) => {
                    let len = bytes.len() as u64;
                    queue
                        .borrow_mut()
                        .push_back(LoadEvent::progress(&request, len, Some(len)));
                    match parse_model(&bytes) {
                        Ok(scene) => LoadEvent::loaded(&request, scene),
                        Err(e) => LoadEvent::failed(&request, e),
                    }
                }
                Err(e) => LoadEvent::failed(
                    &request,
                    LoadError::Fetch {
                        locator: request.resource.to_string(),
                        reason: e.to_string(),
                    },
                ),
            };
            queue.borrow_mut().push_back(event);
        });
    }

    fn poll(&mut self) -> Vec<LoadEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }
}
