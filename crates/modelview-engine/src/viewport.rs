//! The single displayed model and its atomic replacement.

use modelview_core::SceneNode;
use tracing::info;

use crate::camera::CameraRig;
use crate::resource::ResourceLocator;
use crate::storage::SessionStore;

/// Handle of a node attached to a scene graph
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// Scene container of the render engine: nodes in it are drawn each frame.
pub trait SceneGraph {
    fn add(&mut self, node: SceneNode) -> NodeId;
    /// Detach a node; the returned node is released when dropped.
    fn remove(&mut self, id: NodeId) -> Option<SceneNode>;
    fn node_count(&self) -> usize;
}

/// Retained in-memory scene graph.
#[derive(Debug, Default)]
pub struct MemoryScene {
    next_id: u64,
    nodes: Vec<(NodeId, SceneNode)>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.iter().find(|(i, _)| *i == id).map(|(_, n)| n)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter().map(|(_, n)| n)
    }
}

impl SceneGraph for MemoryScene {
    fn add(&mut self, node: SceneNode) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.push((id, node));
        id
    }

    fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        let idx = self.nodes.iter().position(|(i, _)| *i == id)?;
        Some(self.nodes.remove(idx).1)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Displayed {
    id: NodeId,
    resource: ResourceLocator,
}

/// Owns the one model node in the scene and the persisted "last shown"
/// locator.
pub struct ViewportState {
    scene: Box<dyn SceneGraph>,
    store: Box<dyn SessionStore>,
    storage_key: String,
    default_resource: ResourceLocator,
    /// Read from the store once, at construction
    persisted: Option<ResourceLocator>,
    displayed: Option<Displayed>,
}

impl ViewportState {
    pub fn new(
        scene: Box<dyn SceneGraph>,
        store: Box<dyn SessionStore>,
        storage_key: impl Into<String>,
        default_resource: ResourceLocator,
    ) -> Self {
        let storage_key = storage_key.into();
        let persisted = store.get(&storage_key).map(ResourceLocator::from);

        Self {
            scene,
            store,
            storage_key,
            default_resource,
            persisted,
            displayed: None,
        }
    }

    /// Replace the displayed model with `node`.
    ///
    /// The previous node is detached before the new one is attached, so the
    /// scene never holds two models. Persists `resource` and re-aims the
    /// camera at the origin.
    pub fn swap(&mut self, node: SceneNode, resource: ResourceLocator, camera: &mut CameraRig) {
        if let Some(prev) = self.displayed.take() {
            drop(self.scene.remove(prev.id));
        }

        let id = self.scene.add(node);
        self.store.set(&self.storage_key, resource.as_str());
        info!("Displaying {}", resource);

        self.persisted = Some(resource.clone());
        self.displayed = Some(Displayed { id, resource });
        camera.reset_target();
    }

    /// Locator of the displayed model, else the persisted one, else the
    /// configured default.
    pub fn current_resource(&self) -> ResourceLocator {
        self.displayed
            .as_ref()
            .map(|d| d.resource.clone())
            .or_else(|| self.persisted.clone())
            .unwrap_or_else(|| self.default_resource.clone())
    }

    /// Locator found in session storage at startup or written by the last
    /// swap.
    pub fn persisted_resource(&self) -> Option<&ResourceLocator> {
        self.persisted.as_ref()
    }

    pub fn displayed_resource(&self) -> Option<&ResourceLocator> {
        self.displayed.as_ref().map(|d| &d.resource)
    }

    pub fn displayed_node(&self) -> Option<NodeId> {
        self.displayed.as_ref().map(|d| d.id)
    }

    pub fn scene(&self) -> &dyn SceneGraph {
        self.scene.as_ref()
    }
}
