//! Viewer core (platform-agnostic)
//!
//! Owns the whole presentation state of one viewport and is driven from a
//! single thread: actions start load sessions, `pump` feeds loader events
//! through the session rules into the viewport, and `frame` produces the
//! camera state for the next render tick whatever the load state is.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::camera::{CameraRig, CameraUniform, SurfaceSize};
use crate::config::ViewerConfig;
use crate::error::Failure;
use crate::loader::{LoadEvent, LoadEventKind, LoadRequest, ModelLoader};
use crate::resource::ResourceLocator;
use crate::session::{LoadTracker, SessionOutcome, SessionToken};
use crate::status::StatusSink;
use crate::storage::SessionStore;
use crate::viewport::{SceneGraph, ViewportState};

/// One entry of the server's model catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub url: ResourceLocator,
}

/// Everything a render tick needs from the viewer.
#[derive(Clone, Debug)]
pub struct FrameState {
    pub camera: CameraUniform,
    pub aspect: f32,
    pub surface: SurfaceSize,
    pub displayed: Option<ResourceLocator>,
    pub loading: bool,
}

pub struct Viewer {
    config: ViewerConfig,
    sessions: LoadTracker,
    viewport: ViewportState,
    camera: CameraRig,
    loader: Box<dyn ModelLoader>,
    status: Box<dyn StatusSink>,
    catalog: Vec<ModelEntry>,
}

impl Viewer {
    pub fn new(
        config: ViewerConfig,
        scene: Box<dyn SceneGraph>,
        store: Box<dyn SessionStore>,
        loader: Box<dyn ModelLoader>,
        status: Box<dyn StatusSink>,
    ) -> Self {
        let viewport = ViewportState::new(
            scene,
            store,
            config.storage_key.clone(),
            config.default_model.clone(),
        );
        let camera = CameraRig::new(&config.camera);

        Self {
            config,
            sessions: LoadTracker::new(),
            viewport,
            camera,
            loader,
            status,
            catalog: Vec::new(),
        }
    }

    /// Reload the model persisted by a previous page visit, if any.
    pub fn restore(&mut self) -> Option<SessionToken> {
        let persisted = self.viewport.persisted_resource()?.clone();
        info!("Restoring {}", persisted);
        Some(self.load(persisted))
    }

    /// Start a load session, superseding any session in flight. The current
    /// model stays on screen until the new one commits.
    pub fn load(&mut self, resource: ResourceLocator) -> SessionToken {
        let token = self.sessions.start(resource.clone());
        info!("Session {} loading {}", token, resource);

        self.status.status("Loading model...");
        self.loader.load(LoadRequest { token, resource });
        token
    }

    /// Apply one loader event under the supersession rules.
    pub fn handle_event(&mut self, event: LoadEvent) {
        let LoadEvent {
            token,
            resource,
            kind,
        } = event;

        match kind {
            LoadEventKind::Progress { loaded, total } => {
                if let Some(progress) = self.sessions.on_progress(token, loaded, total) {
                    self.status.status(&progress.status_message());
                }
            }
            LoadEventKind::Loaded(scene) => match self.sessions.on_success(token, scene) {
                SessionOutcome::Commit {
                    token,
                    resource,
                    node,
                    fit,
                } => {
                    debug!(
                        "Session {} fit: scale={:.4} offset={:?}",
                        token, fit.uniform_scale, fit.center_offset
                    );
                    self.viewport.swap(node, resource, &mut self.camera);
                    self.status.status("Model loaded successfully!");
                }
                SessionOutcome::Discarded { .. } => {}
            },
            LoadEventKind::Failed(error) => {
                if let Some(failure) = self.sessions.on_failure(token, resource, error) {
                    self.status
                        .status(&format!("Error loading model: {}", failure.error));
                    self.status.error(&Failure::Load(failure));
                }
            }
        }
    }

    /// Drain and apply pending loader events. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let events = self.loader.poll();
        let n = events.len();
        for event in events {
            self.handle_event(event);
        }
        n
    }

    /// Per-frame tick: apply loader events, then snapshot the camera.
    pub fn frame(&mut self) -> FrameState {
        self.pump();
        FrameState {
            camera: CameraUniform::from_rig(&self.camera),
            aspect: self.camera.aspect(),
            surface: self.camera.surface(),
            displayed: self.viewport.displayed_resource().cloned(),
            loading: self.is_loading(),
        }
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.camera.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.camera.zoom_out()
    }

    pub fn resize(&mut self, width: u32, height: u32) -> SurfaceSize {
        self.camera.on_resize(width, height)
    }

    pub fn is_loading(&self) -> bool {
        self.sessions.current().is_some_and(|s| !s.is_terminal())
    }

    pub fn current_resource(&self) -> ResourceLocator {
        self.viewport.current_resource()
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn sessions(&self) -> &LoadTracker {
        &self.sessions
    }

    pub fn catalog(&self) -> &[ModelEntry] {
        &self.catalog
    }

    pub fn set_catalog(&mut self, catalog: Vec<ModelEntry>) {
        self.catalog = catalog;
    }

    pub fn status(&self) -> &dyn StatusSink {
        self.status.as_ref()
    }
}
