//! WASM bindings for the web viewer
//!
//! The page owns the render loop and the DOM; it calls `frame()` once per
//! animation frame and forwards button / input events to the methods here.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::config::ViewerConfig;
use crate::gateway::{ActionGateway, CustomizeOptions};
use crate::http_adapter::{FetchTransport, ModelFile};
use crate::loader::FetchModelLoader;
use crate::status::DomStatus;
use crate::storage::WebSessionStore;
use crate::viewer::Viewer;
use crate::viewport::MemoryScene;

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WasmViewer {
    viewer: Rc<RefCell<Viewer>>,
    gateway: Rc<ActionGateway<FetchTransport>>,
}

#[wasm_bindgen]
impl WasmViewer {
    /// `config_json` overrides any subset of the default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WasmViewer, JsValue> {
        let config: ViewerConfig = match config_json {
            Some(json) => serde_json::from_str(&json).map_err(js_err)?,
            None => ViewerConfig::default(),
        };

        let gateway = ActionGateway::new(FetchTransport, &config);
        let viewer = Viewer::new(
            config,
            Box::new(MemoryScene::new()),
            Box::new(WebSessionStore::new()),
            Box::new(FetchModelLoader::new()),
            Box::new(DomStatus::new("debugInfo")),
        );

        Ok(Self {
            viewer: Rc::new(RefCell::new(viewer)),
            gateway: Rc::new(gateway),
        })
    }

    /// Show the persisted model, or the default one on a first visit.
    /// Returns the session token.
    pub fn start(&self) -> f64 {
        let mut viewer = self.viewer.borrow_mut();
        let token = match viewer.restore() {
            Some(token) => token,
            None => {
                let resource = viewer.current_resource();
                viewer.load(resource)
            }
        };
        token.get() as f64
    }

    pub fn select_model(&self, name: &str) -> f64 {
        self.gateway.select_existing(&self.viewer, name).get() as f64
    }

    /// Resolves with the session token, rejects with the user-facing message.
    pub fn upload(&self, name: String, bytes: Vec<u8>) -> js_sys::Promise {
        let viewer = self.viewer.clone();
        let gateway = self.gateway.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            gateway
                .upload(&viewer, ModelFile::new(name, bytes))
                .await
                .map(|token| JsValue::from_f64(token.get() as f64))
                .map_err(js_err)
        })
    }

    pub fn customize(
        &self,
        color: String,
        scale: String,
        texture_prompt: String,
        model_filename: Option<String>,
    ) -> js_sys::Promise {
        let viewer = self.viewer.clone();
        let gateway = self.gateway.clone();
        let options = CustomizeOptions {
            color,
            scale,
            texture_prompt,
            model_filename,
        };
        wasm_bindgen_futures::future_to_promise(async move {
            gateway
                .customize(&viewer, options)
                .await
                .map(|token| JsValue::from_f64(token.get() as f64))
                .map_err(js_err)
        })
    }

    /// Refresh the model catalog; resolves with a JSON array of
    /// `{name, url}`.
    pub fn list_models(&self) -> js_sys::Promise {
        let viewer = self.viewer.clone();
        let gateway = self.gateway.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            let models = gateway.list_models(&viewer).await.map_err(js_err)?;
            let json = serde_json::to_string(&models).map_err(js_err)?;
            Ok(JsValue::from_str(&json))
        })
    }

    pub fn zoom_in(&self) -> f32 {
        self.viewer.borrow_mut().zoom_in()
    }

    pub fn zoom_out(&self) -> f32 {
        self.viewer.borrow_mut().zoom_out()
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.viewer.borrow_mut().resize(width, height);
    }

    /// Camera uniform for this frame as a flat f32 array
    /// (view[16], proj[16], view_proj[16], eye[3], pad).
    pub fn frame(&self) -> Vec<f32> {
        let state = self.viewer.borrow_mut().frame();
        bytemuck::cast_slice(&[state.camera]).to_vec()
    }

    pub fn current_model(&self) -> String {
        self.viewer.borrow().current_resource().to_string()
    }
}

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}
