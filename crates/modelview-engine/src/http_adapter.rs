//! HTTP adapters for the model server.
//!
//! Native hosts talk to the server with `reqwest`; the web viewer uses the
//! browser's fetch API. Both implement `ApiTransport`, which the action
//! gateway is generic over.

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// File picked by the user for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ModelFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Lowercased extension of `name`, if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

/// JSON body of `POST /api/customize-model`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomizePayload {
    pub color: String,
    pub scale: f64,
    pub texture_prompt: String,
    pub model_filename: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ApiRequest {
    /// Multipart POST with the file under field `file`
    Upload { url: String, file: ModelFile },
    /// JSON POST
    Customize { url: String, payload: CustomizePayload },
    ListModels { url: String },
}

impl ApiRequest {
    pub fn url(&self) -> &str {
        match self {
            ApiRequest::Upload { url, .. }
            | ApiRequest::Customize { url, .. }
            | ApiRequest::ListModels { url } => url,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            ApiRequest::ListModels { .. } => "GET",
            _ => "POST",
        }
    }
}

/// Status and raw body of a server reply.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and hands back the reply, whatever its status.
///
/// Only a request that produced no reply at all is an `Err`.
#[allow(async_fn_in_trait)]
pub trait ApiTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiReply, TransportError>;
}

// -----------------------------
// Native (reqwest) adapter
// -----------------------------

#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(not(target_arch = "wasm32"))]
impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ApiTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiReply, TransportError> {
        tracing::debug!("{} {}", request.method(), request.url());

        let builder = match request {
            ApiRequest::Upload { url, file } => {
                let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.name);
                let form = reqwest::multipart::Form::new().part("file", part);
                self.client.post(url).multipart(form)
            }
            ApiRequest::Customize { url, payload } => self.client.post(url).json(&payload),
            ApiRequest::ListModels { url } => self.client.get(url),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        tracing::debug!("HTTP {} ({} bytes)", status, body.len());
        Ok(ApiReply { status, body })
    }
}

// -----------------------------
// WASM (fetch) adapter
// -----------------------------

#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchTransport;

#[cfg(target_arch = "wasm32")]
fn js_err(e: wasm_bindgen::JsValue) -> TransportError {
    TransportError(format!("{:?}", e))
}

#[cfg(target_arch = "wasm32")]
impl ApiTransport for FetchTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiReply, TransportError> {
        use wasm_bindgen::JsCast;
        use wasm_bindgen_futures::JsFuture;

        let win = web_sys::window().ok_or_else(|| TransportError("no window".to_string()))?;

        let init = web_sys::RequestInit::new();
        init.set_method(request.method());
        match &request {
            ApiRequest::Upload { file, .. } => {
                let parts = js_sys::Array::new();
                parts.push(&js_sys::Uint8Array::from(file.bytes.as_slice()));
                let blob = web_sys::Blob::new_with_u8_array_sequence(&parts).map_err(js_err)?;
                let form = web_sys::FormData::new().map_err(js_err)?;
                form.append_with_blob_and_filename("file", &blob, &file.name)
                    .map_err(js_err)?;
                init.set_body(&form);
            }
            ApiRequest::Customize { payload, .. } => {
                let json = serde_json::to_string(payload).map_err(|e| TransportError(e.to_string()))?;
                init.set_body(&wasm_bindgen::JsValue::from_str(&json));
            }
            ApiRequest::ListModels { .. } => {}
        }

        let req = web_sys::Request::new_with_str_and_init(request.url(), &init).map_err(js_err)?;
        if matches!(request, ApiRequest::Customize { .. }) {
            req.headers()
                .set("Content-Type", "application/json")
                .map_err(js_err)?;
        }

        let resp_val = JsFuture::from(win.fetch_with_request(&req))
            .await
            .map_err(js_err)?;
        let resp: web_sys::Response = resp_val.dyn_into().map_err(js_err)?;

        let text_val = JsFuture::from(resp.text().map_err(js_err)?)
            .await
            .map_err(js_err)?;

        Ok(ApiReply {
            status: resp.status(),
            body: text_val.as_string().unwrap_or_default(),
        })
    }
}

/// GET `url` and return the body bytes; non-2xx is an error.
#[cfg(target_arch = "wasm32")]
pub async fn fetch_bytes(url: &str) -> anyhow::Result<Vec<u8>> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let js = |e: wasm_bindgen::JsValue| anyhow::anyhow!("{:?}", e);

    let win = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let resp_val = JsFuture::from(win.fetch_with_str(url)).await.map_err(js)?;
    let resp: web_sys::Response = resp_val.dyn_into().map_err(js)?;

    if !resp.ok() {
        anyhow::bail!("HTTP {} {}", resp.status(), resp.status_text());
    }

    let buf_promise = resp.array_buffer().map_err(js)?;
    let buf_val = JsFuture::from(buf_promise).await.map_err(js)?;
    Ok(js_sys::Uint8Array::new(&buf_val).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customize_payload_field_names() {
        let payload = CustomizePayload {
            color: "#ff0000".to_string(),
            scale: 1.5,
            texture_prompt: "oak".to_string(),
            model_filename: "sofa.glb".to_string(),
        };
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "color": "#ff0000",
                "scale": 1.5,
                "texture_prompt": "oak",
                "model_filename": "sofa.glb"
            })
        );
    }

    #[test]
    fn test_request_method_and_url() {
        let list = ApiRequest::ListModels { url: "/api/list-models".to_string() };
        assert_eq!(list.method(), "GET");
        assert_eq!(list.url(), "/api/list-models");

        let upload = ApiRequest::Upload {
            url: "/api/upload-model".to_string(),
            file: ModelFile::new("x.glb", vec![1, 2, 3]),
        };
        assert_eq!(upload.method(), "POST");
    }

    #[test]
    fn test_reply_success_range() {
        assert!(ApiReply::new(200, "").is_success());
        assert!(ApiReply::new(204, "").is_success());
        assert!(!ApiReply::new(400, "").is_success());
        assert!(!ApiReply::new(302, "").is_success());
    }

    #[test]
    fn test_model_file_extension() {
        assert_eq!(ModelFile::new("Chair.GLTF", vec![]).extension().as_deref(), Some("gltf"));
        assert_eq!(ModelFile::new("noext", vec![]).extension(), None);
    }
}
