//! User-triggered actions: select an existing model, upload a new one,
//! request a customization.
//!
//! Every action leaves the viewport untouched when it fails; only a load
//! session that completes can change what is displayed. The viewer is
//! borrowed only between awaits, never across one, so render ticks keep
//! running while a request is in flight.

use serde::Deserialize;
use std::cell::RefCell;
use tracing::{info, warn};

use crate::config::{ApiConfig, UploadLimits, ViewerConfig};
use crate::error::{ActionError, ActionResult, Failure, GENERIC_ERROR};
use crate::http_adapter::{ApiReply, ApiRequest, ApiTransport, CustomizePayload, ModelFile};
use crate::resource::ResourceLocator;
use crate::session::SessionToken;
use crate::viewer::{ModelEntry, Viewer};

pub const INVALID_SCALE_MESSAGE: &str = "Please enter a valid number for scale";

/// Raw customization form input. `scale` is the text as typed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CustomizeOptions {
    pub color: String,
    pub scale: String,
    pub texture_prompt: String,
    /// Defaults to the file name of the current model
    pub model_filename: Option<String>,
}

#[derive(Deserialize)]
struct ModelUrlBody {
    model_url: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct CatalogBody {
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub struct ActionGateway<T: ApiTransport> {
    transport: T,
    api: ApiConfig,
    model_dir: String,
    limits: UploadLimits,
}

impl<T: ApiTransport> ActionGateway<T> {
    pub fn new(transport: T, config: &ViewerConfig) -> Self {
        Self {
            transport,
            api: config.api.clone(),
            model_dir: config.model_dir.clone(),
            limits: config.upload.clone(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Show a model already on the server, by file name.
    pub fn select_existing(&self, viewer: &RefCell<Viewer>, name: &str) -> SessionToken {
        let resource = ResourceLocator::in_directory(&self.model_dir, name);
        viewer.borrow_mut().load(resource)
    }

    /// Upload `file` and display the stored copy.
    pub async fn upload(&self, viewer: &RefCell<Viewer>, file: ModelFile) -> ActionResult<SessionToken> {
        if let Err(err) = self.validate_upload(&file) {
            report_invalid(viewer, &err);
            return Err(err);
        }

        info!("Uploading {} ({} bytes)", file.name, file.bytes.len());
        viewer.borrow().status().status("Uploading model...");

        let request = ApiRequest::Upload {
            url: self.api.upload_url(),
            file,
        };
        let resolved = match self.transport.send(request).await {
            Ok(reply) => model_url_from(&reply),
            Err(e) => Err(e.into()),
        };

        match resolved {
            Ok(resource) => {
                viewer.borrow().status().status("Model uploaded successfully!");
                if let Err(e) = self.list_models(viewer).await {
                    warn!("Model catalog refresh failed: {}", e);
                }
                Ok(viewer.borrow_mut().load(resource))
            }
            Err(err) => {
                report_failure(
                    viewer,
                    "Error uploading model".to_string(),
                    format!("Error uploading model: {err}"),
                    &err,
                );
                Err(err)
            }
        }
    }

    /// Ask the server to recolor / rescale / retexture a model, then display
    /// the result.
    pub async fn customize(
        &self,
        viewer: &RefCell<Viewer>,
        options: CustomizeOptions,
    ) -> ActionResult<SessionToken> {
        let scale = match parse_scale(&options.scale) {
            Ok(scale) => scale,
            Err(err) => {
                report_invalid(viewer, &err);
                return Err(err);
            }
        };

        let model_filename = options
            .model_filename
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| viewer.borrow().current_resource().file_name().to_string());

        info!("Customizing {}", model_filename);
        viewer.borrow().status().status("Customizing model...");

        let request = ApiRequest::Customize {
            url: self.api.customize_url(),
            payload: CustomizePayload {
                color: options.color,
                scale,
                texture_prompt: options.texture_prompt,
                model_filename,
            },
        };
        let resolved = match self.transport.send(request).await {
            Ok(reply) => model_url_from(&reply),
            Err(e) => Err(e.into()),
        };

        match resolved {
            Ok(resource) => {
                viewer.borrow().status().status("Customization successful!");
                Ok(viewer.borrow_mut().load(resource))
            }
            Err(err) => {
                report_failure(
                    viewer,
                    format!("Error: {err}"),
                    format!("Error customizing model: {err}"),
                    &err,
                );
                Err(err)
            }
        }
    }

    /// Fetch the server's model catalog and hand it to the viewer.
    pub async fn list_models(&self, viewer: &RefCell<Viewer>) -> ActionResult<Vec<ModelEntry>> {
        let reply = self
            .transport
            .send(ApiRequest::ListModels {
                url: self.api.list_url(),
            })
            .await?;

        if !reply.is_success() {
            return Err(server_error(&reply));
        }

        let body: CatalogBody =
            serde_json::from_str(&reply.body).map_err(|e| ActionError::MalformedResponse {
                status: reply.status,
                detail: e.to_string(),
            })?;

        viewer.borrow_mut().set_catalog(body.models.clone());
        Ok(body.models)
    }

    fn validate_upload(&self, file: &ModelFile) -> ActionResult<()> {
        if file.name.trim().is_empty() {
            return Err(ActionError::Validation("No file selected".to_string()));
        }

        let allowed = file.extension().is_some_and(|ext| {
            self.limits
                .allowed_extensions
                .iter()
                .any(|a| a.eq_ignore_ascii_case(&ext))
        });
        if !allowed {
            return Err(ActionError::Validation("Invalid file type".to_string()));
        }

        if file.bytes.len() as u64 > self.limits.max_bytes {
            return Err(ActionError::Validation(format!(
                "File exceeds {} bytes",
                self.limits.max_bytes
            )));
        }
        Ok(())
    }
}

/// Scale input must be a finite number, surrounding whitespace aside.
pub fn parse_scale(input: &str) -> ActionResult<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ActionError::Validation(INVALID_SCALE_MESSAGE.to_string()))
}

/// `{model_url}` on success, the server's `{error}` (or a generic message)
/// otherwise.
fn model_url_from(reply: &ApiReply) -> ActionResult<ResourceLocator> {
    let body: Option<ModelUrlBody> = serde_json::from_str(&reply.body).ok();

    match body {
        Some(ModelUrlBody {
            model_url: Some(url),
            ..
        }) if reply.is_success() && !url.is_empty() => Ok(ResourceLocator::new(url)),
        Some(ModelUrlBody {
            error: Some(message),
            ..
        }) => Err(ActionError::Server {
            status: reply.status,
            message,
        }),
        _ if !reply.is_success() => Err(server_error(reply)),
        _ => Err(ActionError::MalformedResponse {
            status: reply.status,
            detail: "missing model_url".to_string(),
        }),
    }
}

fn server_error(reply: &ApiReply) -> ActionError {
    let message = serde_json::from_str::<ErrorBody>(&reply.body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| GENERIC_ERROR.to_string());

    ActionError::Server {
        status: reply.status,
        message,
    }
}

fn report_invalid(viewer: &RefCell<Viewer>, err: &ActionError) {
    let viewer = viewer.borrow();
    viewer.status().error(&Failure::Action(err.clone()));
    viewer.status().alert(&err.to_string());
}

fn report_failure(viewer: &RefCell<Viewer>, status: String, alert: String, err: &ActionError) {
    warn!("{}", alert);
    let viewer = viewer.borrow();
    viewer.status().status(&status);
    viewer.status().error(&Failure::Action(err.clone()));
    viewer.status().alert(&alert);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scale() {
        assert_eq!(parse_scale("1.5").unwrap(), 1.5);
        assert_eq!(parse_scale("  2 ").unwrap(), 2.0);
        assert_eq!(parse_scale("-0.25").unwrap(), -0.25);

        for bad in ["abc", "", "12abc", "NaN", "inf", "1e400"] {
            let err = parse_scale(bad).unwrap_err();
            assert!(err.is_validation(), "{bad:?} accepted");
            assert_eq!(err.to_string(), INVALID_SCALE_MESSAGE);
        }
    }

    #[test]
    fn test_model_url_success() {
        let reply = ApiReply::new(200, r#"{"message": "ok", "model_url": "/static/models/x.glb"}"#);
        assert_eq!(model_url_from(&reply).unwrap().as_str(), "/static/models/x.glb");
    }

    #[test]
    fn test_model_url_server_error_message() {
        let reply = ApiReply::new(400, r#"{"error": "bad file"}"#);
        let err = model_url_from(&reply).unwrap_err();
        assert_eq!(err, ActionError::Server { status: 400, message: "bad file".to_string() });
        assert_eq!(err.to_string(), "bad file");
    }

    #[test]
    fn test_model_url_generic_on_unparsable_failure() {
        let reply = ApiReply::new(500, "<html>Internal Server Error</html>");
        assert_eq!(model_url_from(&reply).unwrap_err().to_string(), GENERIC_ERROR);
    }

    #[test]
    fn test_model_url_missing_on_success() {
        let reply = ApiReply::new(200, r#"{"message": "3D model customized!"}"#);
        let err = model_url_from(&reply).unwrap_err();
        assert!(matches!(err, ActionError::MalformedResponse { status: 200, .. }));
        assert_eq!(err.to_string(), GENERIC_ERROR);
    }

    #[test]
    fn test_error_field_wins_even_with_success_status() {
        let reply = ApiReply::new(200, r#"{"error": "Model not found"}"#);
        assert_eq!(model_url_from(&reply).unwrap_err().to_string(), "Model not found");
    }
}
