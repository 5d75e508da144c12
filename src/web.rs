use crate::{built_info, decode_hdr, Error, ImageLoader, PendingImage, Precompute, PrecomputeConfig};
use js_sys::Uint8Array;
use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{WebGl2RenderingContext, WebGlTexture, XmlHttpRequest, XmlHttpRequestResponseType};

impl From<Error> for JsValue {
    fn from(error: Error) -> Self {
        js_sys::Error::new(&error.to_string()).into()
    }
}

fn as_json<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    Ok(JsValue::from_serde(value).map_err(|e| js_sys::Error::new(&e.to_string()))?)
}

fn from_json<T: DeserializeOwned>(json: &JsValue) -> Result<T, JsValue> {
    Ok(json.into_serde().map_err(|e| js_sys::Error::new(&e.to_string()))?)
}

/// Loads radiance images over HTTP as array buffers.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchLoader;

impl ImageLoader for FetchLoader {
    fn load(&self, url: &str) -> PendingImage {
        let pending = PendingImage::new();

        if let Err(error) = fetch(url, &pending) {
            pending.resolve(Err(error));
        }

        pending
    }
}

fn request_error(url: &str, reason: impl ToString) -> Error {
    Error::ImageLoad {
        url: url.to_owned(),
        reason: reason.to_string(),
    }
}

fn fetch(url: &str, pending: &PendingImage) -> Result<(), Error> {
    let js_error = |err: JsValue| request_error(url, format!("{:?}", err));

    let request = XmlHttpRequest::new().map_err(js_error)?;
    request.open("GET", url).map_err(js_error)?;
    request.set_response_type(XmlHttpRequestResponseType::Arraybuffer);

    let onload = {
        let request = request.clone();
        let pending = pending.clone();
        let url = url.to_owned();

        Closure::once_into_js(move || {
            let status = request.status().unwrap_or(0);

            let result = if (200..300).contains(&status) {
                request
                    .response()
                    .map_err(|err| request_error(&url, format!("{:?}", err)))
                    .and_then(|body| decode_hdr(&Uint8Array::new(&body).to_vec()))
            } else {
                Err(request_error(&url, format!("HTTP status {}", status)))
            };

            pending.resolve(result);
        })
    };

    let onerror = {
        let pending = pending.clone();
        let url = url.to_owned();

        Closure::once_into_js(move || {
            pending.resolve(Err(request_error(&url, "network error")));
        })
    };

    request.set_onload(Some(onload.unchecked_ref()));
    request.set_onerror(Some(onerror.unchecked_ref()));
    request.send().map_err(js_error)?;

    Ok(())
}

/// WASM binding for the precompute pipeline.
#[wasm_bindgen]
#[derive(Debug)]
pub struct WebPrecompute {
    precompute: Precompute<WebGl2RenderingContext>,
}

#[wasm_bindgen]
impl WebPrecompute {
    /// Creates a pipeline, using the default configuration if `config` is
    /// undefined or null.
    #[wasm_bindgen(constructor)]
    pub fn new(context: &WebGl2RenderingContext, config: JsValue) -> Result<WebPrecompute, JsValue> {
        let config: PrecomputeConfig = if config.is_undefined() || config.is_null() {
            PrecomputeConfig::default()
        } else {
            from_json(&config)?
        };

        Ok(Self {
            precompute: Precompute::new(context.clone(), config, Box::new(FetchLoader))?,
        })
    }

    pub fn config(&self) -> Result<JsValue, JsValue> {
        as_json(self.precompute.config())
    }

    /// Starts fetching the equirectangular radiance image at `url`.
    pub fn set_image(&mut self, url: &str) -> Result<(), JsValue> {
        Ok(self.precompute.set_image(url)?)
    }

    /// Advances the pipeline, returning true if a stage completed.
    ///
    /// Call once per frame until `is_ready` returns true.
    pub fn update(&mut self) -> Result<bool, JsValue> {
        Ok(self.precompute.update()?)
    }

    pub fn is_ready(&self) -> bool {
        self.precompute.is_ready()
    }

    /// Human-readable name of the current stage.
    pub fn stage(&self) -> String {
        self.precompute.stage().to_string()
    }

    pub fn environment_map(&self) -> Option<WebGlTexture> {
        self.precompute.environment_map().map(|info| info.handle.clone())
    }

    pub fn irradiance_map(&self) -> Option<WebGlTexture> {
        self.precompute.irradiance_map().map(|info| info.handle.clone())
    }

    pub fn prefiltered_map(&self) -> Option<WebGlTexture> {
        self.precompute.prefiltered_map().map(|info| info.handle.clone())
    }

    /// Number of roughness levels in the prefiltered map, zero until ready.
    pub fn prefiltered_levels(&self) -> u32 {
        self.precompute
            .prefiltered_map()
            .map_or(0, |info| info.levels as u32)
    }

    pub fn brdf_lut(&self) -> Option<WebGlTexture> {
        self.precompute.brdf_lut().map(|info| info.handle.clone())
    }
}

/// Returns a version string for the WASM module.
#[wasm_bindgen]
pub fn version() -> String {
    format!(
        "IBL precompute v{} ({}, WebGL2)",
        built_info::PKG_VERSION,
        built_info::GIT_VERSION.unwrap_or("unknown revision")
    )
}

/// Configures browser logging functionality.
///
/// This function is safe to call more than once and will do nothing should it
/// be called more than once; this lets it co-exist nicely with hot reloaders.
#[wasm_bindgen]
pub fn initialize_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init();
}
