//! Per-request pull parameters.
//!
//! Built from the `fromImage`/`tag` query parameters, the `X-Registry-Auth`
//! header, and the server-wide store location and scratch directory.

use std::fmt;
use std::path::PathBuf;

use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::Deserialize;

use crate::error::CoreError;

/// Header carrying the client's base64-encoded registry credentials.
pub const REGISTRY_AUTH_HEADER: &str = "x-registry-auth";

/// Credentials decoded from the `X-Registry-Auth` header.
///
/// Every field is optional; an absent header yields anonymous credentials.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegistryAuth {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "serveraddress")]
    pub server_address: Option<String>,
}

impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("email", &self.email)
            .field("server_address", &self.server_address)
            .finish()
    }
}

impl RegistryAuth {
    /// Decode the raw header value.
    ///
    /// Docker clients send URL-safe base64 (with or without padding); some
    /// tools send the standard alphabet, so all three are accepted.
    pub fn from_header(value: Option<&str>) -> Result<Self, CoreError> {
        let raw = match value.map(str::trim) {
            None | Some("") => return Ok(Self::default()),
            Some(raw) => raw,
        };

        let decoded = URL_SAFE
            .decode(raw)
            .or_else(|_| URL_SAFE_NO_PAD.decode(raw))
            .or_else(|_| STANDARD.decode(raw))
            .map_err(|e| {
                CoreError::Unauthorized(format!("X-Registry-Auth is not valid base64: {e}"))
            })?;

        serde_json::from_slice(&decoded).map_err(|e| {
            CoreError::Unauthorized(format!("X-Registry-Auth is not a valid credential object: {e}"))
        })
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}

/// Everything an engine needs to perform one pull.
#[derive(Debug, Clone)]
pub struct PullParams {
    /// Image reference, e.g. `myimage:latest`.
    pub image: String,
    /// Remote store location the image is fetched from.
    pub store_url: String,
    pub auth: RegistryAuth,
    /// Directory under which the engine may create scratch space.
    pub temp_dir: PathBuf,
}

impl PullParams {
    pub fn new(
        from_image: Option<&str>,
        tag: Option<&str>,
        auth_header: Option<&str>,
        store_url: &str,
        temp_dir: PathBuf,
    ) -> Result<Self, CoreError> {
        let auth = RegistryAuth::from_header(auth_header)?;
        let image = image_reference(from_image, tag)?;

        Ok(Self {
            image,
            store_url: store_url.to_string(),
            auth,
            temp_dir,
        })
    }
}

/// Combine `fromImage` and the optional `tag` into one reference.
///
/// A tag is only appended when `from_image` carries neither a tag nor a
/// digest of its own.
pub fn image_reference(from_image: Option<&str>, tag: Option<&str>) -> Result<String, CoreError> {
    let image = from_image.map(str::trim).unwrap_or_default();
    if image.is_empty() {
        return Err(CoreError::Validation(
            "fromImage query parameter is required".into(),
        ));
    }
    if image.chars().any(char::is_whitespace) {
        return Err(CoreError::Validation(format!(
            "Invalid image reference '{image}'"
        )));
    }

    let tag = tag.map(str::trim).filter(|t| !t.is_empty());
    let last_segment = image.rsplit('/').next().unwrap_or(image);
    let has_tag = last_segment.contains(':') || image.contains('@');

    Ok(match tag {
        Some(tag) if !has_tag => format!("{image}:{tag}"),
        _ => image.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
