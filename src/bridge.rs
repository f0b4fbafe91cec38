use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::{bail, Context, Result};
use log::warn;
use reqwest::{header, Method};
use serde::Deserialize;
use serde_json::Value;
use tauri_plugin_dialog::DialogExt;

/// Last username seen in a backend response. One writer (the fetch
/// path), one reader (the re-display path); never cleared.
#[derive(Clone, Default)]
pub struct SessionContext {
    username: Arc<RwLock<Option<String>>>,
}

impl SessionContext {
    pub fn username(&self) -> Option<String> {
        self.username.read().unwrap().clone()
    }

    pub fn remember_username(&self, name: &str) {
        *self.username.write().unwrap() = Some(name.to_string());
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchOptions {
    pub method: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

/// Perform an HTTP request on behalf of the webview and decode the
/// response as JSON.
///
/// A non-success status fails with the numeric code before any body
/// handling. An empty body (content-length 0) and an undecodable body
/// both yield `{}`; the latter logs the raw text for diagnosis instead
/// of failing the caller. A `username` field in any decoded response
/// updates the session context.
pub async fn perform_fetch(
    client: &reqwest::Client,
    ctx: &SessionContext,
    url: &str,
    options: FetchOptions,
) -> Result<Value> {
    let url: reqwest::Url = url.parse().context("invalid request URL")?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("unsupported URL scheme '{}'", url.scheme());
    }

    let method = parse_method(options.method.as_deref())?;

    let mut request = client.request(method, url.clone());
    for (name, value) in &options.headers {
        request = request.header(name.as_str(), value.as_str());
    }
    if let Some(body) = options.body {
        request = request.body(body);
    }

    let response = request
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;

    let status = response.status();
    if !status.is_success() {
        bail!("request to {url} failed with status {}", status.as_u16());
    }

    if response.content_length() == Some(0) {
        return Ok(empty_object());
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.contains("json") {
        warn!("[bridge] {url} answered with content type '{content_type}', decoding as JSON anyway");
    }

    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("failed to read response body from {url}"))?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) => {
            if let Some(name) = value.get("username").and_then(Value::as_str) {
                ctx.remember_username(name);
            }
            Ok(value)
        }
        Err(err) => {
            warn!("[bridge] failed to decode response from {url}: {err}");
            warn!("[bridge] raw body: {}", String::from_utf8_lossy(&bytes));
            Ok(empty_object())
        }
    }
}

fn parse_method(method: Option<&str>) -> Result<Method> {
    let name = method.unwrap_or("GET").to_ascii_uppercase();
    match name.as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        "HEAD" => Ok(Method::HEAD),
        other => bail!("unsupported HTTP method '{other}'"),
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveDialogOptions {
    pub title: Option<String>,
    pub default_path: Option<String>,
    pub filters: Vec<DialogFilter>,
}

#[derive(Debug, Deserialize)]
pub struct DialogFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

/// Relay a save-file dialog to the host and hand back the chosen path,
/// or `None` when the user cancels.
pub async fn save_dialog<R: tauri::Runtime>(
    window: &tauri::WebviewWindow<R>,
    options: SaveDialogOptions,
) -> Result<Option<String>> {
    let mut dialog = window.dialog().file();
    if let Some(title) = options.title {
        dialog = dialog.set_title(title);
    }
    if let Some(default_path) = options.default_path {
        dialog = dialog.set_file_name(default_path);
    }
    for filter in &options.filters {
        let extensions: Vec<&str> = filter.extensions.iter().map(String::as_str).collect();
        dialog = dialog.add_filter(&filter.name, &extensions);
    }

    let (tx, rx) = tokio::sync::oneshot::channel();
    dialog.save_file(move |path| {
        let _ = tx.send(path);
    });

    let picked = rx.await.context("save dialog closed without a result")?;
    match picked {
        Some(path) => {
            let path = path.into_path().context("save dialog returned a non-path location")?;
            Ok(Some(path.to_string_lossy().into_owned()))
        }
        None => Ok(None),
    }
}
