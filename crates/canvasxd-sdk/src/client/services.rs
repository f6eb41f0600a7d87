use std::collections::BTreeMap;
use std::sync::PoisonError;

use serde::Serialize;
use serde_json::{Map, Value};

use canvasxd_core::error::{CanvasError, Result};
use canvasxd_core::protocol::envelope::{AjaxConfig, ClientDescriptor, Message, MessageConfig, Response};

use super::Client;
use crate::correlation::ResponseCallback;

const WILDCARD: &str = "*";

/// Settings for a relayed REST call.
///
/// `success` is required and is parked in the correlation registry; it never
/// crosses the wire. Headers merge per key over the defaults.
#[derive(Default)]
pub struct AjaxSettings {
    client: Option<ClientDescriptor>,
    method: Option<String>,
    is_async: Option<bool>,
    content_type: Option<String>,
    headers: BTreeMap<String, String>,
    data: Value,
    target_origin: Option<String>,
    extra: Map<String, Value>,
    success: Option<ResponseCallback>,
}

impl AjaxSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(mut self, client: ClientDescriptor) -> Self {
        self.client = Some(client);
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn is_async(mut self, is_async: bool) -> Self {
        self.is_async = Some(is_async);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Parent origin hint, adopted when it is an http(s) URL.
    pub fn target_origin(mut self, origin: impl Into<String>) -> Self {
        self.target_origin = Some(origin.into());
        self
    }

    /// Pass-through setting relayed verbatim to the parent.
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn success(mut self, f: impl FnOnce(Response) + Send + 'static) -> Self {
        self.success = Some(Box::new(f));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub client_version: String,
    pub parent_version: Option<String>,
}

impl Client {
    /// Relay a REST call through the parent. The answer (or a synthetic
    /// 400/401 for a bad descriptor) arrives at `settings.success`.
    pub fn ajax(&self, url: &str, settings: AjaxSettings) -> Result<()> {
        if url.is_empty() {
            return Err(CanvasError::Precondition("url required with ajax call".into()));
        }
        let AjaxSettings {
            client,
            method,
            is_async,
            content_type,
            headers,
            data,
            target_origin,
            extra,
            success,
        } = settings;
        let success = success.ok_or_else(|| {
            CanvasError::Precondition("ajax settings.success missing".into())
        })?;

        let mut client = match self.checked_client(client) {
            Ok(c) => c,
            Err(rejected) => {
                tracing::debug!(status = ?rejected.status, "ajax client rejected");
                success(rejected);
                return Ok(());
            }
        };

        let mut merged = BTreeMap::new();
        merged.insert("Authorization".to_string(), format!("OAuth {}", client.token()));
        merged.insert("Accept".to_string(), "application/json".to_string());
        merged.extend(headers);

        if client.target_origin.as_deref() == Some(WILDCARD) {
            client.target_origin = None;
        } else if let Some(origin) = target_origin.as_deref() {
            self.inner.resolver.adopt(origin);
        }

        let config = AjaxConfig {
            client,
            method: method.unwrap_or_else(|| "GET".into()),
            is_async: is_async.unwrap_or(true),
            content_type: content_type.unwrap_or_else(|| "application/json".into()),
            headers: merged,
            data,
            target_origin,
            extra,
        };
        self.postit(
            Some(success),
            Message::Ajax {
                url: url.to_string(),
                config,
            },
        )?;
        Ok(())
    }

    /// Ask the parent for the canvas context.
    pub fn ctx(
        &self,
        callback: impl FnOnce(Response) + Send + 'static,
        client: Option<ClientDescriptor>,
    ) -> Result<()> {
        let client = match self.checked_client(client) {
            Ok(c) => c,
            Err(rejected) => {
                callback(rejected);
                return Ok(());
            }
        };
        let access_token = client.token().to_string();
        self.postit(
            Some(Box::new(callback)),
            Message::Ctx {
                access_token,
                config: client.into(),
            },
        )?;
        Ok(())
    }

    /// Request a fresh signed request for this frame.
    pub fn refresh_signed_request(
        &self,
        callback: impl FnOnce(Response) + Send + 'static,
    ) -> Result<()> {
        let client = self.frame_client();
        self.postit(
            Some(Box::new(callback)),
            Message::Refresh {
                access_token: client.token().to_string(),
                config: client.into(),
            },
        )?;
        Ok(())
    }

    /// Ask the parent to re-post the signed request, optionally refreshing it.
    pub fn repost(&self, refresh: bool) -> Result<()> {
        let client = self.frame_client();
        self.postit(
            None,
            Message::Repost {
                access_token: client.token().to_string(),
                config: MessageConfig::from(client),
                refresh,
            },
        )?;
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.inner.session.token()
    }

    pub fn set_token(&self, token: Option<String>) {
        self.inner.session.set_token(token);
    }

    pub fn version(&self) -> VersionInfo {
        VersionInfo {
            client_version: self.inner.cfg.client.client_version.clone(),
            parent_version: self.inner.parent_version.get(),
        }
    }

    pub fn signed_request(&self) -> Option<Value> {
        self.inner
            .signed_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_signed_request(&self, signed_request: Value) {
        *self
            .inner
            .signed_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(signed_request);
    }

    /// Anonymous descriptor addressed by this frame's instance id.
    fn frame_client(&self) -> ClientDescriptor {
        let name = self.inner.host.window_name().unwrap_or_default();
        let prefix = &self.inner.cfg.client.frame_name_prefix;
        let id = name.strip_prefix(prefix.as_str()).unwrap_or(&name);
        ClientDescriptor::anonymous(id)
    }
}
