//! Renders normalized errors through configurable JSON templates.
//!
//! A template is any JSON object. String leaves equal to `:success`, `:data`,
//! `:message`, `:code` or `:meta` are replaced; every other leaf is copied
//! as is. A placeholder with no value (`:meta` without debug context) is
//! removed from its parent instead of being rendered as `null`.

use serde_json::{Map, Value, json};
use tracing::warn;

use crate::{config::ResponseSettings, normalize::NormalizedError, types::ErrorCode};

const META_PLACEHOLDER: &str = ":meta";

/// Values substituted into a template.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderVars {
    pub success: bool,
    pub data: Value,
    pub message: String,
    pub code: ErrorCode,
    pub meta: Option<Value>,
}

impl RenderVars {
    pub fn new(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            success: false,
            data: Value::Null,
            message: message.into(),
            code,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Resolves a leaf. `None` means the leaf is not a placeholder,
    /// `Some(None)` that it is one without a value.
    fn placeholder(&self, token: &str) -> Option<Option<Value>> {
        match token {
            ":success" => Some(Some(Value::Bool(self.success))),
            ":data" => Some(Some(self.data.clone())),
            ":message" => Some(Some(Value::String(self.message.clone()))),
            ":code" => Some(Some(json!(self.code))),
            META_PLACEHOLDER => Some(self.meta.clone()),
            _ => None,
        }
    }
}

impl From<&NormalizedError> for RenderVars {
    fn from(error: &NormalizedError) -> Self {
        let vars = RenderVars::new(error.message.clone(), error.code.clone());
        match &error.debug {
            Some(debug) => vars.with_meta(json!(debug)),
            None => vars,
        }
    }
}

pub struct ResponseRenderer<'a> {
    settings: &'a ResponseSettings,
}

impl<'a> ResponseRenderer<'a> {
    pub fn new(settings: &'a ResponseSettings) -> Self {
        Self { settings }
    }

    /// Renders with the active template from the settings.
    pub fn render_active(&self, vars: &RenderVars, show_meta: bool) -> Value {
        self.render(&self.settings.template, vars, show_meta)
    }

    /// Renders `vars` through the template called `name`.
    ///
    /// An unknown template, or one that is not a JSON object, renders the
    /// minimal `{success, data, error: {message, code}[, meta]}` shape.
    pub fn render(&self, name: &str, vars: &RenderVars, show_meta: bool) -> Value {
        let tree = match self.settings.template(name) {
            Some(Value::Object(tree)) => tree,
            Some(_) => {
                warn!(template = name, "response template is not an object, using minimal shape");
                return minimal(vars, show_meta);
            }
            None => {
                warn!(template = name, "response template not found, using minimal shape");
                return minimal(vars, show_meta);
            }
        };

        let tree = if show_meta {
            tree
        } else {
            prune_meta_object(tree)
        };

        let mut rendered = Map::new();
        for (key, value) in tree {
            if let Some(value) = substitute(value, vars) {
                rendered.insert(key, value);
            }
        }
        Value::Object(rendered)
    }
}

/// The shape used when no usable template exists.
pub fn minimal(vars: &RenderVars, show_meta: bool) -> Value {
    let mut body = json!({
        "success": vars.success,
        "data": vars.data,
        "error": {
            "message": vars.message,
            "code": vars.code,
        },
    });
    if show_meta
        && let (Some(meta), Some(object)) = (&vars.meta, body.as_object_mut())
    {
        object.insert("meta".to_string(), meta.clone());
    }
    body
}

/// Replaces placeholders. A container that only became empty because its
/// placeholders had no value is dropped as well.
fn substitute(value: Value, vars: &RenderVars) -> Option<Value> {
    match value {
        Value::String(token) => match vars.placeholder(&token) {
            Some(resolved) => resolved,
            None => Some(Value::String(token)),
        },
        Value::Object(map) if !map.is_empty() => {
            let rendered: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| substitute(v, vars).map(|v| (k, v)))
                .collect();
            (!rendered.is_empty()).then_some(Value::Object(rendered))
        }
        Value::Array(items) if !items.is_empty() => {
            let rendered: Vec<Value> = items.into_iter().filter_map(|v| substitute(v, vars)).collect();
            (!rendered.is_empty()).then_some(Value::Array(rendered))
        }
        other => Some(other),
    }
}

/// Removes `:meta` leaves, and containers that only became empty because of it.
fn prune_meta(value: Value) -> Option<Value> {
    match value {
        Value::String(token) if token == META_PLACEHOLDER => None,
        Value::Object(map) if !map.is_empty() => {
            let pruned = prune_meta_object(map);
            (!pruned.is_empty()).then_some(Value::Object(pruned))
        }
        Value::Array(items) if !items.is_empty() => {
            let pruned: Vec<Value> = items.into_iter().filter_map(prune_meta).collect();
            (!pruned.is_empty()).then_some(Value::Array(pruned))
        }
        other => Some(other),
    }
}

fn prune_meta_object(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .filter_map(|(k, v)| prune_meta(v).map(|v| (k, v)))
        .collect()
}
