//! Wire payloads of the projector actions
//!
//! Raw JSON bodies are checked here and turned into typed requests before the
//! engine sees them. Every message is returned to the client verbatim.

use crate::error::{ApiError, ApiResult};
use lectern_types::{Element, ElementError, ElementKey, RecordId, Resolution};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Body of `project`
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRequest {
    /// Projectors to clear, deduplicated
    pub clear_ids: BTreeSet<RecordId>,
    pub prune: Option<PruneTarget>,
}

/// The element to show on one projector after clearing
#[derive(Debug, Clone, PartialEq)]
pub struct PruneTarget {
    pub projector_id: RecordId,
    pub element: Element,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    Scale,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewDirection {
    Up,
    Down,
    Reset,
}

/// Body of `control_view`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewControl {
    pub action: ViewAction,
    pub direction: ViewDirection,
}

impl ViewControl {
    /// New value of the controlled field given its stored value
    pub fn apply(&self, current: i32) -> i32 {
        match self.direction {
            ViewDirection::Up => current.saturating_add(1),
            ViewDirection::Down => current.saturating_sub(1),
            ViewDirection::Reset => 0,
        }
    }

    pub fn describe(&self) -> String {
        let action = match self.action {
            ViewAction::Scale => "Scale",
            ViewAction::Scroll => "Scroll",
        };
        let direction = match self.direction {
            ViewDirection::Up => "up",
            ViewDirection::Down => "down",
            ViewDirection::Reset => "reset",
        };
        format!("{} {}", action, direction)
    }
}

fn element_error(err: ElementError) -> ApiError {
    ApiError::invalid(err.to_string())
}

// Strings are shown without quotes
fn raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `[Element]` for activate and prune
pub fn elements(body: Value) -> ApiResult<Vec<Element>> {
    let Value::Array(items) = body else {
        return Err(ApiError::invalid("Data must be a list."));
    };
    items
        .into_iter()
        .map(|item| Element::from_value(item).map_err(element_error))
        .collect()
}

/// `{key: partial}` for update
pub fn element_updates(body: Value) -> ApiResult<Vec<(ElementKey, Map<String, Value>)>> {
    let Value::Object(updates) = body else {
        return Err(ApiError::invalid("Data must be a dictionary."));
    };
    let malformed =
        || ApiError::invalid("Data must be a dictionary with UUIDs as keys and dictionaries as values.");
    updates
        .into_iter()
        .map(|(key, value)| {
            let key = ElementKey::parse(&key).map_err(|_| malformed())?;
            match value {
                Value::Object(partial) => Ok((key, partial)),
                _ => Err(malformed()),
            }
        })
        .collect()
}

/// `[key]` for deactivate
pub fn element_keys(body: Value) -> ApiResult<Vec<ElementKey>> {
    let malformed = || ApiError::invalid("Data must be a list of hex UUIDs.");
    let Value::Array(items) = body else {
        return Err(malformed());
    };
    items
        .into_iter()
        .map(|item| {
            item.as_str()
                .and_then(|raw| ElementKey::parse(raw).ok())
                .ok_or_else(malformed)
        })
        .collect()
}

/// `{clear_ids, prune?}`
///
/// Checks run in a fixed order and the first failure wins. The existence of
/// the prune target is checked by the engine afterwards.
pub fn project_request(body: Value) -> ApiResult<ProjectRequest> {
    let Value::Object(mut body) = body else {
        return Err(ApiError::invalid("The data has to be a dict."));
    };

    let clear_ids = match body.remove("clear_ids") {
        None => Vec::new(),
        Some(Value::Array(ids)) => ids,
        Some(_) => return Err(ApiError::invalid("clear_ids has to be a list.")),
    };
    let clear_ids = clear_ids
        .iter()
        .map(|id| {
            id.as_i64()
                .ok_or_else(|| ApiError::invalid(format!("The id \"{}\" has to be int.", raw(id))))
        })
        .collect::<ApiResult<BTreeSet<_>>>()?;

    let prune = match body.remove("prune") {
        None | Some(Value::Null) => None,
        Some(Value::Object(mut prune)) => {
            let projector_id = prune
                .get("id")
                .and_then(Value::as_i64)
                .ok_or_else(|| ApiError::invalid("The prune projector id has to be int."))?;
            let element = match prune.remove("element") {
                None => Map::new(),
                Some(Value::Object(fields)) => fields,
                Some(_) => {
                    return Err(ApiError::invalid(
                        "Prune element has to be a dict or not given.",
                    ))
                }
            };
            let element = Element::from_fields(element).map_err(element_error)?;
            Some(PruneTarget {
                projector_id,
                element,
            })
        }
        Some(_) => return Err(ApiError::invalid("Prune has to be an object.")),
    };

    Ok(ProjectRequest { clear_ids, prune })
}

/// `{width, height}`
pub fn resolution(body: Value) -> ApiResult<Resolution> {
    let Value::Object(body) = body else {
        return Err(ApiError::invalid("Data must be a dictionary."));
    };
    let (width, height) = match (body.get("width"), body.get("height")) {
        (Some(width), Some(height)) if !width.is_null() && !height.is_null() => (width, height),
        _ => return Err(ApiError::invalid("A width and a height have to be given.")),
    };
    let (Some(width), Some(height)) = (width.as_i64(), height.as_i64()) else {
        return Err(ApiError::invalid("Data has to be integers."));
    };
    let out_of_range = |err: lectern_types::ResolutionError| ApiError::invalid(err.to_string());
    let width = i32::try_from(width).unwrap_or(i32::MAX);
    let height = i32::try_from(height).unwrap_or(i32::MAX);
    Resolution::new(width, height).map_err(out_of_range)
}

/// `{action, direction}`
pub fn view_control(body: Value) -> ApiResult<ViewControl> {
    let Value::Object(body) = body else {
        return Err(ApiError::invalid("Data must be a dictionary."));
    };
    let action = match body.get("action").and_then(Value::as_str) {
        Some("scale") => Some(ViewAction::Scale),
        Some("scroll") => Some(ViewAction::Scroll),
        _ => None,
    };
    let direction = match body.get("direction").and_then(Value::as_str) {
        Some("up") => Some(ViewDirection::Up),
        Some("down") => Some(ViewDirection::Down),
        Some("reset") => Some(ViewDirection::Reset),
        _ => None,
    };
    match (action, direction) {
        (Some(action), Some(direction)) => Ok(ViewControl { action, direction }),
        _ => Err(ApiError::invalid(
            "Data must be a dictionary with an action ('scale' or 'scroll') \
             and a direction ('up', 'down' or 'reset').",
        )),
    }
}

/// Bare integer for `set_scroll`
pub fn scroll(body: Value) -> ApiResult<i32> {
    body.as_i64()
        .and_then(|scroll| i32::try_from(scroll).ok())
        .ok_or_else(|| ApiError::invalid("Data must be an int."))
}

/// Bare boolean for `control_blank`
pub fn blank(body: Value) -> ApiResult<bool> {
    body.as_bool()
        .ok_or_else(|| ApiError::invalid("Data must be a bool."))
}

/// Bare integer for `set_projectiondefault`
pub fn projection_default_id(body: Value) -> ApiResult<RecordId> {
    body.as_i64()
        .ok_or_else(|| ApiError::invalid("Data must be an int."))
}
