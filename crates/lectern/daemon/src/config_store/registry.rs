//! Typed config variables and their validation

use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Rejection of a config value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Unknown config variable {0}.")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),
}

/// Input type of a config variable, as used by the client forms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    String,
    Text,
    MarkupText,
    Integer,
    Boolean,
    Choice,
    DateTimePicker,
    ColorPicker,
    /// Logo or font resource: `{display_name, path}`
    Static,
}

/// Declaration of one config variable
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigVariable {
    pub name: &'static str,
    pub default_value: Value,
    pub input_type: InputType,
    /// Allowed values for [`InputType::Choice`]
    pub choices: Vec<&'static str>,
    /// Lower bound for [`InputType::Integer`]
    pub min_value: Option<i64>,
}

impl ConfigVariable {
    fn new(name: &'static str, input_type: InputType, default_value: Value) -> Self {
        Self {
            name,
            default_value,
            input_type,
            choices: Vec::new(),
            min_value: None,
        }
    }

    fn with_choices(mut self, choices: &[&'static str]) -> Self {
        self.choices = choices.to_vec();
        self
    }

    fn with_min(mut self, min_value: i64) -> Self {
        self.min_value = Some(min_value);
        self
    }

    /// Check that `value` fits the input type of this variable
    pub fn validate(&self, value: &Value) -> Result<(), ConfigError> {
        let invalid =
            |message: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(message)) };
        match self.input_type {
            InputType::String | InputType::Text | InputType::MarkupText => {
                if !value.is_string() {
                    return invalid("Wrong datatype. Expected string.".to_string());
                }
            }
            InputType::Integer => {
                let Some(number) = value.as_i64() else {
                    return invalid("Wrong datatype. Expected integer.".to_string());
                };
                if let Some(min_value) = self.min_value {
                    if number < min_value {
                        return invalid(format!(
                            "The value has to be greater than or equal to {}.",
                            min_value
                        ));
                    }
                }
            }
            InputType::Boolean => {
                if !value.is_boolean() {
                    return invalid("Wrong datatype. Expected boolean.".to_string());
                }
            }
            InputType::Choice => {
                let in_choices = value
                    .as_str()
                    .is_some_and(|choice| self.choices.contains(&choice));
                if !in_choices {
                    return invalid("Invalid input. Choice does not match.".to_string());
                }
            }
            InputType::DateTimePicker => {
                // Unix timestamp, or null for "no date"
                if !(value.is_null() || value.is_number()) {
                    return invalid("Wrong datatype. Expected timestamp.".to_string());
                }
            }
            InputType::ColorPicker => {
                let is_color = value.as_str().is_some_and(is_hex_color);
                if !is_color {
                    return invalid("Invalid input. Expected a hex color like #317796.".to_string());
                }
            }
            InputType::Static => {
                let has_fields = value.as_object().is_some_and(|object| {
                    ["display_name", "path"]
                        .iter()
                        .all(|field| object.get(*field).is_some_and(Value::is_string))
                });
                if !has_fields {
                    return invalid(
                        "The value has to be a dict with the keys display_name and path."
                            .to_string(),
                    );
                }
            }
        }
        Ok(())
    }
}

fn is_hex_color(raw: &str) -> bool {
    raw.len() == 7
        && raw.starts_with('#')
        && raw[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// All known config variables by name
#[derive(Debug, Clone, Default)]
pub struct ConfigRegistry {
    variables: BTreeMap<&'static str, ConfigVariable>,
}

impl ConfigRegistry {
    pub fn new(variables: impl IntoIterator<Item = ConfigVariable>) -> Self {
        Self {
            variables: variables
                .into_iter()
                .map(|variable| (variable.name, variable))
                .collect(),
        }
    }

    /// Registry with the core variables
    pub fn core() -> Self {
        Self::new(core_variables())
    }

    pub fn get(&self, name: &str) -> Option<&ConfigVariable> {
        self.variables.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigVariable> {
        self.variables.values()
    }

    /// Validate `value` against the variable named `name`
    pub fn validate(&self, name: &str, value: &Value) -> Result<(), ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))?
            .validate(value)
    }
}

fn static_resource(display_name: &str, path: &str) -> Value {
    json!({"display_name": display_name, "path": path})
}

/// Variables of the core app
pub fn core_variables() -> Vec<ConfigVariable> {
    use InputType::{
        Boolean, Choice, ColorPicker, DateTimePicker, Integer, MarkupText, Static, Text,
    };

    vec![
        ConfigVariable::new("general_event_name", InputType::String, json!("Lectern")),
        ConfigVariable::new(
            "general_event_description",
            InputType::String,
            json!("Presentation and assembly system"),
        ),
        ConfigVariable::new("general_event_date", InputType::String, json!("")),
        ConfigVariable::new("general_event_location", InputType::String, json!("")),
        ConfigVariable::new("general_event_legal_notice", MarkupText, json!("")),
        ConfigVariable::new("general_event_privacy_policy", MarkupText, json!("")),
        ConfigVariable::new(
            "general_event_welcome_title",
            InputType::String,
            json!("Welcome to Lectern"),
        ),
        ConfigVariable::new(
            "general_event_welcome_text",
            MarkupText,
            json!("[Space for your welcome text.]"),
        ),
        ConfigVariable::new("general_system_enable_anonymous", Boolean, json!(false)),
        ConfigVariable::new("general_login_info_text", Text, json!("")),
        ConfigVariable::new("general_csv_separator", InputType::String, json!(",")),
        ConfigVariable::new("general_export_pdf_pagenumber_alignment", Choice, json!("center"))
            .with_choices(&["left", "center", "right"]),
        ConfigVariable::new("general_export_pdf_fontsize", Choice, json!("10"))
            .with_choices(&["10", "11", "12"]),
        ConfigVariable::new("general_event_date_of_election", DateTimePicker, Value::Null),
        ConfigVariable::new("projector_enable_logo", Boolean, json!(true)),
        ConfigVariable::new("projector_enable_clock", Boolean, json!(true)),
        ConfigVariable::new("projector_enable_title", Boolean, json!(true)),
        ConfigVariable::new("projector_header_backgroundcolor", ColorPicker, json!("#317796")),
        ConfigVariable::new("projector_header_fontcolor", ColorPicker, json!("#F5F5F5")),
        ConfigVariable::new("projector_h1_color", ColorPicker, json!("#317796")),
        ConfigVariable::new("projector_blank_color", ColorPicker, json!("#FFFFFF")),
        ConfigVariable::new("projector_default_countdown", Integer, json!(60))
            .with_min(0),
        ConfigVariable::new("projector_broadcast", Integer, json!(0))
            .with_min(0),
        ConfigVariable::new("projector_currentListOfSpeakers_reference", Integer, json!(1))
            .with_min(1),
        ConfigVariable::new("logo_projector_main", Static, static_resource("Projector logo", "")),
        ConfigVariable::new(
            "logo_projector_header",
            Static,
            static_resource("Projector header image", ""),
        ),
        ConfigVariable::new(
            "logo_web_header",
            Static,
            static_resource("Web interface header logo", "/static/img/logo.png"),
        ),
        ConfigVariable::new(
            "font_regular",
            Static,
            static_resource("Font regular", "/static/fonts/Roboto-Regular.woff"),
        ),
        ConfigVariable::new(
            "font_italic",
            Static,
            static_resource("Font italic", "/static/fonts/Roboto-Italic.woff"),
        ),
        ConfigVariable::new(
            "font_bold",
            Static,
            static_resource("Font bold", "/static/fonts/Roboto-Medium.woff"),
        ),
        ConfigVariable::new(
            "font_bold_italic",
            Static,
            static_resource("Font bold italic", "/static/fonts/Roboto-MediumItalic.woff"),
        ),
    ]
}
