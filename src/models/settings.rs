//! Application settings stored as JSON values

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use validator::Validate;

pub const ID_CARD_LAYOUT: &str = "id_card_layout";

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct Setting {
    #[validate(length(min = 1, max = 64, message = "Setting key must be 1-64 characters"))]
    pub key: String,
    #[schema(value_type = Object)]
    pub value: Value,
}

/// Built-in value returned for a key that was never saved
pub fn default_value(key: &str) -> Option<Value> {
    match key {
        ID_CARD_LAYOUT => Some(json!({
            "photoPosition": "left",
            "fields": [
                { "key": "name", "label": "Name", "visible": true },
                { "key": "class", "label": "Klasse", "visible": true },
                { "key": "id", "label": "Schüler-ID", "visible": true },
            ]
        })),
        _ => None,
    }
}
