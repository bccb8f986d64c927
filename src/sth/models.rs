use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, AppResult};

/// Response from `/STH/v1/contextEntities/type/{type}/id/{id}/attributes/{attr}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SthResponse {
    pub context_responses: Vec<ContextResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResponse {
    pub context_element: ContextElement,
    #[serde(default)]
    pub status_code: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextElement {
    pub attributes: Vec<AttributeHistory>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub entity_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeHistory {
    #[serde(default)]
    pub name: Option<String>,
    pub values: Vec<SensorSample>,
}

impl SthResponse {
    /// Values of the first attribute of the first context response.
    ///
    /// `None` when either array is empty.
    #[must_use]
    pub fn into_values(self) -> Option<Vec<SensorSample>> {
        self.context_responses
            .into_iter()
            .next()?
            .context_element
            .attributes
            .into_iter()
            .next()
            .map(|attribute| attribute.values)
    }
}

/// One historic sample as stored by STH.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    #[serde(rename = "recvTime")]
    pub recv_time: String,
    /// Numeric reading; IoT agents store it as a string, some as a JSON number.
    #[serde(rename = "attrValue", deserialize_with = "string_or_number")]
    pub attr_value: String,
}

impl SensorSample {
    /// Parse `attrValue` as a float.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidValue` if the value is not numeric.
    pub fn value(&self) -> AppResult<f64> {
        self.attr_value.trim().parse().map_err(|_| {
            AppError::InvalidValue(format!(
                "'{}' received at {}",
                self.attr_value, self.recv_time
            ))
        })
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawValue {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawValue::deserialize(deserializer)? {
        RawValue::Text(text) => text,
        RawValue::Number(number) => number.to_string(),
    })
}
