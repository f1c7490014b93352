//! Serializable views of engine data for YAML output.

use serde::Serialize;

#[derive(Serialize)]
pub struct CatalogEntryDto {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub third_steps: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fifth_steps: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seventh_steps: Option<u16>,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dissonance: Option<f32>,
}
