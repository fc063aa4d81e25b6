use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvacError {
    #[error("Invalid coordinate: lng={lng}, lat={lat} (expected lng in [-180, 180], lat in [-90, 90])")]
    InvalidCoordinate { lng: f64, lat: f64 },

    #[error("Unknown hazard category: {0}")]
    UnknownCategory(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to decode evacuation tile: {0}")]
    TileDecode(String),

    #[error("Tile fetch failed: {0}")]
    Fetch(String),
}

pub type Result<T> = std::result::Result<T, EvacError>;

impl From<serde_json::Error> for EvacError {
    fn from(e: serde_json::Error) -> Self {
        EvacError::InvalidInput(e.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for EvacError {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        EvacError::InvalidInput(e.to_string())
    }
}

impl From<EvacError> for JsValue {
    fn from(e: EvacError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
