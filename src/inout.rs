use crate::error::{Error, Result};
use crate::shape::Shape;
use base64::Engine;
use image::io::Reader as ImageReader;
use image::DynamicImage;
use std::io::Read;
use std::path::Path;

/// Reads from standard input instead of a file.
pub const STDIN: &str = "-";

/// Where a sketch comes from, and how it is encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub location: String,
    /// The input holds base64 text (optionally a `data:` URL) rather than raw image bytes
    pub payload: bool,
}

impl Source {
    pub fn image(&self) -> Result<DynamicImage> {
        match (self.location.as_str(), self.payload) {
            (STDIN, payload) => {
                let mut bytes = Vec::new();
                std::io::stdin()
                    .read_to_end(&mut bytes)
                    .map_err(Error::io(STDIN))?;
                if payload {
                    decode_payload(&String::from_utf8_lossy(&bytes))
                } else {
                    decode_bytes(&bytes)
                }
            }
            (location, true) => {
                let text = std::fs::read_to_string(location).map_err(Error::io(location))?;
                decode_payload(&text)
            }
            (location, false) => open(Path::new(location)),
        }
    }
}

fn open(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)
        .map_err(Error::io(path))?
        .with_guessed_format()
        .map_err(Error::io(path))?
        .decode()
        .map_err(|e| Error::BadImage(format!("{}: {}", path.display(), e)))
}

fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| Error::BadImage(e.to_string()))
}

/// Decode the base64 body a canvas posts, e.g. `data:image/png;base64,iVBOR...`.
pub fn decode_payload(text: &str) -> Result<DynamicImage> {
    let text = text.trim();
    let body = match text.strip_prefix("data:") {
        Some(url) => url
            .split_once(',')
            .map(|(_, body)| body)
            .ok_or_else(|| Error::BadImage("data URL has no body".to_string()))?,
        None => text,
    };
    let body: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(body)
        .map_err(|e| Error::BadImage(format!("invalid base64: {}", e)))?;
    decode_bytes(&bytes)
}

/// `{}` when nothing was recognized, otherwise `{"shape": ..., "params": ...}`.
pub fn detection_json(detection: &Option<Shape>) -> Result<serde_json::Value> {
    match detection {
        Some(shape) => Ok(serde_json::to_value(shape)?),
        None => Ok(serde_json::json!({})),
    }
}

pub fn error_json(error: &Error) -> serde_json::Value {
    serde_json::json!({ "error": error.to_string() })
}
