#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid data url: {0}")]
    InvalidDataUrl(String),
    #[error("image decode error: {0}")]
    ImageDecode(#[from] base64::DecodeError),
    #[error("image fetch error: {0}")]
    ImageFetch(String),
}
