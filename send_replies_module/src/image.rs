use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, warn};

use crate::errors::DeliveryError;
use crate::simulate::InputSimulator;

/// How long to poll for the attachment preview before giving up.
const ATTACHMENT_PREVIEW_TIMEOUT: Duration = Duration::from_secs(4);

/// Poll cadence while waiting for the attachment preview.
const ATTACHMENT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Mime type assumed when the relay hands back bare base64 with no header.
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Cross-origin image relay. The page context cannot fetch arbitrary
/// third-party images itself, so anything that is not already a data URI is
/// resolved through this capability. Returns either a full data URL or bare
/// base64 content.
pub trait ImageFetcher: Send + Sync {
    fn fetch_as_base64(&self, url: &str) -> Result<String, DeliveryError>;
}

/// Image bytes ready to be assigned as a synthetic file selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Resolve an image URL to raw bytes. Data URIs are decoded locally;
/// everything else goes through the relay.
pub fn resolve_image(fetcher: &dyn ImageFetcher, url: &str) -> Result<ResolvedImage, DeliveryError> {
    if url.starts_with("data:") {
        return decode_data_url(url);
    }
    let encoded = fetcher.fetch_as_base64(url)?;
    if encoded.starts_with("data:") {
        decode_data_url(&encoded)
    } else {
        Ok(ResolvedImage {
            bytes: STANDARD.decode(encoded.trim())?,
            mime: DEFAULT_IMAGE_MIME.to_string(),
        })
    }
}

fn decode_data_url(url: &str) -> Result<ResolvedImage, DeliveryError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| DeliveryError::InvalidDataUrl(url.to_string()))?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| DeliveryError::InvalidDataUrl(url.to_string()))?;
    let mime = header.split(';').next().unwrap_or("").trim();
    let mime = if mime.is_empty() {
        DEFAULT_IMAGE_MIME.to_string()
    } else {
        mime.to_string()
    };
    Ok(ResolvedImage {
        bytes: STANDARD.decode(data)?,
        mime,
    })
}

/// Attach the image behind `url` to the open conversation and submit it.
///
/// Returns `Ok(true)` on submit, `Ok(false)` when the host UI never exposed
/// the attachment input or preview (or a cancellation was observed), and
/// `Err` when the image itself could not be resolved.
pub async fn deliver_image(
    sim: &dyn InputSimulator,
    fetcher: &dyn ImageFetcher,
    url: &str,
    cancelled: &AtomicBool,
) -> Result<bool, DeliveryError> {
    if cancelled.load(Ordering::Relaxed) {
        return Ok(false);
    }

    let image = resolve_image(fetcher, url)?;
    debug!("resolved image {} ({} bytes)", url, image.bytes.len());

    if cancelled.load(Ordering::Relaxed) {
        return Ok(false);
    }
    if !sim.reveal_attachment_input() {
        warn!("attachment input not found; dropping image reply");
        return Ok(false);
    }
    if !sim.attach_file(&image.bytes, &image.mime) {
        warn!("attachment assignment rejected; dropping image reply");
        return Ok(false);
    }

    if !wait_for_preview(sim, cancelled).await {
        warn!("attachment preview never appeared for {}", url);
        return Ok(false);
    }
    if cancelled.load(Ordering::Relaxed) {
        return Ok(false);
    }

    sim.press_enter();
    debug!("image reply submitted: {}", url);
    Ok(true)
}

async fn wait_for_preview(sim: &dyn InputSimulator, cancelled: &AtomicBool) -> bool {
    let mut waited = Duration::ZERO;
    loop {
        if cancelled.load(Ordering::Relaxed) {
            return false;
        }
        if sim.attachment_preview_visible() {
            return true;
        }
        if waited >= ATTACHMENT_PREVIEW_TIMEOUT {
            return false;
        }
        tokio::time::sleep(ATTACHMENT_POLL_INTERVAL).await;
        waited += ATTACHMENT_POLL_INTERVAL;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct StaticFetcher {
        payload: Result<String, String>,
    }

    impl ImageFetcher for StaticFetcher {
        fn fetch_as_base64(&self, _url: &str) -> Result<String, DeliveryError> {
            self.payload
                .clone()
                .map_err(DeliveryError::ImageFetch)
        }
    }

    struct ScriptedComposer {
        events: Mutex<Vec<String>>,
        attachment_available: bool,
        preview_after_polls: Option<usize>,
        polls: AtomicUsize,
    }

    impl ScriptedComposer {
        fn new(attachment_available: bool, preview_after_polls: Option<usize>) -> Self {
            Self {
                events: Mutex::new(Vec::new()),
                attachment_available,
                preview_after_polls,
                polls: AtomicUsize::new(0),
            }
        }

        fn log(&self, event: impl Into<String>) {
            self.events.lock().expect("events lock").push(event.into());
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().expect("events lock").clone()
        }
    }

    impl InputSimulator for ScriptedComposer {
        fn focus_composer(&self) -> bool {
            true
        }

        fn clear_composer(&self) {}

        fn insert_text_line(&self, _line: &str) {}

        fn insert_line_break(&self) {}

        fn dispatch_input_events(&self) {}

        fn press_enter(&self) {
            self.log("enter");
        }

        fn reveal_attachment_input(&self) -> bool {
            self.log("reveal");
            self.attachment_available
        }

        fn attach_file(&self, bytes: &[u8], mime: &str) -> bool {
            self.log(format!("attach:{}:{}", mime, bytes.len()));
            true
        }

        fn attachment_preview_visible(&self) -> bool {
            match self.preview_after_polls {
                Some(threshold) => self.polls.fetch_add(1, Ordering::Relaxed) >= threshold,
                None => false,
            }
        }
    }

    // "aGVsbG8=" is base64 for "hello"
    const DATA_URL: &str = "data:image/png;base64,aGVsbG8=";

    #[test]
    fn data_url_decoded_locally() {
        let fetcher = StaticFetcher {
            payload: Err("relay must not be called".to_string()),
        };
        let image = resolve_image(&fetcher, DATA_URL).expect("resolve");
        assert_eq!(image.bytes, b"hello");
        assert_eq!(image.mime, "image/png");
    }

    #[test]
    fn remote_url_resolved_through_relay() {
        let fetcher = StaticFetcher {
            payload: Ok(DATA_URL.to_string()),
        };
        let image = resolve_image(&fetcher, "https://cdn.example.com/a.png").expect("resolve");
        assert_eq!(image.bytes, b"hello");
        assert_eq!(image.mime, "image/png");
    }

    #[test]
    fn bare_base64_from_relay_gets_default_mime() {
        let fetcher = StaticFetcher {
            payload: Ok("aGVsbG8=".to_string()),
        };
        let image = resolve_image(&fetcher, "https://cdn.example.com/a").expect("resolve");
        assert_eq!(image.bytes, b"hello");
        assert_eq!(image.mime, DEFAULT_IMAGE_MIME);
    }

    #[test]
    fn malformed_data_url_rejected() {
        let fetcher = StaticFetcher {
            payload: Err("unused".to_string()),
        };
        let err = resolve_image(&fetcher, "data:image/png;base64").unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidDataUrl(_)));
    }

    #[tokio::test]
    async fn image_delivery_attaches_and_submits() {
        let sim = ScriptedComposer::new(true, Some(0));
        let fetcher = StaticFetcher {
            payload: Err("relay must not be called".to_string()),
        };
        let cancelled = AtomicBool::new(false);

        let delivered = deliver_image(&sim, &fetcher, DATA_URL, &cancelled)
            .await
            .expect("deliver");
        assert!(delivered);
        assert_eq!(sim.events(), vec!["reveal", "attach:image/png:5", "enter"]);
    }

    #[tokio::test]
    async fn missing_attachment_input_fails_without_submit() {
        let sim = ScriptedComposer::new(false, Some(0));
        let fetcher = StaticFetcher {
            payload: Err("unused".to_string()),
        };
        let cancelled = AtomicBool::new(false);

        let delivered = deliver_image(&sim, &fetcher, DATA_URL, &cancelled)
            .await
            .expect("deliver");
        assert!(!delivered);
        assert_eq!(sim.events(), vec!["reveal"]);
    }

    #[tokio::test]
    async fn preview_timeout_fails_without_submit() {
        let sim = ScriptedComposer::new(true, None);
        let fetcher = StaticFetcher {
            payload: Err("unused".to_string()),
        };
        let cancelled = AtomicBool::new(false);

        let delivered = deliver_image(&sim, &fetcher, DATA_URL, &cancelled)
            .await
            .expect("deliver");
        assert!(!delivered);
        assert!(!sim.events().contains(&"enter".to_string()));
    }

    #[tokio::test]
    async fn fetch_failure_propagates_as_error() {
        let sim = ScriptedComposer::new(true, Some(0));
        let fetcher = StaticFetcher {
            payload: Err("relay offline".to_string()),
        };
        let cancelled = AtomicBool::new(false);

        let err = deliver_image(&sim, &fetcher, "https://cdn.example.com/a.png", &cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::ImageFetch(_)));
        assert!(sim.events().is_empty());
    }
}
