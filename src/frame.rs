// frame.rs - Scoped display resource for the latest frame
use wasm_bindgen::prelude::*;
use web_sys::{Blob, Url};

/// Owns the object URL backing the currently displayed frame.
///
/// At most one URL is alive at a time: `replace` revokes the previous one
/// before minting the next, and `Drop` revokes whatever is left on teardown.
/// Each URL is revoked exactly once.
#[derive(Default)]
pub struct FrameSlot {
    url: Option<String>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self { url: None }
    }

    /// Swaps in a new frame payload, returning the fresh object URL.
    pub fn replace(&mut self, blob: &Blob) -> Result<&str, JsValue> {
        self.release();
        let url = Url::create_object_url_with_blob(blob)?;
        self.url = Some(url);
        Ok(self.url.as_deref().unwrap_or_default())
    }

    /// Revokes the current object URL, if any.
    pub fn release(&mut self) {
        if let Some(url) = self.url.take() {
            if let Err(err) = Url::revoke_object_url(&url) {
                log::debug!("failed to revoke object URL: {:?}", err);
            }
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl Drop for FrameSlot {
    fn drop(&mut self) {
        self.release();
    }
}
