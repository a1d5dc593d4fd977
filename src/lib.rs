//! Browser front-end for a backend camera stream.
//!
//! Connects to the backend over a websocket for binary JPEG frames and
//! issues start/stop control requests over HTTP, both behind the dev-server
//! proxy prefix. The whole visible surface is the [`StreamViewer`]
//! component.

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

mod frame;
mod network;
mod socket;
mod types;
mod viewer;

pub use frame::FrameSlot;
pub use network::{ControlClient, ControlError};
pub use socket::{FrameSocket, ReconnectPolicy};
pub use types::{ConnectionState, ControlAction};
pub use viewer::StreamViewer;

/// Element id the module mounts into when the host page provides it.
pub const MOUNT_ID: &str = "camera-stream-root";

thread_local! {
    static MOUNTED: RefCell<Option<StreamViewer>> = RefCell::new(None);
}

/// Module entry point: installs the panic hook and logger, then mounts the
/// viewer if the page carries the mount element.
#[wasm_bindgen(start)]
pub fn initialize() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());

    let mount_present = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(MOUNT_ID))
        .is_some();
    if mount_present {
        let viewer = StreamViewer::new(MOUNT_ID)?;
        MOUNTED.with(|slot| slot.replace(Some(viewer)));
    }
    Ok(())
}
