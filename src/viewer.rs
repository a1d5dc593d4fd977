// viewer.rs - The camera stream view component
use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Blob, Document, HtmlButtonElement, HtmlElement, HtmlImageElement};

use crate::frame::FrameSlot;
use crate::network::ControlClient;
use crate::socket::{FrameSocket, ReconnectPolicy};
use crate::types::{frame_visible, ConnectionState, ControlAction};

/// View-owned state. Everything the DOM shows is derived from this.
struct ViewerState {
    streaming: bool,
    busy: bool,
    error: Option<String>,
    connection: ConnectionState,
    frame: FrameSlot,
}

impl ViewerState {
    fn new() -> Self {
        Self {
            streaming: false,
            busy: false,
            error: None,
            connection: ConnectionState::Uninstantiated,
            frame: FrameSlot::new(),
        }
    }
}

/// Applies the outcome of a control request. On success the flag flips and
/// any earlier banner clears; on failure the flag is untouched and the
/// banner names the action that failed.
fn settle_toggle(state: &mut ViewerState, action: ControlAction, ok: bool) {
    state.busy = false;
    if ok {
        state.streaming = action == ControlAction::Start;
        state.error = None;
    } else {
        state.error = Some(action.failure_message().to_string());
    }
}

/// Handles to the elements the viewer owns.
#[derive(Clone)]
struct Dom {
    root: HtmlElement,
    status: HtmlElement,
    button: HtmlButtonElement,
    banner: HtmlElement,
    placeholder: HtmlElement,
    image: HtmlImageElement,
}

impl Dom {
    fn build(document: &Document) -> Result<Self, JsValue> {
        let root = create(document, "section", "camera-stream")?;

        let title = create(document, "h2", "camera-stream-title")?;
        title.set_text_content(Some("Camera Stream"));

        let status = create(document, "p", "camera-stream-status")?;

        let button: HtmlButtonElement = document.create_element("button")?.dyn_into()?;

        let banner = create(document, "div", "camera-stream-error")?;
        banner.set_hidden(true);

        let stage = create(document, "div", "camera-stream-stage")?;
        let placeholder = create(document, "p", "camera-stream-placeholder")?;
        placeholder.set_text_content(Some("Press start to start streaming."));
        let image: HtmlImageElement = document.create_element("img")?.dyn_into()?;
        image.set_alt("JPEG Stream");
        image.set_class_name("camera-stream-image");
        image.set_hidden(true);
        stage.append_child(&placeholder)?;
        stage.append_child(&image)?;

        root.append_child(&title)?;
        root.append_child(&status)?;
        root.append_child(&button)?;
        root.append_child(&banner)?;
        root.append_child(&stage)?;

        Ok(Self {
            root,
            status,
            button,
            banner,
            placeholder,
            image,
        })
    }

    fn apply(&self, state: &ViewerState) {
        self.status
            .set_text_content(Some(&format!("Stream status: {}", state.connection.label())));

        self.button
            .set_text_content(Some(if state.streaming { "Stop" } else { "Start" }));
        self.button.set_class_name(if state.streaming {
            "camera-stream-toggle stop"
        } else {
            "camera-stream-toggle start"
        });
        // In-flight guard: one control request at a time.
        self.button.set_disabled(state.busy);

        match &state.error {
            Some(message) => {
                self.banner.set_text_content(Some(message));
                self.banner.set_hidden(false);
            }
            None => {
                self.banner.set_text_content(None);
                self.banner.set_hidden(true);
            }
        }

        let visible = frame_visible(state.streaming, state.connection);
        self.placeholder.set_hidden(visible);
        self.image.set_hidden(!visible);
        if let Some(url) = state.frame.current() {
            self.image.set_src(url);
        }
    }
}

fn create(document: &Document, tag: &str, class: &str) -> Result<HtmlElement, JsValue> {
    let element: HtmlElement = document.create_element(tag)?.dyn_into()?;
    element.set_class_name(class);
    Ok(element)
}

/// Renders a live camera stream from the backend.
///
/// Mounts a status line, a start/stop toggle and an image stage into the
/// container, opens the frame socket and keeps the DOM in sync with the
/// view state until `destroy` is called.
#[wasm_bindgen]
pub struct StreamViewer {
    state: Rc<RefCell<ViewerState>>,
    dom: Dom,
    socket: FrameSocket,
    _on_click: Closure<dyn FnMut()>,
}

#[wasm_bindgen]
impl StreamViewer {
    /// Mounts the viewer into the element with the given id, talking to the
    /// backend behind the default `/py` proxy prefix.
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str) -> Result<StreamViewer, JsValue> {
        Self::with_base_url(container_id, "/py")
    }

    pub fn with_base_url(container_id: &str, prefix: &str) -> Result<StreamViewer, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let container = document.get_element_by_id(container_id).ok_or_else(|| {
            JsValue::from_str(&format!("no element with id {container_id}"))
        })?;

        let dom = Dom::build(&document)?;
        container.append_child(&dom.root)?;

        let origin = window.location().origin()?;
        let state = Rc::new(RefCell::new(ViewerState::new()));
        let client = ControlClient::new(&control_base(&origin, prefix));

        let on_frame = {
            let state = Rc::clone(&state);
            let dom = dom.clone();
            Rc::new(move |blob: Blob| {
                let mut guard = state.borrow_mut();
                if let Err(err) = guard.frame.replace(&blob) {
                    log::error!("could not create frame object URL: {:?}", err);
                    return;
                }
                dom.apply(&guard);
            }) as Rc<dyn Fn(Blob)>
        };
        let on_state = {
            let state = Rc::clone(&state);
            let dom = dom.clone();
            Rc::new(move |connection: ConnectionState| {
                let mut guard = state.borrow_mut();
                guard.connection = connection;
                dom.apply(&guard);
            }) as Rc<dyn Fn(ConnectionState)>
        };
        let socket = FrameSocket::connect(
            &socket_url(prefix)?,
            ReconnectPolicy::always(),
            on_frame,
            on_state,
        )?;

        let on_click = {
            let state = Rc::clone(&state);
            let dom = dom.clone();
            Closure::wrap(Box::new(move || {
                toggle(&state, &dom, &client);
            }) as Box<dyn FnMut()>)
        };
        dom.button.set_onclick(Some(on_click.as_ref().unchecked_ref()));
        {
            let mut guard = state.borrow_mut();
            guard.connection = socket.state();
            dom.apply(&guard);
        }

        Ok(StreamViewer {
            state,
            dom,
            socket,
            _on_click: on_click,
        })
    }

    /// Tears the viewer down: closes the socket without reconnecting,
    /// revokes the live frame URL and removes the component's subtree.
    pub fn destroy(self) {
        self.socket.close();
        self.dom.button.set_onclick(None);
        self.state.borrow_mut().frame.release();
        if let Some(parent) = self.dom.root.parent_node() {
            if let Err(err) = parent.remove_child(&self.dom.root) {
                log::debug!("could not remove viewer subtree: {:?}", err);
            }
        }
    }
}

/// Claims the toggle for a new control request, or `None` if one is already
/// in flight.
fn begin_toggle(state: &mut ViewerState) -> Option<ControlAction> {
    if state.busy {
        return None;
    }
    state.busy = true;
    Some(ControlAction::for_streaming(state.streaming))
}

fn toggle(state: &Rc<RefCell<ViewerState>>, dom: &Dom, client: &ControlClient) {
    let action = {
        let mut guard = state.borrow_mut();
        let Some(action) = begin_toggle(&mut guard) else {
            return;
        };
        dom.apply(&guard);
        action
    };

    let state = Rc::clone(state);
    let dom = dom.clone();
    let client = client.clone();
    spawn_local(async move {
        let ok = client.send(action).await.is_ok();
        let mut guard = state.borrow_mut();
        settle_toggle(&mut guard, action, ok);
        dom.apply(&guard);
    });
}

/// Absolute base URL for control requests. Browsers resolve relative fetch
/// paths against the page, but `reqwest` only accepts absolute URLs.
fn control_base(origin: &str, prefix: &str) -> String {
    format!(
        "{}{}",
        origin.trim_end_matches('/'),
        prefix.trim_end_matches('/')
    )
}

/// Websocket URL for the frame stream, derived from the page origin so the
/// dev-server proxy picks it up.
fn socket_url(prefix: &str) -> Result<String, JsValue> {
    let location = web_sys::window()
        .ok_or_else(|| JsValue::from_str("no window"))?
        .location();
    let protocol = location.protocol()?;
    let host = location.host()?;
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    let prefix = prefix.trim_end_matches('/');
    Ok(format!("{scheme}://{host}{prefix}/ws"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_start_flips_the_flag_and_shows_no_error() {
        let mut state = ViewerState::new();
        settle_toggle(&mut state, ControlAction::Start, true);
        assert!(state.streaming);
        assert_eq!(state.error, None);
        assert!(!state.busy);
    }

    #[test]
    fn failed_start_leaves_the_flag_and_sets_the_banner() {
        let mut state = ViewerState::new();
        settle_toggle(&mut state, ControlAction::Start, false);
        assert!(!state.streaming);
        assert_eq!(state.error.as_deref(), Some("Failed to start camera stream"));
    }

    #[test]
    fn failed_stop_keeps_streaming_and_sets_the_banner() {
        let mut state = ViewerState::new();
        state.streaming = true;
        settle_toggle(&mut state, ControlAction::Stop, false);
        assert!(state.streaming);
        assert_eq!(state.error.as_deref(), Some("Failed to stop camera stream"));
    }

    #[test]
    fn control_base_joins_origin_and_prefix_into_an_absolute_url() {
        let base = control_base("http://localhost:8080", "/py/");
        assert_eq!(base, "http://localhost:8080/py");
        assert!(reqwest::Url::parse(&format!("{base}/start")).is_ok());
    }

    #[test]
    fn a_second_toggle_while_one_is_in_flight_is_a_no_op() {
        let mut state = ViewerState::new();

        assert_eq!(begin_toggle(&mut state), Some(ControlAction::Start));
        assert!(state.busy);
        assert_eq!(begin_toggle(&mut state), None);

        settle_toggle(&mut state, ControlAction::Start, true);
        assert_eq!(begin_toggle(&mut state), Some(ControlAction::Stop));
    }

    #[test]
    fn successful_stop_clears_an_earlier_banner() {
        let mut state = ViewerState::new();
        state.streaming = true;
        state.error = Some("Failed to stop camera stream".to_string());
        settle_toggle(&mut state, ControlAction::Stop, true);
        assert!(!state.streaming);
        assert_eq!(state.error, None);
    }
}
