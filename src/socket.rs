// socket.rs - Websocket transport for inbound frames
use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{BinaryType, Blob, CloseEvent, Event, MessageEvent, WebSocket};

use crate::types::ConnectionState;

/// Decides whether (and after how long) the transport retries a dropped
/// connection. The default reconnects forever with no delay.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ReconnectPolicy {
    max_attempts: Option<u32>,
    delay_ms: u32,
}

impl ReconnectPolicy {
    /// Unconditional reconnect-always, immediately.
    pub fn always() -> Self {
        Self {
            max_attempts: None,
            delay_ms: 0,
        }
    }

    /// Retry up to `max_attempts` times, waiting `delay_ms` between attempts.
    pub fn capped(max_attempts: u32, delay_ms: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            delay_ms,
        }
    }

    /// Delay before the given attempt (1-based), or `None` to give up.
    pub fn next_delay(&self, attempt: u32) -> Option<u32> {
        match self.max_attempts {
            Some(max) if attempt > max => None,
            _ => Some(self.delay_ms),
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::always()
    }
}

/// Called with each inbound binary frame.
pub type FrameHandler = Rc<dyn Fn(Blob)>;
/// Called on every connection lifecycle change.
pub type StateHandler = Rc<dyn Fn(ConnectionState)>;

/// Receive-only websocket to the backend's frame stream.
///
/// The socket never sends anything; it surfaces binary frames and lifecycle
/// changes through the handlers and reconnects per its policy on any close
/// that the viewer did not ask for.
pub struct FrameSocket {
    inner: Rc<RefCell<Inner>>,
}

struct Inner {
    url: String,
    policy: ReconnectPolicy,
    attempts: u32,
    closed_by_user: bool,
    ws: Option<WebSocket>,
    on_frame: FrameHandler,
    on_state: StateHandler,
    open_cb: Option<Closure<dyn FnMut()>>,
    message_cb: Option<Closure<dyn FnMut(MessageEvent)>>,
    error_cb: Option<Closure<dyn FnMut(Event)>>,
    close_cb: Option<Closure<dyn FnMut(CloseEvent)>>,
    reconnect_cb: Option<Closure<dyn FnMut()>>,
}

impl FrameSocket {
    pub fn connect(
        url: &str,
        policy: ReconnectPolicy,
        on_frame: FrameHandler,
        on_state: StateHandler,
    ) -> Result<Self, JsValue> {
        let inner = Rc::new(RefCell::new(Inner {
            url: url.to_string(),
            policy,
            attempts: 0,
            closed_by_user: false,
            ws: None,
            on_frame,
            on_state,
            open_cb: None,
            message_cb: None,
            error_cb: None,
            close_cb: None,
            reconnect_cb: None,
        }));
        open_socket(&inner)?;
        Ok(Self { inner })
    }

    pub fn state(&self) -> ConnectionState {
        match &self.inner.borrow().ws {
            Some(ws) => ConnectionState::from_ready_state(ws.ready_state()),
            None => ConnectionState::Uninstantiated,
        }
    }

    /// Closes the socket for good; no reconnect is attempted afterwards.
    pub fn close(&self) {
        let ws = {
            let mut guard = self.inner.borrow_mut();
            guard.closed_by_user = true;
            guard.ws.take()
        };
        if let Some(ws) = ws {
            if let Err(err) = ws.close() {
                log::debug!("error closing frame socket: {:?}", err);
            }
        }
    }
}

fn open_socket(inner: &Rc<RefCell<Inner>>) -> Result<(), JsValue> {
    let ws = WebSocket::new(&inner.borrow().url)?;
    ws.set_binary_type(BinaryType::Blob);

    let open_cb = {
        let inner = Rc::clone(inner);
        Closure::wrap(Box::new(move || {
            let on_state = {
                let mut guard = inner.borrow_mut();
                guard.attempts = 0;
                Rc::clone(&guard.on_state)
            };
            log::info!("frame socket open");
            on_state(ConnectionState::Open);
        }) as Box<dyn FnMut()>)
    };
    ws.set_onopen(Some(open_cb.as_ref().unchecked_ref()));

    let message_cb = {
        let inner = Rc::clone(inner);
        Closure::wrap(Box::new(move |event: MessageEvent| {
            match event.data().dyn_into::<Blob>() {
                Ok(blob) => {
                    let on_frame = Rc::clone(&inner.borrow().on_frame);
                    on_frame(blob);
                }
                Err(data) => log::debug!("ignoring non-binary message: {:?}", data),
            }
        }) as Box<dyn FnMut(MessageEvent)>)
    };
    ws.set_onmessage(Some(message_cb.as_ref().unchecked_ref()));

    let error_cb = Closure::wrap(Box::new(move |_event: Event| {
        // The browser fires a close event right after; reconnect happens there.
        log::debug!("frame socket error");
    }) as Box<dyn FnMut(Event)>);
    ws.set_onerror(Some(error_cb.as_ref().unchecked_ref()));

    let close_cb = {
        let inner = Rc::clone(inner);
        Closure::wrap(Box::new(move |event: CloseEvent| {
            let (on_state, reconnect) = {
                let guard = inner.borrow();
                (Rc::clone(&guard.on_state), !guard.closed_by_user)
            };
            log::info!("frame socket closed (code {})", event.code());
            on_state(ConnectionState::Closed);
            if reconnect {
                schedule_reconnect(&inner);
            }
        }) as Box<dyn FnMut(CloseEvent)>)
    };
    ws.set_onclose(Some(close_cb.as_ref().unchecked_ref()));

    let on_state = {
        let mut guard = inner.borrow_mut();
        guard.ws = Some(ws);
        guard.open_cb = Some(open_cb);
        guard.message_cb = Some(message_cb);
        guard.error_cb = Some(error_cb);
        guard.close_cb = Some(close_cb);
        Rc::clone(&guard.on_state)
    };
    on_state(ConnectionState::Connecting);
    Ok(())
}

fn schedule_reconnect(inner: &Rc<RefCell<Inner>>) {
    let delay_ms = {
        let mut guard = inner.borrow_mut();
        guard.attempts += 1;
        match guard.policy.next_delay(guard.attempts) {
            Some(delay) => delay,
            None => {
                log::warn!("not reconnecting after {} attempts", guard.attempts);
                return;
            }
        }
    };

    let timer_cb = {
        let inner = Rc::clone(inner);
        Closure::wrap(Box::new(move || {
            log::info!("reconnect attempt {}", inner.borrow().attempts);
            if let Err(err) = open_socket(&inner) {
                log::error!("reconnect failed: {:?}", err);
                schedule_reconnect(&inner);
            }
        }) as Box<dyn FnMut()>)
    };

    let Some(window) = web_sys::window() else {
        log::error!("no window to schedule a reconnect on");
        return;
    };
    if let Err(err) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        timer_cb.as_ref().unchecked_ref(),
        delay_ms as i32,
    ) {
        log::error!("failed to schedule reconnect: {:?}", err);
        return;
    }
    inner.borrow_mut().reconnect_cb = Some(timer_cb);
}
