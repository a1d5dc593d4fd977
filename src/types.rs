// types.rs - Shared type definitions

/// Lifecycle state of the websocket connection to the backend.
///
/// The first four variants mirror the browser's ready-state codes;
/// `Uninstantiated` means no socket has been created yet.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConnectionState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
    Uninstantiated = 4,
}

impl ConnectionState {
    pub fn from_ready_state(code: u16) -> Self {
        match code {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Open,
            2 => ConnectionState::Closing,
            3 => ConnectionState::Closed,
            _ => ConnectionState::Uninstantiated,
        }
    }

    /// Text shown in the status line.
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Open => "OPEN",
            ConnectionState::Closing => "CLOSING",
            ConnectionState::Closed => "CLOSED",
            ConnectionState::Uninstantiated => "UNINSTANTIATED",
        }
    }
}

/// The two control requests the viewer can issue.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ControlAction {
    Start = 0,
    Stop = 1,
}

impl ControlAction {
    /// Picks the action a toggle should issue given the current flag.
    pub fn for_streaming(streaming: bool) -> Self {
        if streaming {
            ControlAction::Stop
        } else {
            ControlAction::Start
        }
    }

    /// Path segment appended to the backend prefix.
    pub fn endpoint(self) -> &'static str {
        match self {
            ControlAction::Start => "start",
            ControlAction::Stop => "stop",
        }
    }

    /// Banner text when the control request fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            ControlAction::Start => "Failed to start camera stream",
            ControlAction::Stop => "Failed to stop camera stream",
        }
    }
}

/// Frames are shown only while streaming over an open socket; in every other
/// combination the placeholder prompt takes the stage.
pub fn frame_visible(streaming: bool, connection: ConnectionState) -> bool {
    streaming && connection == ConnectionState::Open
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_state_codes_map_to_states() {
        assert_eq!(ConnectionState::from_ready_state(0), ConnectionState::Connecting);
        assert_eq!(ConnectionState::from_ready_state(1), ConnectionState::Open);
        assert_eq!(ConnectionState::from_ready_state(2), ConnectionState::Closing);
        assert_eq!(ConnectionState::from_ready_state(3), ConnectionState::Closed);
        assert_eq!(ConnectionState::from_ready_state(7), ConnectionState::Uninstantiated);
    }

    #[test]
    fn labels_are_uppercase_state_names() {
        assert_eq!(ConnectionState::Open.label(), "OPEN");
        assert_eq!(ConnectionState::Closed.label(), "CLOSED");
        assert_eq!(ConnectionState::Uninstantiated.label(), "UNINSTANTIATED");
    }

    #[test]
    fn toggle_picks_the_opposite_action() {
        assert_eq!(ControlAction::for_streaming(false), ControlAction::Start);
        assert_eq!(ControlAction::for_streaming(true), ControlAction::Stop);
    }

    #[test]
    fn failure_messages_name_the_action() {
        assert_eq!(
            ControlAction::Start.failure_message(),
            "Failed to start camera stream"
        );
        assert_eq!(
            ControlAction::Stop.failure_message(),
            "Failed to stop camera stream"
        );
    }

    #[test]
    fn frames_show_only_while_streaming_on_an_open_socket() {
        assert!(frame_visible(true, ConnectionState::Open));
        assert!(!frame_visible(false, ConnectionState::Open));
        assert!(!frame_visible(true, ConnectionState::Closed));
        assert!(!frame_visible(true, ConnectionState::Connecting));
        assert!(!frame_visible(false, ConnectionState::Uninstantiated));
    }
}
