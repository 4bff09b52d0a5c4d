//! Session states and their host-visible projection.

/// Internal session state. Transitions happen only on the engine queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Idle,
    Initted,
    LoadingProtocol,
    LoadingProtocolFailed,
    WsConnecting,
    WsConnectingWithWake,
    WsConnected,
    WsConnectedWithWake,
    Standby,
    Listening,
    Speaking,
}

/// Coarsened state shown to observers.
///
/// The four WebSocket sub-states all project onto `Connecting`: from the
/// host's point of view the session is "connecting" until the protocol
/// handshake completes and listening begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    Initted,
    Loading,
    LoadingFailed,
    Standby,
    Connecting,
    Listening,
    Speaking,
}

impl State {
    pub(crate) fn chat_state(self) -> ChatState {
        match self {
            State::Idle => ChatState::Idle,
            State::Initted => ChatState::Initted,
            State::LoadingProtocol => ChatState::Loading,
            State::LoadingProtocolFailed => ChatState::LoadingFailed,
            State::WsConnecting
            | State::WsConnectingWithWake
            | State::WsConnected
            | State::WsConnectedWithWake => ChatState::Connecting,
            State::Standby => ChatState::Standby,
            State::Listening => ChatState::Listening,
            State::Speaking => ChatState::Speaking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn websocket_substates_project_to_connecting() {
        for state in [
            State::WsConnecting,
            State::WsConnectingWithWake,
            State::WsConnected,
            State::WsConnectedWithWake,
        ] {
            assert_eq!(state.chat_state(), ChatState::Connecting);
        }
    }

    #[test]
    fn remaining_states_project_one_to_one() {
        assert_eq!(State::Idle.chat_state(), ChatState::Idle);
        assert_eq!(State::Initted.chat_state(), ChatState::Initted);
        assert_eq!(State::LoadingProtocol.chat_state(), ChatState::Loading);
        assert_eq!(
            State::LoadingProtocolFailed.chat_state(),
            ChatState::LoadingFailed
        );
        assert_eq!(State::Standby.chat_state(), ChatState::Standby);
        assert_eq!(State::Listening.chat_state(), ChatState::Listening);
        assert_eq!(State::Speaking.chat_state(), ChatState::Speaking);
    }
}
