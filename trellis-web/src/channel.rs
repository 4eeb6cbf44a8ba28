use trellis_client::{Channel, ChannelError};
use web_sys::WebSocket;

/// [`Channel`] over a browser `WebSocket`. Starts disconnected.
#[derive(Default)]
pub struct WebSocketChannel {
    socket: Option<WebSocket>,
}

impl WebSocketChannel {
    pub fn new(socket: WebSocket) -> Self {
        Self {
            socket: Some(socket),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }
}

impl Channel for WebSocketChannel {
    fn is_open(&self) -> bool {
        self.socket
            .as_ref()
            .is_some_and(|socket| socket.ready_state() == WebSocket::OPEN)
    }

    fn send(&mut self, text: &str) -> Result<(), ChannelError> {
        let socket = self.socket.as_ref().ok_or(ChannelError::Unavailable)?;
        socket
            .send_with_str(text)
            .map_err(|err| ChannelError::Send(format!("{err:?}")))
    }
}
