use crate::dom::Dom;
use crate::error::ChannelError;
use crate::session::ClientSession;
use std::time::Duration;
use tracing::{info, warn};
use trellis_types::{ClientEvent, ClientMessage};

/// Outgoing half of the duplex connection to the server.
pub trait Channel {
    fn is_open(&self) -> bool;

    fn send(&mut self, text: &str) -> Result<(), ChannelError>;
}

/// Fixed delay between a lost connection and the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
        }
    }
}

/// A client session wired to a channel.
pub struct Client<D: Dom, C: Channel> {
    session: ClientSession<D>,
    channel: C,
    policy: ReconnectPolicy,
    connections: u32,
}

impl<D: Dom, C: Channel> Client<D, C> {
    pub fn new(dom: D, channel: C) -> Self {
        Self::with_policy(dom, channel, ReconnectPolicy::default())
    }

    pub fn with_policy(dom: D, channel: C, policy: ReconnectPolicy) -> Self {
        Self {
            session: ClientSession::new(dom),
            channel,
            policy,
            connections: 0,
        }
    }

    pub fn session(&self) -> &ClientSession<D> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ClientSession<D> {
        &mut self.session
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Swap in a freshly connected channel.
    pub fn replace_channel(&mut self, channel: C) -> C {
        std::mem::replace(&mut self.channel, channel)
    }

    /// The channel opened. On a reconnect the cached state is dropped and a
    /// fresh snapshot is requested.
    pub fn on_open(&mut self) -> Result<(), ChannelError> {
        self.connections += 1;
        if self.connections == 1 {
            info!("connected");
            return Ok(());
        }
        info!(attempt = self.connections, "reconnected, requesting resync");
        self.session.reset();
        let text = ClientMessage::resync().to_json()?;
        self.channel.send(&text)
    }

    pub fn on_message(&mut self, text: &str) {
        if let Err(err) = self.session.handle_message(text) {
            warn!(error = %err, "server message not applied");
        }
    }

    /// The channel closed; returns how long to wait before reconnecting.
    pub fn on_close(&mut self) -> Duration {
        info!(delay_ms = self.policy.delay.as_millis() as u64, "connection closed, will retry");
        self.policy.delay
    }

    /// Send a DOM interaction to the server. Events raised while the
    /// channel is down are dropped, not queued.
    pub fn dispatch(&mut self, event: ClientEvent) -> Result<(), ChannelError> {
        if !self.channel.is_open() {
            warn!(widget = %event.id, kind = %event.kind, "channel closed, event dropped");
            return Err(ChannelError::Unavailable);
        }
        let text = ClientMessage::Event(event).to_json()?;
        self.channel.send(&text)
    }

    /// Back/forward navigation in the browser.
    pub fn location_changed(&mut self, path: &str) -> Result<(), ChannelError> {
        match self.session.location_changed(path) {
            Some(event) => self.dispatch(event),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_dom::VirtualDom;
    use trellis_types::{ServerMessage, Snapshot, WidgetDescriptor, WidgetKind};

    #[derive(Default)]
    struct RecordingChannel {
        open: bool,
        sent: Vec<String>,
    }

    impl Channel for RecordingChannel {
        fn is_open(&self) -> bool {
            self.open
        }

        fn send(&mut self, text: &str) -> Result<(), ChannelError> {
            self.sent.push(text.to_string());
            Ok(())
        }
    }

    fn snapshot_json() -> String {
        ServerMessage::InitialState(Snapshot {
            widgets: vec![
                WidgetDescriptor::new("r", WidgetKind::RootContainer).with_children(["b1"]),
                WidgetDescriptor::new("b1", WidgetKind::Button)
                    .with_property("parent", "r")
                    .with_property("text", "Go"),
            ],
            path: None,
            title: None,
        })
        .to_json()
        .unwrap()
    }

    #[test]
    fn test_dispatch_drops_when_closed() {
        let mut client = Client::new(VirtualDom::new(), RecordingChannel::default());
        let result = client.dispatch(ClientEvent::click("b1"));
        assert!(matches!(result, Err(ChannelError::Unavailable)));
        assert!(client.channel().sent.is_empty());
    }

    #[test]
    fn test_click_is_sent_as_event_envelope() {
        let channel = RecordingChannel {
            open: true,
            ..Default::default()
        };
        let mut client = Client::new(VirtualDom::new(), channel);
        client.on_open().unwrap();
        client.on_message(&snapshot_json());

        let event = client.session_mut().dom_mut().click(&"b1".into()).unwrap();
        client.dispatch(event).unwrap();
        assert_eq!(
            client.channel().sent,
            vec![r#"{"event":{"id":"b1","type":"click","data":{}}}"#.to_string()]
        );
    }

    #[test]
    fn test_reconnect_resets_and_requests_resync() {
        let channel = RecordingChannel {
            open: true,
            ..Default::default()
        };
        let mut client = Client::new(VirtualDom::new(), channel);
        client.on_open().unwrap();
        client.on_message(&snapshot_json());
        assert_eq!(client.session().cache().len(), 2);

        assert_eq!(client.on_close(), Duration::from_millis(1000));
        client.on_open().unwrap();

        assert!(client.session().cache().is_empty());
        assert_eq!(client.session().dom().outline(), "");
        assert_eq!(client.channel().sent, vec![r#"{"resync":{}}"#.to_string()]);
    }
}
