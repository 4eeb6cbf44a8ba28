//! One websocket connection driving one widget tree.

use anyhow::Result;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use trellis_types::{ClientMessage, ServerMessage};
use trellis_ui::{SharedUi, dispatch, run_page_hooks};

type Sink<S> = SplitSink<WebSocketStream<S>, Message>;

/// Serve `ui` over `ws` until the peer goes away.
///
/// Client events are handled strictly one at a time: the next frame is not
/// read until the previous event's handlers have finished and their ops
/// have been sent. Ops produced in between (background tasks) go out on
/// the flush tick.
pub async fn run_session<S>(ws: WebSocketStream<S>, ui: SharedUi, flush_every: Duration) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut sink, mut stream) = ws.split();

    {
        let mut guard = ui.lock();
        if let Err(err) = guard.initialize() {
            warn!(error = %err, "initial navigation failed");
        }
    }
    run_page_hooks(&ui).await;
    send_snapshot(&ui, &mut sink).await?;

    let mut ticker = tokio::time::interval(flush_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    handle_frame(&ui, &text, &mut sink).await?;
                    flush(&ui, &mut sink).await?;
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("session closed by client");
                    break;
                }
                // tungstenite queues the pong for pings on its own
                Some(Ok(_)) => debug!("non-text frame ignored"),
                Some(Err(err)) => {
                    warn!(error = %err, "websocket error, ending session");
                    break;
                }
            },
            _ = ticker.tick() => flush(&ui, &mut sink).await?,
        }
    }
    Ok(())
}

async fn handle_frame<S>(ui: &SharedUi, text: &str, sink: &mut Sink<S>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match ClientMessage::from_json(text) {
        Ok(ClientMessage::Event(event)) => {
            debug!(widget = %event.id, kind = %event.kind, "client event");
            // unresolved targets are logged by dispatch
            let _ = dispatch(ui, &event).await;
        }
        Ok(ClientMessage::Resync(_)) => {
            info!("client requested resync");
            send_snapshot(ui, sink).await?;
        }
        Err(err) => warn!(error = %err, "malformed client frame ignored"),
    }
    Ok(())
}

/// Send the full tree, dropping ops it already covers.
async fn send_snapshot<S>(ui: &SharedUi, sink: &mut Sink<S>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let text = {
        let mut guard = ui.lock();
        guard.discard_ops();
        ServerMessage::InitialState(guard.snapshot()).to_json()?
    };
    sink.send(Message::Text(text)).await?;
    Ok(())
}

async fn flush<S>(ui: &SharedUi, sink: &mut Sink<S>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ops = ui.lock().take_ops();
    if ops.is_empty() {
        return Ok(());
    }
    debug!(ops = ops.len(), "flushing updates");
    let text = ServerMessage::Updates(ops).to_json()?;
    sink.send(Message::Text(text)).await?;
    Ok(())
}
