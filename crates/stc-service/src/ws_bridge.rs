//! WebSocket transport for the command channel.
//!
//! Each peer sends `Transact` envelopes and gets one `Reply` per request.
//! A peer that completes `ConnectClient` is also subscribed to refresh
//! events and receives `ToggleScreenUpdates` pushes.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;

use crate::command::CommandId;
use crate::ipc::{self, PeerToService, ServiceToPeer};
use crate::parcel::Parcel;
use crate::permission::CallerUid;
use crate::refresh::{RefreshEvent, ScreenRefresh};
use crate::service::OemService;

/// Everything a peer connection needs.
#[derive(Clone)]
pub struct BridgeContext {
    pub service: Arc<OemService>,
    /// Identity assigned to transport peers.
    pub caller: CallerUid,
    pub refresh: ScreenRefresh,
}

/// Run one request against the service and build the reply envelope.
///
/// Returns the envelope and whether the peer just registered as a client.
pub fn handle_request(
    service: &OemService,
    caller: CallerUid,
    request: PeerToService,
) -> (ServiceToPeer, bool) {
    let PeerToService::Transact { code, parcel } = request;
    let mut data = match ipc::decode_parcel(&parcel) {
        Ok(data) => data,
        Err(e) => {
            return (
                ServiceToPeer::Error {
                    message: format!("invalid parcel for command {code}: {e}"),
                },
                false,
            );
        }
    };

    let mut reply = Parcel::new();
    match service.on_transact(code, caller, &mut data, &mut reply) {
        Ok(()) => (
            ServiceToPeer::Reply {
                code,
                status: 0,
                parcel: ipc::encode_parcel(&reply),
            },
            code == CommandId::ConnectClient.code(),
        ),
        Err(e) => (
            ServiceToPeer::Reply {
                code,
                status: e.code(),
                parcel: String::new(),
            },
            false,
        ),
    }
}

/// Bind `127.0.0.1:{port}` and serve peers on a dedicated thread.
pub fn spawn_ws_server(
    port: u16,
    context: BridgeContext,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let listener = rt.block_on(TcpListener::bind(("127.0.0.1", port)))?;
    tracing::info!("WebSocket command server listening on ws://127.0.0.1:{port}");

    Ok(std::thread::spawn(move || {
        rt.block_on(serve(listener, context));
    }))
}

/// Accept peers until the listener fails.
pub async fn serve(listener: TcpListener, context: BridgeContext) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!("Accept failed: {e}");
                continue;
            }
        };
        tokio::spawn(handle_peer(stream, peer, context.clone()));
    }
}

async fn handle_peer(stream: TcpStream, peer: SocketAddr, context: BridgeContext) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::error!("WebSocket handshake with {peer} failed: {e}");
            return;
        }
    };
    tracing::info!("WebSocket peer connected: {peer}");

    let (mut ws_sink, mut ws_source) = ws_stream.split();
    let mut refresh_rx: Option<broadcast::Receiver<RefreshEvent>> = None;

    loop {
        let outbound = tokio::select! {
            msg = ws_source.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let (reply, registered) = dispatch_text(&context, text.to_string()).await;
                    if registered && refresh_rx.is_none() {
                        refresh_rx = Some(context.refresh.subscribe());
                    }
                    reply
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => continue,
            },
            event = next_refresh(&mut refresh_rx) => match event {
                Ok(event) => ServiceToPeer::ToggleScreenUpdates { enable: event.enable },
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!("Peer {peer} missed {missed} refresh events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    refresh_rx = None;
                    continue;
                }
            },
        };

        match serde_json::to_string(&outbound) {
            Ok(json) => {
                if ws_sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            Err(e) => tracing::error!("Failed to serialize ServiceToPeer: {e}"),
        }
    }

    tracing::info!("WebSocket peer disconnected: {peer}");
}

/// Parse and run one text frame off the async thread.
async fn dispatch_text(context: &BridgeContext, text: String) -> (ServiceToPeer, bool) {
    let request = match serde_json::from_str::<PeerToService>(&text) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Failed to parse peer message: {e}");
            return (
                ServiceToPeer::Error {
                    message: format!("unreadable message: {e}"),
                },
                false,
            );
        }
    };

    let service = Arc::clone(&context.service);
    let caller = context.caller;
    match tokio::task::spawn_blocking(move || handle_request(&service, caller, request)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Command task failed: {e}");
            (
                ServiceToPeer::Error {
                    message: "command task failed".into(),
                },
                false,
            )
        }
    }
}

/// Next refresh event, or never when the peer is not subscribed.
async fn next_refresh(
    rx: &mut Option<broadcast::Receiver<RefreshEvent>>,
) -> Result<RefreshEvent, broadcast::error::RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::{UID_GRAPHICS, UID_SYSTEM};

    #[test]
    fn test_connect_registers_graphics_peer() {
        let service = OemService::new();
        let request = PeerToService::transact(CommandId::ConnectClient.code(), &Parcel::new());
        let (reply, registered) = handle_request(&service, UID_GRAPHICS, request.clone());
        assert!(registered);
        assert!(matches!(reply, ServiceToPeer::Reply { status: 0, .. }));

        let (reply, registered) = handle_request(&service, UID_SYSTEM, request);
        assert!(!registered);
        assert!(matches!(reply, ServiceToPeer::Reply { status: -1, .. }));
    }

    #[test]
    fn test_status_forwarded_without_client() {
        let service = OemService::new();
        let request = PeerToService::transact(CommandId::GetGammaCapability.code(), &Parcel::new());
        let (reply, _) = handle_request(&service, UID_SYSTEM, request);
        assert_eq!(
            reply,
            ServiceToPeer::Reply {
                code: CommandId::GetGammaCapability.code(),
                status: -107,
                parcel: String::new(),
            }
        );
    }

    #[test]
    fn test_undecodable_parcel_is_error_message() {
        let service = OemService::new();
        let request = PeerToService::Transact {
            code: 4,
            parcel: "%%%".into(),
        };
        let (reply, _) = handle_request(&service, UID_SYSTEM, request);
        assert!(matches!(reply, ServiceToPeer::Error { .. }));
    }
}
