//! The signed-message gateway (spec.md §4.4, component D): one Tokio
//! task per connection, a typed inbound dispatch table keyed by
//! [`state::ConnectionState`], and a bounded, back-pressured outbound
//! channel per session. Grounded on `nexus-gateway::{lib.rs, session.rs}`.

pub mod handlers;
pub mod protocol;
pub mod session;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use footfall_chain::ChainGateway;
use footfall_common::error::FootfallError;
use futures_util::{SinkExt, StreamExt};

use handlers::HandlerContext;
use protocol::InboundMessage;
use session::SessionManager;
use state::ConnectionState;

#[derive(Clone)]
pub struct GatewayState {
    pub pool: sqlx::AnyPool,
    pub chain: Option<Arc<ChainGateway>>,
    pub sessions: Arc<SessionManager>,
    pub chain_deadline: Duration,
    pub outbound_channel_capacity: usize,
}

impl GatewayState {
    pub fn new(
        pool: sqlx::AnyPool,
        chain: Option<Arc<ChainGateway>>,
        chain_deadline: Duration,
        outbound_channel_capacity: usize,
    ) -> Self {
        Self {
            pool,
            chain,
            sessions: Arc::new(SessionManager::new()),
            chain_deadline,
            outbound_channel_capacity,
        }
    }

    fn handler_context(&self) -> HandlerContext<'_> {
        HandlerContext { pool: &self.pool, chain: self.chain.as_ref(), chain_deadline: self.chain_deadline }
    }
}

pub fn build_router(state: GatewayState) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(Arc::new(state))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<GatewayState>>) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

/// One logical task per connection: a read loop dispatching inbound
/// frames through the session state machine, and a forwarding task
/// draining this session's outbound channel onto the socket (spec.md
/// §5 "one read loop + one write loop").
async fn handle_connection(socket: WebSocket, state: Arc<GatewayState>) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) =
        tokio::sync::mpsc::channel::<String>(state.outbound_channel_capacity);

    let send_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    if outbound_tx.send(handlers::welcome().to_string()).await.is_err() {
        send_task.abort();
        return;
    }

    let mut connection_state = ConnectionState::Connected;
    let mut device_id: Option<String> = None;

    while let Some(Ok(msg)) = receiver.next().await {
        let Message::Text(text) = msg else {
            if matches!(msg, Message::Close(_)) {
                break;
            }
            continue;
        };

        let inbound: InboundMessage = match serde_json::from_str(&text) {
            Ok(inbound) => inbound,
            Err(e) => {
                let err = FootfallError::Validation(format!("malformed message: {e}"));
                let _ = outbound_tx.send(handlers::error_frame(&err).to_string()).await;
                continue;
            }
        };

        if !connection_state.accepts(inbound.type_name()) {
            let err = FootfallError::State(format!(
                "{} is not accepted in state {connection_state:?}",
                inbound.type_name()
            ));
            let _ = outbound_tx.send(handlers::error_frame(&err).to_string()).await;
            continue;
        }

        let ctx = state.handler_context();
        let response = dispatch(&ctx, &mut connection_state, &mut device_id, &state, &outbound_tx, inbound).await;
        if let Some(response) = response {
            if outbound_tx.send(response.to_string()).await.is_err() {
                break;
            }
        }
    }

    if let Some(device_id) = &device_id {
        state.sessions.remove(device_id).await;
        tracing::info!(device_id, "session closed");
    }
    send_task.abort();
}

/// Route one inbound message to its handler. Returns `None` only when the
/// handler already pushed its own response directly onto the outbound
/// channel (authenticate, which must register the channel first).
async fn dispatch(
    ctx: &HandlerContext<'_>,
    connection_state: &mut ConnectionState,
    device_id: &mut Option<String>,
    state: &Arc<GatewayState>,
    outbound_tx: &session::OutboundSender,
    inbound: InboundMessage,
) -> Option<serde_json::Value> {
    match inbound {
        InboundMessage::Register { device_id: id, public_key } => {
            let response = handlers::register(ctx, &id, &public_key).await;
            if response["success"].as_bool().unwrap_or(false) {
                *connection_state = ConnectionState::Registered;
            }
            Some(response)
        }
        InboundMessage::Authenticate { device_id: id } => {
            let response = handlers::authenticate(ctx, &id).await;
            if response["success"].as_bool().unwrap_or(false) {
                *connection_state = ConnectionState::Authenticated;
                state.sessions.register(id.clone(), outbound_tx.clone()).await;
                *device_id = Some(id);
            }
            Some(response)
        }
        InboundMessage::Ping {} => Some(handlers::pong()),
        InboundMessage::StepData {
            device_id: msg_device_id,
            step_count,
            timestamp,
            firmware_version,
            battery_percent,
            raw_acc_samples,
            signature,
        } => {
            let Some(session_device_id) = device_id.as_deref() else {
                return Some(handlers::error_frame(&FootfallError::State("not authenticated".into())));
            };
            if msg_device_id != session_device_id {
                return Some(handlers::error_frame(&FootfallError::Validation(
                    "deviceId does not match authenticated session".into(),
                )));
            }
            Some(
                handlers::step_data(
                    ctx,
                    session_device_id,
                    step_count,
                    timestamp,
                    firmware_version,
                    battery_percent,
                    raw_acc_samples.get(),
                    &signature,
                )
                .await,
            )
        }
        InboundMessage::GetPet {} => with_authenticated(device_id, |id| handlers::get_pet(ctx, id)).await,
        InboundMessage::UpdatePet { pet_name, cosmetic } => {
            with_authenticated(device_id, |id| handlers::update_pet(ctx, id, pet_name.clone(), cosmetic.clone())).await
        }
        InboundMessage::ClaimResources { steps } => {
            with_authenticated(device_id, |id| handlers::claim_resources(ctx, id, steps)).await
        }
        InboundMessage::FeedPet {} => with_authenticated(device_id, |id| handlers::feed_pet(ctx, id)).await,
        InboundMessage::PlayWithPet {} => with_authenticated(device_id, |id| handlers::play_with_pet(ctx, id)).await,
    }
}

async fn with_authenticated<'a, F, Fut>(device_id: &'a Option<String>, f: F) -> Option<serde_json::Value>
where
    F: FnOnce(&'a str) -> Fut,
    Fut: std::future::Future<Output = serde_json::Value> + 'a,
{
    match device_id.as_deref() {
        Some(id) => Some(f(id).await),
        None => Some(handlers::error_frame(&FootfallError::State("not authenticated".into()))),
    }
}
