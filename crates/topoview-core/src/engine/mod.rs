//! Topology view engine
//!
//! The TopologyViewEngine is responsible for:
//! - Watching the network model for topology events
//! - Translating each event into a broadcast message
//! - Answering client requests (details, traffic, meta-UI updates)
//! - Handing every outgoing message to the transport through a bounded channel
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐             ┌────────────────┐
//! │ TopologyEventSource│── events ──┐│ ClientRequest  │
//! └────────────────────┘            ││ stream         │
//!                                   ▼└───────┬────────┘
//!                        ┌────────────────────┐
//!                        │ TopologyViewEngine │◀┘
//!                        └────────────────────┘
//!                                   │
//!                                   ▼
//!                        ┌────────────────────┐
//!                        │TopologyViewMessages│── queries ──▶ services
//!                        └────────────────────┘
//!                                   │
//!                                   ▼
//!                       mpsc::Receiver<OutboundMessage>
//! ```
//!
//! ## Event Flow
//!
//! 1. Subscribe to topology events
//! 2. Send the initial snapshot (`add*` for every known entity), if enabled,
//!    waiting for channel room so no entity is left out
//! 3. Translate each event, in arrival order, into one message
//! 4. Apply meta-UI updates in arrival order; answer queries on their own tasks
//! 5. Report handler failures to the client as `error` messages
//! 6. On stop, let in-flight queries finish and deliver their replies

use std::pin::Pin;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::config::ViewConfig;
use crate::error::{Error, Result};
use crate::messages::{self, ClientRequest, OutboundMessage, TopologyViewMessages};
use crate::model::TopologyEvent;
use crate::traits::TopologyEventSource;

/// Boxed stream of parsed client requests
pub type RequestStream = Pin<Box<dyn Stream<Item = ClientRequest> + Send + 'static>>;

/// Core topology view engine
///
/// ## Lifecycle
///
/// 1. Create with [`TopologyViewEngine::new()`]
/// 2. Start with [`TopologyViewEngine::run()`]
/// 3. Engine runs until a shutdown signal is received, the event source ends,
///    or (with `stop_on_request_end`) the request stream ends
/// 4. Drop to cleanup
///
/// ## Ordering
///
/// Topology events are translated one after another, so a client never sees
/// `updateDevice` before the matching `addDevice`. Meta-UI updates are applied
/// in the same loop. Detail and traffic queries run on separate tasks so a
/// slow statistics lookup does not hold back event delivery.
///
/// ## Load Resistance
///
/// The outbound channel is bounded. When the transport falls behind, new live
/// messages are dropped (logged) instead of buffering without limit. The
/// initial snapshot is the exception: it waits for room, since a client
/// missing an `add*` cannot make sense of later updates.
pub struct TopologyViewEngine {
    /// Message translators
    messages: TopologyViewMessages,

    /// Where topology events come from
    events: Box<dyn TopologyEventSource>,

    /// Send `add*` messages for the current topology on start
    send_initial_snapshot: bool,

    /// Stop once the client request stream ends
    stop_on_request_end: bool,

    /// Outgoing messages for the transport
    outbound_tx: mpsc::Sender<OutboundMessage>,
}

impl TopologyViewEngine {
    /// Create a new topology view engine
    ///
    /// # Parameters
    ///
    /// - `messages`: Message translators over the network model services
    /// - `events`: Topology event source
    /// - `config`: Viewer configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, outbound_receiver) where outbound_receiver yields
    /// every message bound for the client
    pub fn new(
        messages: TopologyViewMessages,
        events: Box<dyn TopologyEventSource>,
        config: &ViewConfig,
    ) -> Result<(Self, mpsc::Receiver<OutboundMessage>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.outbound_channel_capacity);

        let engine = Self {
            messages: messages.with_display(config.display.clone()),
            events,
            send_initial_snapshot: config.engine.send_initial_snapshot,
            stop_on_request_end: config.engine.stop_on_request_end,
            outbound_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Message translators used by the engine
    pub fn messages(&self) -> &TopologyViewMessages {
        &self.messages
    }

    /// Run the engine
    ///
    /// Runs until SIGINT or until the topology event source ends.
    /// In-flight queries are answered before this returns.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Fatal error
    pub async fn run(&self, requests: RequestStream) -> Result<()> {
        self.run_internal(requests, None).await
    }

    /// Run the engine until `shutdown_rx` fires (or its sender is dropped)
    ///
    /// With `None` this behaves like [`run()`](Self::run).
    pub async fn run_with_shutdown(
        &self,
        requests: RequestStream,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(requests, shutdown_rx).await
    }

    async fn run_internal(
        &self,
        mut requests: RequestStream,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        // Subscribe before the snapshot so nothing falls between the two
        let mut events = self.events.watch();
        info!("Topology view engine started");

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        if self.send_initial_snapshot {
            tokio::select! {
                _ = self.send_snapshot() => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received during initial snapshot");
                    info!("Topology view engine stopped");
                    return Ok(());
                }
            }
        }

        let mut queries = JoinSet::new();
        let mut requests_open = true;

        loop {
            tokio::select! {
                event = events.next() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        info!("Topology event source closed");
                        break;
                    }
                },

                request = requests.next(), if requests_open => match request {
                    Some(request) => self.handle_request(request, &mut queries).await,
                    None if self.stop_on_request_end => {
                        info!("Client request stream closed");
                        break;
                    }
                    None => {
                        debug!("Client request stream closed");
                        requests_open = false;
                    }
                },

                Some(joined) = queries.join_next(), if !queries.is_empty() => {
                    if let Err(e) = joined {
                        error!("Request handler failed to complete: {}", e);
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        if !queries.is_empty() {
            debug!("Waiting for {} in-flight request(s)", queries.len());
        }
        while let Some(joined) = queries.join_next().await {
            if let Err(e) = joined {
                error!("Request handler failed to complete: {}", e);
            }
        }
        info!("Topology view engine stopped");

        Ok(())
    }

    /// Send the initial snapshot, waiting for channel room
    async fn send_snapshot(&self) {
        match self.messages.snapshot_messages().await {
            Ok(snapshot) => {
                debug!("Sending initial snapshot of {} message(s)", snapshot.len());
                for message in snapshot {
                    if self.outbound_tx.send(message).await.is_err() {
                        debug!("Outbound channel closed, initial snapshot discarded");
                        return;
                    }
                }
            }
            Err(e) => {
                error!("Failed to build initial snapshot: {}", e);
                report(&self.outbound_tx, 0, &e);
            }
        }
    }

    /// Translate one topology event
    async fn handle_event(&self, event: TopologyEvent) {
        match self.messages.event_message(&event).await {
            Ok(message) => {
                let lag = Utc::now().signed_duration_since(event.time());
                debug!(
                    "Translated {} message {}ms after the event",
                    message.kind,
                    lag.num_milliseconds()
                );
                deliver(&self.outbound_tx, message);
            }
            Err(e) => {
                error!("Failed to translate {:?}: {}", event, e);
                report(&self.outbound_tx, 0, &e);
            }
        }
    }

    /// Apply or dispatch one client request
    async fn handle_request(&self, request: ClientRequest, queries: &mut JoinSet<()>) {
        if let ClientRequest::UpdateMeta { .. } = request {
            // Stays in order with event translation
            answer(&self.messages, &self.outbound_tx, request).await;
            return;
        }

        let messages = self.messages.clone();
        let tx = self.outbound_tx.clone();
        queries.spawn(async move {
            answer(&messages, &tx, request).await;
        });
    }
}

async fn answer(
    messages: &TopologyViewMessages,
    tx: &mpsc::Sender<OutboundMessage>,
    request: ClientRequest,
) {
    let sid = request.correlation_id();
    match messages.respond(&request).await {
        Ok(Some(reply)) => deliver(tx, reply),
        Ok(None) => {}
        Err(e) => {
            error!("Failed to handle {} request: {}", request.name(), e);
            report(tx, sid, &e);
        }
    }
}

/// Queue a message for the transport
fn deliver(tx: &mpsc::Sender<OutboundMessage>, message: OutboundMessage) {
    match tx.try_send(message) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(message)) => {
            warn!(
                "Outbound channel full, dropping {} message. Consider increasing outbound_channel_capacity.",
                message.kind
            );
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("Outbound channel closed, message discarded");
        }
    }
}

/// Tell the client a handler failed
fn report(tx: &mpsc::Sender<OutboundMessage>, sid: i64, err: &Error) {
    match messages::error(sid, err.to_string()).into_outbound() {
        Ok(message) => deliver(tx, message),
        Err(e) => error!("Failed to build error message: {}", e),
    }
}
