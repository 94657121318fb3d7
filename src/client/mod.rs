//! The asynchronous IRC client: connects a [`Connection`] to the [`Session`] engine and exposes
//! a typed stream of [`Event`]s to the embedder.
pub mod caps;
pub mod conn;
pub mod event;
pub mod ext;
pub mod mock;
pub mod send;
pub mod session;
pub mod state;
pub mod transport;

use std::sync::Arc;

use futures_util::{SinkExt, Stream, StreamExt};
use parking_lot::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;

use irc_proto::{Command, Message};

pub use self::conn::Connection;
pub use self::event::Event;
pub use self::state::ClientState;

use crate::config::Config;
use crate::error;
use crate::client::send::SendPipeline;
use crate::client::session::Session;

/// A single connected IRC client.
///
/// Internally, `Client::new` spawns one background task that owns the socket: it drains the
/// outgoing channel (applying flood protection before each write) and polls the incoming stream,
/// dispatching every parsed [`Message`] through the [`Session`] engine. The embedder only ever
/// sees the resulting [`Event`] stream and the handle to send outgoing commands.
pub struct Client {
    config: Config,
    state: Arc<RwLock<ClientState>>,
    send: SendPipeline,
    events: Option<UnboundedReceiver<Event>>,
    task: JoinHandle<()>,
}

impl Client {
    /// Connects to the server described by `config` and begins the registration handshake.
    /// Returns once the background task has been spawned; registration and further traffic
    /// happen asynchronously and are observed via [`Client::stream`].
    pub async fn new(config: Config) -> error::Result<Client> {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let connection = Connection::new(&config, outgoing_tx.clone()).await?;
        let mut session = Session::new(&config)?;
        let state = Arc::new(RwLock::new(session.state().clone()));

        let mut registration_pipeline = SendPipeline::new(
            outgoing_tx.clone(),
            config.flood_protection,
            config.flood_protection_delay,
        );

        session.register(&mut registration_pipeline).await?;

        let client_pipeline = SendPipeline::new(
            outgoing_tx.clone(),
            config.flood_protection,
            config.flood_protection_delay,
        );

        let task_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            run(connection, outgoing_rx, events_tx, session, registration_pipeline, task_state).await;
        });

        Ok(Client {
            config,
            state,
            send: client_pipeline,
            events: Some(events_rx),
            task,
        })
    }

    /// A read-only, thread-safe snapshot handle of the session state.
    pub fn state(&self) -> Arc<RwLock<ClientState>> {
        Arc::clone(&self.state)
    }

    /// Returns the stream of events for this client. May only be called once; subsequent calls
    /// return `None`.
    pub fn stream(&mut self) -> Option<impl Stream<Item = Event>> {
        self.events.take().map(UnboundedReceiverStream::new)
    }

    /// Queues a pre-built `Command` for sending, applying flood protection if configured. Prefer
    /// the convenience methods in [`ext`] over building a [`Command`] by hand.
    pub async fn send(&mut self, command: Command) -> error::Result<()> {
        self.send.send_command(command).await
    }

    /// The configuration this client was constructed with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Aborts the background task and drops the connection without sending `QUIT`.
    pub fn abort(&self) {
        self.task.abort();
    }
}

async fn run(
    mut connection: Connection,
    mut outgoing_rx: UnboundedReceiver<Message>,
    events_tx: UnboundedSender<Event>,
    mut session: Session,
    mut send_pipeline: SendPipeline,
    state: Arc<RwLock<ClientState>>,
) {
    loop {
        tokio::select! {
            outgoing = outgoing_rx.recv() => {
                match outgoing {
                    Some(msg) => {
                        if connection.send(msg).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = connection.next() => {
                match incoming {
                    Some(Ok(msg)) => {
                        match session.handle_message(&msg, &mut send_pipeline).await {
                            Ok(events) => {
                                *state.write() = session.state().clone();
                                for event in events {
                                    if events_tx.send(event).is_err() {
                                        return;
                                    }
                                }
                            }
                            Err(e) => {
                                log::warn!("error handling message {:?}: {}", msg, e);
                            }
                        }
                    }
                    Some(Err(e)) => {
                        log::warn!("connection error: {}", e);
                        let _ = events_tx.send(Event::NetError(e.to_string()));
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    send_pipeline.request_disconnect();
}
