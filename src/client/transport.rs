//! A transport that wraps a framed IRC stream to provide automatic `PING` replies, a keepalive
//! `PING` timer, and ping-timeout detection.
//!
//! Replies and keepalive pings are not written directly to the socket from here; instead they
//! are pushed onto the same outgoing channel used by the rest of the client, so that they pass
//! through the flood-protected send pipeline like any other outgoing message.
use std::pin::Pin;
use std::sync::{Arc, RwLock, RwLockReadGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::{Sink, Stream};
use irc_proto::{Command, Message};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{self, Instant, Interval};
use tokio_util::codec::Framed;

use crate::config::Config;
use crate::error;

/// A transport that handles core connection-keepalive functionality.
pub struct Transport<T>
where
    T: AsyncRead + AsyncWrite,
{
    inner: Framed<T, irc_proto::IrcCodec>,
    outgoing: UnboundedSender<Message>,
    ping_timer: Interval,
    ping_timeout: Duration,
    last_ping_data: String,
    last_ping_sent: Instant,
    last_pong_received: Instant,
}

impl<T> Transport<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new `Transport` from the given framed IRC stream. Keepalive pings and
    /// automatic `PONG` replies are pushed onto `outgoing`.
    pub fn new(
        config: &Config,
        inner: Framed<T, irc_proto::IrcCodec>,
        outgoing: UnboundedSender<Message>,
    ) -> Transport<T> {
        Transport {
            inner,
            outgoing,
            ping_timer: time::interval(Duration::from_secs(u64::from(config.ping_interval))),
            ping_timeout: Duration::from_secs(u64::from(config.connection_timeout)),
            last_ping_data: String::new(),
            last_ping_sent: Instant::now(),
            last_pong_received: Instant::now(),
        }
    }

    /// Gets the inner stream underlying the `Transport`.
    pub fn into_inner(self) -> Framed<T, irc_proto::IrcCodec> {
        self.inner
    }

    fn ping_timed_out(&self) -> bool {
        self.last_pong_received < self.last_ping_sent
            && self.last_ping_sent.elapsed() >= self.ping_timeout
    }

    fn queue_keepalive_ping(&mut self) {
        let data = format!("{}", chrono::Local::now().timestamp());
        let msg = Message::from(Command::PING(data.clone(), None));
        // The background sender may already be gone if the client was dropped; there's nothing
        // useful to do about that here.
        let _ = self.outgoing.send(msg);
        self.last_ping_sent = Instant::now();
        self.last_ping_data = data;
    }
}

impl<T> Stream for Transport<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    type Item = error::Result<Message>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.ping_timed_out() {
            return Poll::Ready(Some(Err(error::Error::PingTimeout)));
        }

        if self.ping_timer.poll_tick(cx).is_ready() {
            self.queue_keepalive_ping();
        }

        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e.into()))),
            Poll::Ready(Some(Ok(msg))) => {
                match msg.command() {
                    "PING" => {
                        let mut params = msg.params();
                        let data = params.next().unwrap_or("").to_owned();
                        let reply = Message::from(Command::PONG(data, None));
                        let _ = self.outgoing.send(reply);
                    }
                    "PONG" => {
                        let mut params = msg.params();
                        let data = params.next_back().unwrap_or("");
                        if self.last_ping_data == data {
                            self.last_pong_received = Instant::now();
                        }
                    }
                    _ => (),
                }

                Poll::Ready(Some(Ok(msg)))
            }
        }
    }
}

impl<T> Sink<Message> for Transport<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    type Error = error::Error;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner).poll_ready(cx).map_err(Into::into)
    }

    fn start_send(mut self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        Pin::new(&mut self.inner).start_send(item).map_err(Into::into)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner).poll_flush(cx).map_err(Into::into)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner).poll_close(cx).map_err(Into::into)
    }
}

/// A view of the logs from a particular `Logged` transport.
#[derive(Clone)]
pub struct LogView {
    sent: Arc<RwLock<Vec<Message>>>,
    received: Arc<RwLock<Vec<Message>>>,
}

impl LogView {
    /// Gets a read guard for all the messages sent on the transport.
    pub fn sent(&self) -> error::Result<RwLockReadGuard<Vec<Message>>> {
        self.sent.read().map_err(|_| error::Error::PoisonedLog)
    }

    /// Gets a read guard for all the messages received on the transport.
    pub fn received(&self) -> error::Result<RwLockReadGuard<Vec<Message>>> {
        self.received.read().map_err(|_| error::Error::PoisonedLog)
    }
}

/// A logged version of the `Transport` that records all sent and received messages. Used by
/// the mock-stream test harness.
pub struct Logged<T>
where
    T: AsyncRead + AsyncWrite,
{
    inner: Transport<T>,
    view: LogView,
}

impl<T> Logged<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps the given `Transport` in logging.
    pub fn wrap(inner: Transport<T>) -> Logged<T> {
        Logged {
            inner,
            view: LogView {
                sent: Arc::new(RwLock::new(vec![])),
                received: Arc::new(RwLock::new(vec![])),
            },
        }
    }

    /// Gets a view of the logging for this transport.
    pub fn view(&self) -> LogView {
        self.view.clone()
    }
}

impl<T> Stream for Logged<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    type Item = error::Result<Message>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(msg))) => {
                if let Ok(mut received) = self.view.received.write() {
                    received.push(msg.clone());
                }
                Poll::Ready(Some(Ok(msg)))
            }
            other => other,
        }
    }
}

impl<T> Sink<Message> for Logged<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    type Error = error::Error;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner).poll_ready(cx)
    }

    fn start_send(mut self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        if let Ok(mut sent) = self.view.sent.write() {
            sent.push(item.clone());
        }
        Pin::new(&mut self.inner).start_send(item)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner).poll_close(cx)
    }
}
