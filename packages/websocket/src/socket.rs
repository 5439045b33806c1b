//! A socket that reconnects when the connection drops.
use std::{collections::VecDeque, ops::ControlFlow, time::Duration};

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::{
    net::TcpStream,
    select,
    sync::mpsc,
    task::JoinHandle,
    time::{self, timeout},
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{header::SEC_WEBSOCKET_PROTOCOL, HeaderValue},
        Message,
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::{registry::SharedRegistry, CloseEvent, Error, Event, EventKind};

/// How the socket reconnects.
#[derive(Clone, Debug, PartialEq)]
pub struct SocketOptions {
    /// Delay before the first reconnect.
    pub reconnect_interval: Duration,
    pub max_reconnect_interval: Duration,
    /// Growth factor of the delay, per failed attempt.
    pub reconnect_decay: f64,
    /// Limit on each connection attempt.
    pub timeout_interval: Duration,
    /// `None` keeps trying forever.
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            reconnect_interval: Duration::from_secs(1),
            max_reconnect_interval: Duration::from_secs(30),
            reconnect_decay: 1.5,
            timeout_interval: Duration::from_secs(2),
            max_reconnect_attempts: None,
        }
    }
}

impl SocketOptions {
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn max_reconnect_interval(mut self, interval: Duration) -> Self {
        self.max_reconnect_interval = interval;
        self
    }

    pub fn reconnect_decay(mut self, decay: f64) -> Self {
        self.reconnect_decay = decay;
        self
    }

    pub fn timeout_interval(mut self, interval: Duration) -> Self {
        self.timeout_interval = interval;
        self
    }

    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = Some(attempts);
        self
    }

    /// `reconnect_interval * reconnect_decay ^ attempt`, capped at
    /// `max_reconnect_interval`.
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let factor = self
            .reconnect_decay
            .powi(i32::try_from(attempt).unwrap_or(i32::MAX));

        Duration::try_from_secs_f64(self.reconnect_interval.as_secs_f64() * factor)
            .map_or(self.max_reconnect_interval, |delay| {
                delay.min(self.max_reconnect_interval)
            })
    }
}

/// Handle to a running socket task. Dropping it closes the socket.
pub(crate) struct Socket {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl Socket {
    /// Start connecting on the current tokio runtime.
    pub(crate) fn open(
        url: String,
        protocols: Vec<String>,
        options: SocketOptions,
        registry: SharedRegistry,
    ) -> Self {
        // Unbounded, so `send` never waits on the network. The queue only
        // grows while the socket is reconnecting.
        let (commands, to_run) = mpsc::unbounded_channel();
        let background = BackgroundSocket {
            url,
            protocols,
            options,
            registry,
            commands: to_run,
            pending: VecDeque::new(),
        };

        Self {
            commands,
            task: tokio::spawn(background.run()),
        }
    }

    pub(crate) fn send(&self, msg: Message) -> Result<(), Error> {
        self.commands
            .send(Command::Send(msg))
            .map_err(|_| Error::NotOpen)
    }

    pub(crate) fn close(&self) {
        self.commands
            .send(Command::Close { silent: false })
            .unwrap_or(());
    }

    /// Close without dispatching a `Close` event.
    pub(crate) fn close_silently(&self) {
        self.commands
            .send(Command::Close { silent: true })
            .unwrap_or(());
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

enum Command {
    Send(Message),
    Close { silent: bool },
}

type Connection = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct BackgroundSocket {
    url: String,
    protocols: Vec<String>,
    options: SocketOptions,
    registry: SharedRegistry,
    commands: mpsc::UnboundedReceiver<Command>,
    // Messages sent while disconnected.
    pending: VecDeque<Message>,
}

impl BackgroundSocket {
    async fn run(mut self) {
        let mut attempt: u32 = 0;

        loop {
            match self.connect().await {
                Ok(connection) => {
                    attempt = 0;
                    info!(url = %self.url, "Connected to ws");
                    self.registry.dispatch(&Event::Open);

                    if self.pump(connection).await.is_break() {
                        return;
                    }
                }
                Err(e) => {
                    warn!(url = %self.url, error = %e, "Couldn't connect to ws");
                    self.registry.dispatch(&Event::Error(e));
                }
            }

            if self
                .options
                .max_reconnect_attempts
                .is_some_and(|max| attempt >= max)
            {
                warn!(url = %self.url, attempt, "Giving up reconnecting to ws");
                return;
            }

            let delay = self.options.reconnect_delay(attempt);
            attempt = attempt.saturating_add(1);
            debug!(url = %self.url, attempt, ?delay, "Reconnecting to ws");

            if self.wait(delay).await.is_break() {
                return;
            }
        }
    }

    async fn connect(&self) -> Result<Connection, String> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| e.to_string())?;

        if !self.protocols.is_empty() {
            let protocols =
                HeaderValue::from_str(&self.protocols.join(", ")).map_err(|e| e.to_string())?;
            request
                .headers_mut()
                .insert(SEC_WEBSOCKET_PROTOCOL, protocols);
        }

        match timeout(self.options.timeout_interval, connect_async(request)).await {
            Ok(Ok((connection, _response))) => Ok(connection),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "Connection timed out after {:?}",
                self.options.timeout_interval
            )),
        }
    }

    /// Move messages until the connection drops or the socket is closed.
    async fn pump(&mut self, mut connection: Connection) -> ControlFlow<()> {
        while let Some(msg) = self.pending.pop_front() {
            if let Err(e) = connection.send(msg).await {
                self.registry.dispatch(&Event::Error(e.to_string()));
            }
        }

        let mut close_frame = None;

        loop {
            select! {
                incoming = connection.next() => match incoming {
                    Some(Ok(Message::Close(frame))) => close_frame = frame,
                    Some(Ok(msg)) => self.receive(msg),
                    Some(Err(e)) => {
                        warn!(url = %self.url, error = %e, "Error on ws");
                        self.registry.dispatch(&Event::Error(e.to_string()));
                        break;
                    }
                    None => break,
                },
                command = self.commands.recv() => match command {
                    Some(Command::Send(msg)) => {
                        if let Err(e) = connection.send(msg).await {
                            warn!(url = %self.url, error = %e, "Couldn't send on ws");
                            self.registry.dispatch(&Event::Error(e.to_string()));
                        }
                    }
                    command @ (Some(Command::Close { .. }) | None) => {
                        if let Err(e) = connection.close(None).await {
                            debug!(url = %self.url, error = %e, "Closing ws");
                        }

                        if !matches!(command, Some(Command::Close { silent: true })) {
                            self.registry.dispatch(&Event::Close(CloseEvent::normal()));
                        }

                        return ControlFlow::Break(());
                    }
                }
            }
        }

        let close = close_frame.map_or_else(CloseEvent::abnormal, CloseEvent::from);
        info!(url = %self.url, code = close.code, "Connection to ws dropped");
        self.registry.dispatch(&Event::Close(close));

        ControlFlow::Continue(())
    }

    fn receive(&self, msg: Message) {
        if !matches!(msg, Message::Text(_) | Message::Binary(_)) {
            return;
        }

        let data = if self.registry.lock().is_bound(EventKind::Data) {
            parse_data(&msg)
        } else {
            None
        };

        self.registry.dispatch(&Event::Message(msg));

        if let Some(data) = data {
            self.registry.dispatch(&Event::Data(data));
        }
    }

    /// Sleep before reconnecting, unless the socket is closed first.
    async fn wait(&mut self, delay: Duration) -> ControlFlow<()> {
        let sleep = time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            select! {
                () = &mut sleep => return ControlFlow::Continue(()),
                command = self.commands.recv() => match command {
                    Some(Command::Send(msg)) => self.pending.push_back(msg),
                    Some(Command::Close { .. }) | None => return ControlFlow::Break(()),
                }
            }
        }
    }
}

fn parse_data(msg: &Message) -> Option<Value> {
    let parsed = match msg {
        Message::Text(text) => serde_json::from_str(text.as_str()),
        Message::Binary(bytes) => serde_json::from_slice(bytes),
        _ => return None,
    };

    match parsed {
        Ok(data) => Some(data),
        Err(e) => {
            warn!(error = %e, "Couldn't parse ws message as JSON");
            None
        }
    }
}
