use api_service::url;
use serde::Serialize;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use crate::{
    registry::SharedRegistry, socket::Socket, Callback, CallbackId, Error, EventKind,
    EventStream, Params, ParamsSource, SocketOptions,
};

/// A WebSocket endpoint with connection params and event callbacks.
///
/// Callbacks can be bound before or after [`open`](Self::open). They stay
/// bound across reconnects.
pub struct WebsocketService {
    url: String,
    protocols: Vec<String>,
    options: SocketOptions,
    params: ParamsSource,
    registry: SharedRegistry,
    socket: Option<Socket>,
}

impl WebsocketService {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            protocols: Vec::new(),
            options: SocketOptions::default(),
            params: ParamsSource::default(),
            registry: SharedRegistry::default(),
            socket: None,
        }
    }

    /// Subprotocols to request, in order of preference.
    pub fn protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    pub fn options(mut self, options: SocketOptions) -> Self {
        self.options = options;
        self
    }

    pub fn params_source(mut self, params: ParamsSource) -> Self {
        self.params = params;
        self
    }

    pub fn socket_options(&self) -> &SocketOptions {
        &self.options
    }

    /// Bind `callback` to events of `kind`.
    ///
    /// Binding the same callback to the same kind twice is an error.
    pub fn on(&self, kind: EventKind, callback: Callback) -> Result<CallbackId, Error> {
        self.registry.lock().bind(kind, callback)
    }

    /// Returns `false` if `id` wasn't bound.
    pub fn off(&self, id: CallbackId) -> bool {
        self.registry.lock().unbind(id)
    }

    pub fn subscribe(&self, kind: EventKind) -> EventStream {
        EventStream::bind(&self.registry, kind)
    }

    pub fn reset_bound_callbacks(&self) {
        self.registry.lock().clear();
    }

    pub fn params(&self) -> Params {
        self.params.evaluate()
    }

    /// The URL to connect to for `path`, with the current params as a query.
    pub fn url(&self, path: &str) -> Result<String, Error> {
        let query = url::encode_query(&self.params())?;
        Ok(url::with_query(&url::join(&self.url, path), &query))
    }

    /// A new service for `path` below this one, with no callbacks bound.
    pub fn path(&self, path: &str) -> Self {
        Self::new(url::join(&self.url, path))
            .protocols(self.protocols.clone())
            .options(self.options.clone())
            .params_source(self.params.clone())
    }

    /// A new service with `params` added to the current ones, and no
    /// callbacks bound.
    ///
    /// Dynamic params are evaluated now, so the new service's params are
    /// static.
    pub fn with_params(&self, params: Params) -> Self {
        let mut merged = self.params();
        merged.extend(params);

        Self::new(self.url.clone())
            .protocols(self.protocols.clone())
            .options(self.options.clone())
            .params_source(ParamsSource::Static(merged))
    }

    /// Connect, in the background, on the current tokio runtime.
    ///
    /// A socket opened earlier is closed first, without a `Close` event.
    ///
    /// # Panics
    ///
    /// If called outside a tokio runtime.
    pub fn open(&mut self) -> Result<&mut Self, Error> {
        let url = self.url("")?;

        if let Some(previous) = self.socket.take() {
            previous.close_silently();
        }

        info!(%url, "Open connection to ws");
        self.socket = Some(Socket::open(
            url,
            self.protocols.clone(),
            self.options.clone(),
            self.registry.clone(),
        ));

        Ok(self)
    }

    /// Unbind all callbacks, then close the socket.
    pub fn close(&mut self) -> &mut Self {
        if let Some(socket) = self.socket.take() {
            info!(url = %self.url, "Close connection to ws");
            self.reset_bound_callbacks();
            socket.close();
        } else {
            warn!(url = %self.url, "No ws has been opened");
        }

        self
    }

    pub fn is_open(&self) -> bool {
        self.socket.as_ref().is_some_and(Socket::is_running)
    }

    /// Queue `msg` for sending. Messages sent while reconnecting are held
    /// until the connection is back.
    pub fn send(&self, msg: Message) -> Result<(), Error> {
        self.socket.as_ref().ok_or(Error::NotOpen)?.send(msg)
    }

    pub fn send_json<T>(&self, msg: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        let text = serde_json::to_string(msg).map_err(Error::serialize)?;
        self.send(Message::text(text))
    }
}
