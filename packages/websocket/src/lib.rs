//! Reconnecting WebSocket services.
//!
//! A [`WebsocketService`] knows its URL and connection params, keeps a
//! registry of event callbacks and, once [opened](WebsocketService::open),
//! drives a socket that reconnects whenever the connection drops.
//! [`WebsocketServiceFactory`] creates services below a common API URL.
//!
//! # Example
//!
//! ```no_run
//! use api_service_websocket::{callback, Event, EventKind, WebsocketServiceFactory};
//!
//! # async fn example() -> Result<(), api_service_websocket::Error> {
//! let factory = WebsocketServiceFactory::new("ws://127.0.0.1:9090");
//! let mut feed = factory.create("feed")?;
//!
//! feed.on(
//!     EventKind::Data,
//!     callback(|event| {
//!         if let Event::Data(data) = event {
//!             println!("{data}");
//!         }
//!     }),
//! )?;
//! feed.open()?;
//! # Ok(())
//! # }
//! ```
use std::fmt::Display;

use thiserror::Error;

mod event;
mod factory;
mod params;
mod registry;
mod service;
mod socket;
mod stream;

pub use event::{callback, Callback, CloseEvent, Event, EventKind};
pub use factory::{Middleware, ParamsFn, WebsocketServiceFactory};
pub use params::{Params, ParamsSource};
pub use registry::CallbackId;
pub use service::WebsocketService;
pub use socket::SocketOptions;
pub use stream::EventStream;
#[doc(inline)]
pub use tokio_tungstenite::tungstenite::Message;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("No such event: {0}")]
    UnknownEvent(String),
    #[error("Callback is already bound to '{0}'")]
    DuplicateCallback(EventKind),
    #[error("You can not change API url")]
    ApiUrlAlreadySet,
    #[error("No API url has been set")]
    MissingApiUrl,
    #[error("No websocket has been opened")]
    NotOpen,
    #[error("Couldn't encode connection params: {0}")]
    EncodeParams(String),
    #[error("Couldn't serialize message: {0}")]
    Serialize(String),
}

impl Error {
    fn serialize(e: impl Display) -> Self {
        Self::Serialize(e.to_string())
    }
}

impl From<api_service::Error> for Error {
    fn from(e: api_service::Error) -> Self {
        Self::EncodeParams(e.to_string())
    }
}
