use std::{
    fmt::{self, Display},
    str::FromStr,
    sync::Arc,
};

use serde_json::Value;
use tokio_tungstenite::tungstenite::{protocol::CloseFrame, Message};

use crate::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Open,
    /// Incoming messages, parsed as JSON.
    Data,
    /// Incoming messages, as received.
    Message,
    Error,
    Close,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Data => "data",
            Self::Message => "message",
            Self::Error => "error",
            Self::Close => "close",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Open,
            Self::Data,
            Self::Message,
            Self::Error,
            Self::Close,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == s)
        .ok_or_else(|| Error::UnknownEvent(s.to_owned()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Open,
    Data(Value),
    Message(Message),
    Error(String),
    Close(CloseEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Open => EventKind::Open,
            Self::Data(_) => EventKind::Data,
            Self::Message(_) => EventKind::Message,
            Self::Error(_) => EventKind::Error,
            Self::Close(_) => EventKind::Close,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloseEvent {
    pub code: u16,
    pub reason: String,
}

impl CloseEvent {
    pub const NORMAL: u16 = 1000;
    pub const ABNORMAL: u16 = 1006;

    pub fn normal() -> Self {
        Self {
            code: Self::NORMAL,
            reason: String::new(),
        }
    }

    /// The connection went away without a close frame.
    pub fn abnormal() -> Self {
        Self {
            code: Self::ABNORMAL,
            reason: String::new(),
        }
    }
}

impl From<CloseFrame> for CloseEvent {
    fn from(frame: CloseFrame) -> Self {
        Self {
            code: frame.code.into(),
            reason: frame.reason.as_str().to_owned(),
        }
    }
}

/// An event handler. Handlers are compared by pointer, so keep the `Arc`
/// around to recognise it later.
pub type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

pub fn callback(f: impl Fn(&Event) + Send + Sync + 'static) -> Callback {
    Arc::new(f)
}
