use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod server;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Question {
    pub id: u32,
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct QuestionQuery {
    pub id: u32,
}

/// What the dev server saw of a request with a body.
#[derive(Serialize, Deserialize, Debug)]
pub struct Echo {
    pub method: String,
    pub content_type: Option<String>,
    pub body: String,
    pub params: BTreeMap<String, String>,
}

pub const PORT: u16 = 9090;
