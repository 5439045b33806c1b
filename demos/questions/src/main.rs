//! Talks to the dev server in `api-service-test`. Start it with
//! `cargo run -p api-service-test` first, or point `API_BASE_URL` somewhere
//! else.
use std::env;

use api_service::{ApiServiceFactory, GetEndpoint, PostEndpoint, ServiceOptions};
use api_service_reqwest::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Serialize)]
struct QuestionQuery {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct Question {
    id: u32,
    text: String,
}

#[derive(Serialize)]
struct NewQuestion {
    id: u32,
    data: Value,
}

enum Questions {}

impl GetEndpoint for Questions {
    type Params = QuestionQuery;
    type Response = Question;
}

impl PostEndpoint for Questions {
    type Body = NewQuestion;
    type Response = Value;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let base_url =
        env::var("API_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:9090/api".to_owned());
    let factory = ApiServiceFactory::new(Connection::default(), base_url).options(
        ServiceOptions::new()
            .log_function(|message| tracing::info!("{message}"))
            .on_error(|e| tracing::error!("{e}")),
    );
    let questions = factory.create::<Questions>("questions");

    let question = questions.get(&QuestionQuery { id: 22 }).await?;
    println!("Question {}: {}", question.id, question.text);

    let created = questions
        .post(
            &NewQuestion {
                id: 22,
                data: json!({ "value": "What?" }),
            },
            &(),
        )
        .await?;
    println!("Created: {created}");

    Ok(())
}
