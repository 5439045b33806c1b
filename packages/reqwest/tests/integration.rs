use api_service::{
    ApiServiceFactory, DataTypes, Error, GetEndpoint, PostEndpoint, RequestDataType,
    ResponseDataType, Untyped, WithHeaders,
};
use api_service_reqwest::Connection;
use api_service_test::{server::end_to_end_test, Echo, Question, QuestionQuery};
use serde::Serialize;
use serde_json::{json, Value};

#[tokio::test]
async fn typed_get() {
    end_to_end_test(|port| async move {
        let questions = factory(port).create::<Questions>("questions");

        let question = questions.get(&QuestionQuery { id: 22 }).await.unwrap();

        assert_eq!(
            question,
            Question {
                id: 22,
                text: "Question 22".to_owned()
            }
        );
    })
    .await
}

#[tokio::test]
async fn json_post() {
    end_to_end_test(|port| async move {
        let questions = factory(port).create::<Questions>("questions");

        let echo = questions
            .post(&NewQuestion { id: 22 }, &[("draft", "true")])
            .await
            .unwrap();

        assert_eq!(echo.method, "POST");
        assert_eq!(echo.content_type.as_deref(), Some("application/json"));
        assert_eq!(echo.body, r#"{"id":22}"#);
        assert_eq!(echo.params["draft"], "true");
    })
    .await
}

#[tokio::test]
async fn form_data_put() {
    end_to_end_test(|port| async move {
        let questions = factory(port)
            .create::<Untyped>("questions")
            .data_types(DataTypes::default().request(RequestDataType::FormData));

        let echo: Echo = serde_json::from_value(
            questions
                .put(&json!({"tags": ["first", "second"]}), &())
                .await
                .unwrap(),
        )
        .unwrap();

        assert_eq!(echo.method, "PUT");
        assert!(echo
            .content_type
            .unwrap()
            .starts_with("multipart/form-data"));
        assert!(echo.body.contains("name=\"tags\""));
        assert!(echo.body.contains("first"));
        assert!(echo.body.contains("second"));
    })
    .await
}

#[tokio::test]
async fn client_error() {
    end_to_end_test(|port| async move {
        let status = factory(port).create::<Untyped>("status/404");

        assert_eq!(status.get(&json!({})).await, Err(Error::Client(404)));
    })
    .await
}

#[tokio::test]
async fn server_error() {
    end_to_end_test(|port| async move {
        let status = factory(port).create::<Untyped>("status").path("502");

        assert_eq!(
            status.delete(&json!({}), &()).await,
            Err(Error::Server(502))
        );
    })
    .await
}

#[tokio::test]
async fn errors_in_body() {
    end_to_end_test(|port| async move {
        let errors = factory(port).create::<Untyped>("errors");

        assert!(matches!(
            errors.get(&json!({})).await,
            Err(Error::ResponseErrors(errors)) if errors.len() == 2
        ));
    })
    .await
}

#[tokio::test]
async fn text_response() {
    end_to_end_test(|port| async move {
        let text = factory(port)
            .create::<Untyped>("text")
            .data_types(DataTypes::default().response(ResponseDataType::Text));

        assert_eq!(text.get(&json!({})).await, Ok(json!("plain text")));
    })
    .await
}

#[tokio::test]
async fn empty_post_response() {
    end_to_end_test(|port| async move {
        let empty = factory(port).create::<Untyped>("empty");

        assert_eq!(empty.post(&json!({}), &()).await, Ok(Value::Null));
    })
    .await
}

#[tokio::test]
async fn response_headers() {
    end_to_end_test(|port| async move {
        let questions = factory(port)
            .create::<Untyped>("questions")
            .response_headers(["X-Total-Count"])
            .typed::<CountedQuestions>();

        let reply = questions.get(&QuestionQuery { id: 1 }).await.unwrap();

        assert_eq!(reply.data.id, 1);
        assert_eq!(reply.headers["X-Total-Count"].as_deref(), Some("1"));
    })
    .await
}

#[tokio::test]
async fn connection_refused() {
    let service = ApiServiceFactory::new(Connection::default(), "http://127.0.0.1:1/api")
        .create::<Untyped>("questions");

    assert!(matches!(
        service.get(&json!({})).await,
        Err(Error::Send(_))
    ));
}

#[derive(Serialize)]
struct NewQuestion {
    id: u32,
}

enum Questions {}

impl GetEndpoint for Questions {
    type Params = QuestionQuery;
    type Response = Question;
}

impl PostEndpoint for Questions {
    type Body = NewQuestion;
    type Response = Echo;
}

enum CountedQuestions {}

impl GetEndpoint for CountedQuestions {
    type Params = QuestionQuery;
    type Response = WithHeaders<Question>;
}

fn factory(port: u16) -> ApiServiceFactory<Connection> {
    ApiServiceFactory::new(Connection::default(), format!("http://127.0.0.1:{port}/api"))
}
