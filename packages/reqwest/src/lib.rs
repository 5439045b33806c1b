//! Reqwest client for `api-service`.
use api_service::{Error, HttpClient, Method, Request, RequestBody, Response};
use async_trait::async_trait;
use reqwest::{multipart, Client};

#[derive(Clone)]
pub struct Connection {
    client: Client,
}

impl Connection {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

#[async_trait(?Send)]
impl HttpClient for Connection {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match request.body {
            Some(RequestBody::Json(body)) => builder.body(body),
            Some(RequestBody::Form(fields)) => builder.multipart(
                fields
                    .into_iter()
                    .fold(multipart::Form::new(), |form, (name, value)| {
                        form.text(name, value)
                    }),
            ),
            None => builder,
        };

        let result = builder.send().await.map_err(Error::send)?;
        let status = result.status().as_u16();
        let headers = result
            .headers()
            .iter()
            .filter_map(|(name, value)| match value.to_str() {
                Ok(value) => Some((name.as_str().to_owned(), value.to_owned())),
                Err(_) => {
                    tracing::debug!(header = name.as_str(), "Skipping non UTF-8 header");
                    None
                }
            })
            .collect();
        let body = result.bytes().await.map_err(Error::receive)?;

        Ok(Response {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}
