use std::{collections::BTreeMap, marker::PhantomData};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::{
    options::{RequestOptions, ServiceOptions},
    url, DataTypes, Error, HttpClient, Method, Request, RequestBody, Response, ResponseBody,
    CONTENT_TYPE,
};

/// A service that can be read with `GET`.
pub trait GetEndpoint {
    type Params: Serialize;
    type Response: DeserializeOwned;
}

/// A service that accepts `POST`.
pub trait PostEndpoint {
    type Body: Serialize;
    type Response: DeserializeOwned;
}

/// A service that accepts `PUT`.
pub trait PutEndpoint {
    type Body: Serialize;
    type Response: DeserializeOwned;
}

/// A service that accepts `DELETE`.
pub trait DeleteEndpoint {
    type Body: Serialize;
    type Response: DeserializeOwned;
}

/// A service with no declared shape. Every verb exchanges JSON values.
pub enum Untyped {}

impl GetEndpoint for Untyped {
    type Params = Value;
    type Response = Value;
}

impl PostEndpoint for Untyped {
    type Body = Value;
    type Response = Value;
}

impl PutEndpoint for Untyped {
    type Body = Value;
    type Response = Value;
}

impl DeleteEndpoint for Untyped {
    type Body = Value;
    type Response = Value;
}

/// A client for one resource.
///
/// `S` declares which verbs the resource supports through [`GetEndpoint`],
/// [`PostEndpoint`], [`PutEndpoint`] and [`DeleteEndpoint`].
///
/// Services are immutable. [`path`](Self::path), [`headers`](Self::headers)
/// and the other configuration methods return a new service.
pub struct ApiService<S, C> {
    client: C,
    url: String,
    options: ServiceOptions,
    request_options: RequestOptions,
    service: PhantomData<fn() -> S>,
}

impl<S, C: Clone> Clone for ApiService<S, C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            url: self.url.clone(),
            options: self.options.clone(),
            request_options: self.request_options.clone(),
            service: PhantomData,
        }
    }
}

impl<S, C: HttpClient> ApiService<S, C> {
    pub fn new(
        client: C,
        url: impl Into<String>,
        options: ServiceOptions,
        request_options: RequestOptions,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            options,
            request_options,
            service: PhantomData,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    pub fn request_options(&self) -> &RequestOptions {
        &self.request_options
    }

    pub fn path(&self, path: impl AsRef<str>) -> Self {
        Self {
            url: url::join(&self.url, path.as_ref()),
            ..self.clone()
        }
    }

    /// Like [`path`](Self::path), joining each segment in turn.
    pub fn path_segments<I, P>(&self, segments: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        Self {
            url: url::join_all(&self.url, segments),
            ..self.clone()
        }
    }

    pub fn data_types(&self, data_types: DataTypes) -> Self {
        Self {
            options: self.options.clone().data_types(data_types),
            ..self.clone()
        }
    }

    pub fn response_headers<I, N>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            options: self.options.clone().response_headers(names),
            ..self.clone()
        }
    }

    /// Add headers to every request. Existing headers with the same name, in
    /// any case, are replaced.
    pub fn headers<I, K, V>(&self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut request_options = self.request_options.clone();

        for (name, value) in headers {
            request_options.set_header(name.into(), value.into());
        }

        Self {
            request_options,
            ..self.clone()
        }
    }

    /// The same resource, described by another endpoint type.
    pub fn typed<S2>(&self) -> ApiService<S2, C> {
        ApiService {
            client: self.client.clone(),
            url: self.url.clone(),
            options: self.options.clone(),
            request_options: self.request_options.clone(),
            service: PhantomData,
        }
    }

    /// Send a request and return the checked, but untransformed, result.
    ///
    /// Any error is passed to the `on_error` hook before it's returned.
    pub async fn request<P, B>(
        &self,
        method: Method,
        params: &P,
        body: Option<&B>,
    ) -> Result<Value, Error>
    where
        P: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let result = self.dispatch(method, params, body).await;

        if let Err(e) = &result {
            if let Some(on_error) = &self.options.on_error {
                on_error(e);
            }
        }

        result
    }

    async fn dispatch<P, B>(
        &self,
        method: Method,
        params: &P,
        body: Option<&B>,
    ) -> Result<Value, Error>
    where
        P: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let data_types = self.options.resolved_data_types();
        let url = url::with_query(&self.url, &url::encode_query(params)?);
        let mut request = Request::new(method, url.clone());
        request.headers = self.request_options.headers.clone();
        request.timeout = self.request_options.timeout;

        if method.has_body() {
            if let Some(body) = body {
                let body = RequestBody::encode(data_types.request, body)?;

                if matches!(body, RequestBody::Json(_)) && request.header(CONTENT_TYPE).is_none() {
                    request
                        .headers
                        .insert(CONTENT_TYPE.to_owned(), body.mime_type().as_str().to_owned());
                }

                request.body = Some(body);
            }
        }

        self.log(method, &url);
        let response = self.client.send(request).await?;

        if response.status_class().is_client_error() {
            return Err(Error::Client(response.status));
        }

        match ResponseBody::parse(data_types.response, &response.body) {
            Ok(body) => {
                if let Some(on_success) = &self.options.on_success {
                    on_success(&url, &response, &body);
                }

                check_response(&url, &response, Some(&body))?;

                Ok(self.with_response_headers(body.into_value(), &response))
            }
            Err(reason) => {
                check_response(&url, &response, None)?;

                if method == Method::Get {
                    error!(%url, %reason, "Exception on parsing data fetched");
                    Err(Error::ParseResponse { url, reason })
                } else {
                    debug!(%method, %url, %reason, "No usable response body");
                    Ok(Value::Null)
                }
            }
        }
    }

    async fn call<R, P, B>(&self, method: Method, params: &P, body: Option<&B>) -> Result<R, Error>
    where
        R: DeserializeOwned,
        P: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let value = self.request(method, params, body).await?;
        let value = match &self.options.transform_response {
            Some(transform) => transform(value),
            None => value,
        };

        serde_json::from_value(value).map_err(Error::deserialize_result)
    }

    fn with_response_headers(&self, data: Value, response: &Response) -> Value {
        let Some(names) = &self.options.response_headers else { return data };

        let headers: Map<String, Value> = names
            .iter()
            .map(|name| {
                let value = response
                    .header(name)
                    .map_or(Value::Null, |value| Value::String(value.to_owned()));
                (name.clone(), value)
            })
            .collect();

        let mut reply = Map::new();
        reply.insert("data".to_owned(), data);
        reply.insert("headers".to_owned(), Value::Object(headers));
        Value::Object(reply)
    }

    fn log(&self, method: Method, url: &str) {
        debug!(%method, url, "Sending request");

        if let Some(log_function) = &self.options.log_function {
            log_function(&format!("{method} {url}"));
        }
    }
}

fn check_response(url: &str, response: &Response, body: Option<&ResponseBody>) -> Result<(), Error> {
    if response.status_class().is_server_error() {
        return Err(Error::Server(response.status));
    }

    if let Some(errors) = body.and_then(ResponseBody::errors) {
        for e in &errors {
            error!(url, error = e.as_str(), "Error in response body");
        }

        return Err(Error::ResponseErrors(errors));
    }

    Ok(())
}

impl<S: GetEndpoint, C: HttpClient> ApiService<S, C> {
    pub async fn get(&self, params: &S::Params) -> Result<S::Response, Error> {
        self.call(Method::Get, params, None::<&()>).await
    }
}

impl<S: PostEndpoint, C: HttpClient> ApiService<S, C> {
    pub async fn post<P>(&self, body: &S::Body, params: &P) -> Result<S::Response, Error>
    where
        P: Serialize + ?Sized,
    {
        self.call(Method::Post, params, Some(body)).await
    }
}

impl<S: PutEndpoint, C: HttpClient> ApiService<S, C> {
    pub async fn put<P>(&self, body: &S::Body, params: &P) -> Result<S::Response, Error>
    where
        P: Serialize + ?Sized,
    {
        self.call(Method::Put, params, Some(body)).await
    }
}

impl<S: DeleteEndpoint, C: HttpClient> ApiService<S, C> {
    pub async fn delete<P>(&self, body: &S::Body, params: &P) -> Result<S::Response, Error>
    where
        P: Serialize + ?Sized,
    {
        self.call(Method::Delete, params, Some(body)).await
    }
}

/// The shape of a response when [`ServiceOptions::response_headers`] is set.
///
/// Use it as an endpoint's response type, with `T` as the body type.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WithHeaders<T> {
    pub data: T,
    pub headers: BTreeMap<String, Option<String>>,
}
