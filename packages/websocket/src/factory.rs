use std::sync::Arc;

use api_service::url;
use serde_json::Value;

use crate::{Error, Params, ParamsSource, SocketOptions, WebsocketService};

/// Produces a value passed to the params function each time it runs.
pub type Middleware = Arc<dyn Fn() -> Value + Send + Sync>;

/// Builds params from the middleware values, in the order the middleware
/// was applied.
pub type ParamsFn = Arc<dyn Fn(&[Value]) -> Params + Send + Sync>;

/// Creates [`WebsocketService`]s below a common API URL.
///
/// The API URL can be given later with [`set_api_url`](Self::set_api_url),
/// but only once.
#[derive(Clone, Default)]
pub struct WebsocketServiceFactory {
    api_url: Option<String>,
    options: SocketOptions,
    params: Option<ParamsFn>,
    middleware: Vec<Middleware>,
}

impl WebsocketServiceFactory {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: Some(api_url.into()),
            ..Self::default()
        }
    }

    /// A factory without an API URL yet.
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn set_api_url(&mut self, api_url: impl Into<String>) -> Result<&mut Self, Error> {
        if self.api_url.is_some() {
            return Err(Error::ApiUrlAlreadySet);
        }

        self.api_url = Some(api_url.into());
        Ok(self)
    }

    pub fn api_url(&self) -> Option<&str> {
        self.api_url.as_deref()
    }

    pub fn options(mut self, options: SocketOptions) -> Self {
        self.options = options;
        self
    }

    /// Compute connection params for every service, each time one connects.
    pub fn params_fn(mut self, f: impl Fn(&[Value]) -> Params + Send + Sync + 'static) -> Self {
        self.params = Some(Arc::new(f));
        self
    }

    /// Services created after this call see the middleware's value.
    pub fn apply_middleware(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.middleware.push(Arc::new(f));
        self
    }

    pub fn create(&self, path: &str) -> Result<WebsocketService, Error> {
        self.create_with(path, None, None)
    }

    /// Like [`create`](Self::create), with `options` or `params` replacing
    /// the factory's.
    pub fn create_with(
        &self,
        path: &str,
        options: Option<SocketOptions>,
        params: Option<ParamsSource>,
    ) -> Result<WebsocketService, Error> {
        let api_url = self.api_url.as_deref().ok_or(Error::MissingApiUrl)?;
        let service = WebsocketService::new(url::join(api_url, path))
            .options(options.unwrap_or_else(|| self.options.clone()));

        Ok(match params.or_else(|| self.params_source()) {
            Some(params) => service.params_source(params),
            None => service,
        })
    }

    fn params_source(&self) -> Option<ParamsSource> {
        let params = self.params.clone()?;
        let middleware = self.middleware.clone();

        Some(ParamsSource::dynamic(move || {
            let values: Vec<Value> = middleware.iter().map(|f| f()).collect();
            params(&values)
        }))
    }
}
