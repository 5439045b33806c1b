//! Hooks and per-request settings shared between a factory and its services.
use std::{collections::BTreeMap, sync::Arc, time::Duration};

use serde_json::Value;

use crate::{DataTypes, Error, Response, ResponseBody};

pub type OnSuccess = Arc<dyn Fn(&str, &Response, &ResponseBody) + Send + Sync>;
pub type OnError = Arc<dyn Fn(&Error) + Send + Sync>;
pub type TransformResponse = Arc<dyn Fn(Value) -> Value + Send + Sync>;
pub type LogFunction = Arc<dyn Fn(&str) + Send + Sync>;

/// Response shaping and hooks.
///
/// Every setting is optional, so options from a factory and from a single
/// service can be layered with [`ServiceOptions::merged`].
#[derive(Clone, Default)]
pub struct ServiceOptions {
    pub(crate) data_types: Option<DataTypes>,
    pub(crate) response_headers: Option<Vec<String>>,
    pub(crate) on_success: Option<OnSuccess>,
    pub(crate) on_error: Option<OnError>,
    pub(crate) transform_response: Option<TransformResponse>,
    pub(crate) log_function: Option<LogFunction>,
}

impl ServiceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_types(mut self, data_types: DataTypes) -> Self {
        self.data_types = Some(data_types);
        self
    }

    /// Return `{"data": .., "headers": {..}}` with these response headers
    /// instead of the bare body.
    pub fn response_headers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.response_headers = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Called with the URL, the raw response and the parsed body, before the
    /// response is checked for server errors.
    pub fn on_success(
        mut self,
        f: impl Fn(&str, &Response, &ResponseBody) + Send + Sync + 'static,
    ) -> Self {
        self.on_success = Some(Arc::new(f));
        self
    }

    /// Called with every error before it's returned.
    pub fn on_error(mut self, f: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn transform_response(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.transform_response = Some(Arc::new(f));
        self
    }

    /// Receives `"{METHOD} {url}"` for each request.
    pub fn log_function(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.log_function = Some(Arc::new(f));
        self
    }

    /// Layer `overrides` on top of `self`. Settings present in `overrides` win.
    pub fn merged(&self, overrides: &Self) -> Self {
        Self {
            data_types: overrides.data_types.or(self.data_types),
            response_headers: overrides
                .response_headers
                .clone()
                .or_else(|| self.response_headers.clone()),
            on_success: overrides.on_success.clone().or_else(|| self.on_success.clone()),
            on_error: overrides.on_error.clone().or_else(|| self.on_error.clone()),
            transform_response: overrides
                .transform_response
                .clone()
                .or_else(|| self.transform_response.clone()),
            log_function: overrides
                .log_function
                .clone()
                .or_else(|| self.log_function.clone()),
        }
    }

    pub(crate) fn resolved_data_types(&self) -> DataTypes {
        self.data_types.unwrap_or_default()
    }
}

/// Settings applied to the outgoing request itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub headers: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any with the same name in another case.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name.into(), value.into());
        self
    }

    pub(crate) fn set_header(&mut self, name: String, value: String) {
        self.headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value);
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Headers are merged by name, ignoring case, with `overrides` winning.
    pub fn merged(&self, overrides: &Self) -> Self {
        let mut merged = self.clone();

        for (name, value) in &overrides.headers {
            merged.set_header(name.clone(), value.clone());
        }

        merged.timeout = overrides.timeout.or(self.timeout);
        merged
    }
}
