use crate::{url, ApiService, HttpClient, RequestOptions, ServiceOptions};

/// Creates [`ApiService`]s below a common base URL, sharing a client and
/// default options.
///
/// ```
/// # use api_service::{ApiServiceFactory, HttpClient, ServiceOptions, Untyped};
/// # fn example<C: HttpClient>(client: C) {
/// let factory = ApiServiceFactory::new(client, "https://example.com/api")
///     .options(ServiceOptions::new().log_function(|message| println!("{message}")));
/// let questions = factory.create::<Untyped>("questions");
///
/// assert_eq!(questions.url(), "https://example.com/api/questions");
/// # }
/// ```
#[derive(Clone)]
pub struct ApiServiceFactory<C> {
    client: C,
    base_url: String,
    options: ServiceOptions,
    request_options: RequestOptions,
}

impl<C: HttpClient> ApiServiceFactory<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            options: ServiceOptions::default(),
            request_options: RequestOptions::default(),
        }
    }

    pub fn options(mut self, options: ServiceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn request_options(mut self, request_options: RequestOptions) -> Self {
        self.request_options = request_options;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn create<S>(&self, path: &str) -> ApiService<S, C> {
        ApiService::new(
            self.client.clone(),
            url::join(&self.base_url, path),
            self.options.clone(),
            self.request_options.clone(),
        )
    }

    /// Like [`create`](Self::create), with `options` and `request_options`
    /// layered over the factory's own.
    pub fn create_with<S>(
        &self,
        path: &str,
        options: &ServiceOptions,
        request_options: &RequestOptions,
    ) -> ApiService<S, C> {
        ApiService::new(
            self.client.clone(),
            url::join(&self.base_url, path),
            self.options.merged(options),
            self.request_options.merged(request_options),
        )
    }
}
