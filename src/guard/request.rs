//! Request metadata handed to the pipeline.

use std::net::IpAddr;

use axum::http::Method;

/// What the pipeline needs to know about the inbound request.
///
/// Built by the transport layer; the pipeline never touches the request
/// itself.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    /// Route identifier, or `None` when routing found nothing.
    pub route: Option<String>,
    pub method: Method,
    pub client_address: Option<IpAddr>,
    /// Query/form parameters in arrival order.
    pub parameters: Vec<(String, String)>,
}

impl RequestMeta {
    pub fn new(route: Option<String>, method: Method) -> Self {
        Self {
            route,
            method,
            client_address: None,
            parameters: Vec::new(),
        }
    }

    pub fn with_client_address(mut self, address: IpAddr) -> Self {
        self.client_address = Some(address);
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<(String, String)>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Parameters as `application/x-www-form-urlencoded`.
    pub fn serialized_parameters(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.parameters.iter())
            .finish()
    }
}
