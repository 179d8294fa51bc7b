//! `tokio-modbus` service backed by a [`RegisterStore`].

use std::future;
use std::sync::Arc;

use tokio_modbus::{ExceptionCode, Request, Response};
use tracing::{debug, warn};

use crate::request::Operation;
use crate::store::RegisterStore;

/// Per-connection request handler.
#[derive(Clone)]
pub struct PlcService {
    store: Arc<dyn RegisterStore>,
}

impl PlcService {
    pub fn new(store: Arc<dyn RegisterStore>) -> Self {
        Self { store }
    }

    /// Validate and execute one request.
    pub fn handle(&self, request: &Request<'_>) -> Result<Response, ExceptionCode> {
        let op = Operation::from_request(request).inspect_err(|code| {
            warn!("Rejected Modbus request {request:?}: {code:?}");
        })?;
        let result = op.execute(self.store.as_ref());
        match &result {
            Ok(_) if op.is_write() => debug!("Modbus write applied: {op:?}"),
            Ok(_) => {}
            Err(code) => warn!("Modbus request {op:?} failed: {code:?}"),
        }
        result
    }
}

impl tokio_modbus::server::Service for PlcService {
    type Request = Request<'static>;
    type Response = Response;
    type Exception = ExceptionCode;
    type Future = future::Ready<Result<Self::Response, Self::Exception>>;

    fn call(&self, req: Self::Request) -> Self::Future {
        future::ready(self.handle(&req))
    }
}

impl std::fmt::Debug for PlcService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlcService")
            .field("backing", &self.store.backing())
            .finish()
    }
}
