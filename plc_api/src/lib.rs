//! # PLC Supervisory Interface
//!
//! Operator-facing access to the process image: a consistent state view, the
//! set/toggle actions, an HTTP router and a WebSocket push channel.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use plc_api::{Supervisor, build_router};
//! use plc_common::image::ProcessImage;
//!
//! let supervisor = Arc::new(Supervisor::new(
//!     Arc::new(ProcessImage::default()),
//!     Duration::from_millis(100),
//!     8,
//! ));
//! let router = build_router(Arc::clone(&supervisor));
//! # let _ = router;
//! ```

pub mod action;
pub mod error;
pub mod push;
pub mod routes;
pub mod supervisor;
pub mod view;

pub use action::{ActionRequest, ActionResponse, ActionType};
pub use error::SupervisorError;
pub use push::{ActionPayload, ClientMessage, PushEvent, spawn_state_broadcaster};
pub use routes::build_router;
pub use supervisor::Supervisor;
pub use view::PlcStateView;
