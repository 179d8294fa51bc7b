//! # PLC Modbus/TCP Server
//!
//! Serves the four banks of the process image over Modbus/TCP. Wire framing
//! is handled by `tokio-modbus`; this crate validates requests and applies
//! them to a [`RegisterStore`](store::RegisterStore).
//!
//! | Function | Bank |
//! |----------|------|
//! | 0x01 / 0x05 / 0x0F | coils (`BinaryOutputs`) |
//! | 0x02 | discrete inputs (`BinaryInputs`) |
//! | 0x03 / 0x06 / 0x10 / 0x16 / 0x17 | holding registers (`IntegerOutputs`) |
//! | 0x04 | input registers (`IntegerInputs`) |

pub mod error;
pub mod request;
pub mod server;
pub mod service;
pub mod store;

pub use error::ServerError;
pub use server::{ModbusServer, spawn_mirror_task};
pub use service::PlcService;
pub use store::{DirectStore, MirroredStore, RegisterStore, build_store};
