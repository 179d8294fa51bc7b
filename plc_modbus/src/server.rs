//! Modbus/TCP listener and mirror refresh task.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_modbus::server::tcp::{Server, accept_tcp_connection};
use tracing::{debug, error, info, warn};

use crate::error::ServerError;
use crate::service::PlcService;
use crate::store::{MirroredStore, RegisterStore};

/// Bound, not yet serving, Modbus/TCP server.
pub struct ModbusServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    store: Arc<dyn RegisterStore>,
}

impl ModbusServer {
    /// Bind the listening socket.
    ///
    /// Binding happens here, not in [`ModbusServer::serve`], so startup can
    /// abort before anything else is spawned.
    pub async fn bind(
        addr: SocketAddr,
        store: Arc<dyn RegisterStore>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;
        info!(
            "Modbus/TCP listening on {} (backing={:?})",
            local_addr,
            store.backing()
        );
        Ok(Self {
            listener,
            local_addr,
            store,
        })
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until the task is dropped or the listener fails.
    ///
    /// Each connection runs in its own task; a failing connection is logged
    /// and affects nobody else.
    pub async fn serve(self) -> Result<(), ServerError> {
        let store = self.store;
        let server = Server::new(self.listener);

        let on_connected = move |stream: TcpStream, socket_addr: SocketAddr| {
            let store = Arc::clone(&store);
            async move {
                accept_tcp_connection(stream, socket_addr, move |peer| {
                    debug!("Modbus client connected: {peer}");
                    Ok(Some(PlcService::new(Arc::clone(&store))))
                })
            }
        };
        let on_process_error = |err: io::Error| {
            warn!("Modbus connection error: {err}");
        };

        server.serve(&on_connected, on_process_error).await?;
        info!("Modbus/TCP server stopped");
        Ok(())
    }
}

impl std::fmt::Debug for ModbusServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModbusServer")
            .field("local_addr", &self.local_addr)
            .field("backing", &self.store.backing())
            .finish()
    }
}

/// Refresh a mirrored store from the live image every `period`.
pub fn spawn_mirror_task(store: Arc<MirroredStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut failures: u64 = 0;
        loop {
            ticker.tick().await;
            if let Err(e) = store.sync() {
                failures += 1;
                if failures <= 10 || failures % 1000 == 0 {
                    error!("Modbus mirror sync #{failures} failed: {e}");
                }
            }
        }
    })
}
