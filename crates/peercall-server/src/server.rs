//! The server loop: bind a named endpoint, accept connections, dispatch.

use std::sync::Arc;

use peercall_common::protocol::error::Result;
use peercall_common::protocol::{PeercallError, Request};
use peercall_common::transport::{FrameServer, Resolver, SocketDirResolver};

use crate::dispatch::DispatchTable;

/// A peercall server instance registered under a logical name.
///
/// Connections are independent: each runs in its own task and handlers
/// are invoked on the blocking pool, so a slow handler serving one client
/// never delays responses to another.
pub struct Server {
    name: String,
    resolver: Box<dyn Resolver>,
    table: Arc<DispatchTable>,
}

impl Server {
    /// Creates a server for `name` with the default environment-derived
    /// resolver.
    pub fn new(name: &str, table: DispatchTable) -> Self {
        Self::with_resolver(name, Box::new(SocketDirResolver::from_env()), table)
    }

    pub fn with_resolver(name: &str, resolver: Box<dyn Resolver>, table: DispatchTable) -> Self {
        Server {
            name: name.to_string(),
            resolver,
            table: Arc::new(table),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds the endpoint and serves until the task is dropped or an
    /// accept error occurs.
    pub async fn serve(&self) -> Result<()> {
        let endpoint = self.resolver.bind_endpoint(&self.name)?;
        let server = FrameServer::bind(&endpoint).await?;
        tracing::info!(name = %self.name, endpoint = %endpoint, "listening");

        let table = self.table.clone();
        server
            .run_with_handler(move |request: Request| {
                let table = table.clone();
                async move {
                    // handlers may block (filesystem, environment); keep
                    // them off the reactor threads
                    tokio::task::spawn_blocking(move || table.dispatch(&request))
                        .await
                        .map_err(|e| {
                            PeercallError::Connection(format!("dispatch task failed: {e}"))
                        })
                }
            })
            .await
    }

    /// Blocking wrapper around [`serve`](Self::serve) that owns its own
    /// runtime. Intended for binaries without one.
    pub fn run(&self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.serve())
    }
}
