use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tracing::{Instrument, info};

use crate::config::Config;
use crate::content::Resolver;
use crate::gemini::connection::{Connection, ServerContext};
use crate::server::tls::load_acceptor;

/// Loads TLS material and the content root, then serves until the
/// listener fails.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let acceptor = load_acceptor(&cfg.tls.cert_path, &cfg.tls.key_path)?;
    let resolver = Resolver::new(&cfg.content_root)?;
    info!(root = ?resolver.root(), "Serving content");

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("Listening on gemini://{}", cfg.listen_addr);

    let mut context = ServerContext::new(resolver, cfg.request_timeout());
    if let Some(host) = &cfg.hostname {
        context = context
            .with_hostname(host)
            .with_port(listener.local_addr()?.port());
    }

    serve(listener, acceptor, Arc::new(context), cfg.max_connections).await
}

/// Accept loop: one task per connection, at most `max_connections` at once.
pub async fn serve(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    context: Arc<ServerContext>,
    max_connections: usize,
) -> anyhow::Result<()> {
    let permits = Arc::new(Semaphore::new(max_connections));

    loop {
        let permit = permits.clone().acquire_owned().await?;
        let (socket, peer) = listener.accept().await?;
        tracing::debug!("Accepted connection from {}", peer);

        let acceptor = acceptor.clone();
        let context = context.clone();
        let span = tracing::info_span!("connection", %peer);

        tokio::spawn(
            async move {
                let _permit = permit;

                let stream = match timeout(context.request_timeout, acceptor.accept(socket)).await {
                    Ok(Ok(stream)) => stream,
                    Ok(Err(e)) => {
                        tracing::debug!(error = %e, "TLS handshake failed");
                        return;
                    }
                    Err(_) => {
                        tracing::debug!("TLS handshake timed out");
                        return;
                    }
                };

                if let Err(e) = Connection::new(stream, context).run().await {
                    tracing::error!("Connection error: {}", e);
                }
            }
            .instrument(span),
        );
    }
}
