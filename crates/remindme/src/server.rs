//! The scheduling process: accept loop, engine task and lifecycle.

use std::{future::Future, sync::Arc, time::Duration};

use remindme_core::{descriptor, RemindmeConfig};
use remindme_scheduler::{DeliverySink, Scheduler};
use tokio::{net::UnixStream, sync::watch};
use tracing::{debug, error, info, warn};

use crate::{
    channel::{self, ChannelListener},
    error::ServerError,
    notify,
    pidfile::{self, PidFile},
};

pub struct Server {
    config: RemindmeConfig,
    scheduler: Arc<Scheduler>,
    listener: ChannelListener,
}

impl Server {
    /// Bind the submission channel and build the engine around `sink`.
    pub fn bind(config: RemindmeConfig, sink: Arc<dyn DeliverySink>) -> Result<Self, ServerError> {
        let listener = ChannelListener::bind(&config.channel.socket_path)?;
        let scheduler = Arc::new(Scheduler::new(
            sink,
            Duration::from_millis(config.scheduler.tick_interval_ms),
        ));
        Ok(Self {
            config,
            scheduler,
            listener,
        })
    }

    pub fn scheduler(&self) -> Arc<Scheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Accept submissions one at a time until `shutdown` resolves.
    ///
    /// Only an accept failure ends the loop with an error; bad submissions are
    /// logged and dropped.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let engine = Arc::clone(&self.scheduler);
        let mut engine_task = tokio::spawn(async move { engine.run(shutdown_rx).await });

        info!("accepting connections");
        tokio::pin!(shutdown);
        let result = loop {
            tokio::select! {
                _ = &mut shutdown => break Ok(()),
                // The engine only returns on shutdown; anything earlier is a fault.
                joined = &mut engine_task => {
                    let reason = match joined {
                        Ok(()) => "evaluation loop exited".to_string(),
                        Err(e) => e.to_string(),
                    };
                    return Err(ServerError::EngineStopped(reason));
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(stream) => self.handle(stream).await,
                    Err(e) => break Err(ServerError::Accept(e)),
                },
            }
        };

        let _ = shutdown_tx.send(true);
        if let Err(e) = engine_task.await {
            error!("scheduler engine task failed: {e}");
        }
        result
    }

    async fn handle(&self, stream: UnixStream) {
        let channel = &self.config.channel;
        let payload = match channel::read_payload(
            stream,
            channel.max_payload_bytes,
            Duration::from_millis(channel.read_timeout_ms),
        )
        .await
        {
            Ok(payload) => payload,
            Err(e) => {
                warn!(code = e.code(), "dropping submission: {e}");
                return;
            }
        };
        // Liveness checks from a starting instance connect and close.
        if payload.is_empty() {
            debug!("connection closed without a payload");
            return;
        }

        let descriptor = match descriptor::parse(&payload) {
            Ok(d) => d,
            Err(e) => {
                warn!(code = "PARSE_ERROR", "rejected descriptor: {e}");
                return;
            }
        };

        if let Err(e) = self.scheduler.register(&descriptor) {
            warn!(kind = descriptor.when().kind(), "cannot schedule reminder: {e}");
        }
    }
}

/// Run the scheduling process until SIGINT or SIGTERM.
pub async fn serve(config: RemindmeConfig) -> Result<(), ServerError> {
    let pid_file = PidFile::acquire(
        &config.channel.pid_path,
        &config.channel.socket_path,
        pidfile::STOP_WAIT,
    )
    .await?;
    info!(pid = std::process::id(), path = %pid_file.path().display(), "pid file acquired");

    let sink = notify::sink_for(&config.notify);
    info!(sink = sink.name(), "delivery sink ready");

    let server = Server::bind(config, sink)?;
    server.run(shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for SIGINT: {e}");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
