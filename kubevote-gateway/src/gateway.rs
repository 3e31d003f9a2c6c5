//! The vote gateway server: accept loop plus its two poller tasks (spec
//! §4.5).

use std::sync::Arc;
use std::time::Duration;

use kubevote_crypto::KeyPair;
use kubevote_rc::RcClient;
use kubevote_store::{PendingRewardsStore, VoteDeduplicator};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::notified::NotifiedSet;
use crate::{claim_poller, connection, join_poller};

const ACCEPT_POLL: Duration = Duration::from_secs(1);

/// Owns the listener, the shared RC client and stores, and the
/// cancellation token that coordinates graceful shutdown.
pub struct Gateway {
    listener: TcpListener,
    cancel: CancellationToken,
    keys: Arc<KeyPair>,
    rc: Arc<RcClient>,
    dedup: Arc<VoteDeduplicator>,
    pending: Arc<PendingRewardsStore>,
    notified: Arc<NotifiedSet>,
}

impl Gateway {
    /// Binds the listener, loads or generates the RSA keypair, and loads
    /// the pending-reward store.
    pub async fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let keys = KeyPair::load_or_generate(&config.keys_path)?;
        let pending = PendingRewardsStore::load("data/pending_rewards.json");

        let listener = TcpListener::bind(config.votifier_addr).await?;
        tracing::info!(addr = %config.votifier_addr, "votifier listener bound");

        let rc = RcClient::new(config.rcon_addr, config.rcon_password.clone());

        Ok(Self {
            listener,
            cancel: CancellationToken::new(),
            keys: Arc::new(keys),
            rc: Arc::new(rc),
            dedup: Arc::new(VoteDeduplicator::new()),
            pending: Arc::new(pending),
            notified: Arc::new(NotifiedSet::new()),
        })
    }

    /// A handle other tasks (e.g. the signal handler) can use to request
    /// shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Attempts an RC connect+auth without blocking startup on failure
    /// (the game may not be up yet; RC reconnects lazily on the next
    /// `exec`).
    pub async fn self_test_rc(&self) {
        match self.rc.exec("list").await {
            Ok(_) => tracing::info!("rc self-test succeeded"),
            Err(err) => tracing::warn!(%err, "rc self-test failed, will retry lazily"),
        }
    }

    /// Runs the accept loop and both poller tasks until cancelled.
    pub async fn run(self) {
        let claim_task = tokio::spawn(claim_poller::run(
            self.rc.clone(),
            self.pending.clone(),
            self.notified.clone(),
            self.cancel.clone(),
        ));
        let join_task = tokio::spawn(join_poller::run(
            self.rc.clone(),
            self.pending.clone(),
            self.notified.clone(),
            self.cancel.clone(),
        ));

        self.accept_loop().await;

        let grace = Duration::from_secs(2);
        if timeout(grace, claim_task).await.is_err() {
            tracing::warn!("claim poller did not stop within grace period");
        }
        if timeout(grace, join_task).await.is_err() {
            tracing::warn!("join poller did not stop within grace period");
        }

        self.rc.close().await;
    }

    async fn accept_loop(&self) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            match timeout(ACCEPT_POLL, self.listener.accept()).await {
                Ok(Ok((socket, peer))) => {
                    tracing::debug!(%peer, "accepted votifier connection");
                    tokio::spawn(connection::handle(
                        socket,
                        peer,
                        self.keys.clone(),
                        self.dedup.clone(),
                        self.pending.clone(),
                        self.rc.clone(),
                    ));
                }
                Ok(Err(err)) => {
                    tracing::warn!(%err, "accept failed");
                }
                Err(_) => {
                    // Poll timeout elapsed; loop back and recheck cancellation.
                }
            }
        }
    }
}
