//! Subcommand implementations.

use anyhow::{anyhow, bail, Context};
use ballot_gateway::{JsonRpcProvider, RpcClient, RpcGateway, WalletProvider};
use ballot_proxy::{ProxyMetrics, ProxyServer, ProxyState};
use ballot_router::{entry_route, Navigation, PageRouter, Route};
use ballot_session::Session;
use ballot_sync::{AdminAction, RefreshTrigger, SyncSignals, Synchronizer};
use ballot_utils::ShutdownController;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::BallotConfig;
use crate::render;

/// A connected session routed to one dashboard.
struct Dashboard {
    provider: Option<Arc<JsonRpcProvider>>,
    session: Arc<Session>,
    router: PageRouter,
    sync: Arc<Synchronizer>,
}

impl Dashboard {
    /// Connect and navigate to `requested`, or to the role's entry route.
    async fn open(config: &BallotConfig, requested: Option<Route>) -> anyhow::Result<Self> {
        let rpc = RpcClient::new(config.rpc_url.clone())?;
        let provider = JsonRpcProvider::detect(rpc).await.map(|provider| {
            Arc::new(
                provider
                    .with_gas_limit(config.gas_limit)
                    .with_receipt_policy(config.receipt_policy()),
            )
        });
        let session = Arc::new(Session::new(
            provider.clone().map(|p| p as Arc<dyn WalletProvider>),
            config.deployments()?,
            config.expected_chain_id,
        ));
        let connection = session.connect().await?;

        let snapshot = session.snapshot();
        let mut router = PageRouter::new();
        let target = requested.unwrap_or_else(|| entry_route(&snapshot));
        let audience = match router.navigate(target, &snapshot) {
            Navigation::Allowed(route) => route.audience(),
            Navigation::Redirected { requested, .. } => bail!(
                "{} may not open {}",
                connection.identity,
                requested.path()
            ),
        }
        .ok_or_else(|| anyhow!("no dashboard for {}", router.current().path()))?;

        let sync = Arc::new(Synchronizer::new(
            connection.gateway,
            connection.identity,
            audience,
            SyncSignals::new(),
        ));
        sync.refresh(RefreshTrigger::Initial).await?;

        Ok(Self {
            provider,
            session,
            router,
            sync,
        })
    }

    fn print(&self) {
        println!("{}", render::dashboard(&self.sync.view(), &self.sync.identity()));
    }
}

pub async fn status(config: &BallotConfig) -> anyhow::Result<()> {
    Dashboard::open(config, None).await?.print();
    Ok(())
}

pub async fn vote(config: &BallotConfig, candidate_id: u64) -> anyhow::Result<()> {
    let dashboard = Dashboard::open(config, Some(Route::Voter)).await?;
    let receipt = dashboard.sync.cast_vote(Some(candidate_id)).await?;
    println!("Your vote has been cast successfully!");
    println!("Transaction: {}", receipt.transaction_hash);
    dashboard.print();
    Ok(())
}

pub async fn authorize(config: &BallotConfig, voter: &str) -> anyhow::Result<()> {
    let dashboard = Dashboard::open(config, Some(Route::Admin)).await?;
    dashboard.sync.authorize_voter(voter).await?;
    println!("Voter {} authorized successfully!", voter.trim());
    Ok(())
}

pub async fn add_candidate(config: &BallotConfig, name: &str) -> anyhow::Result<()> {
    let dashboard = Dashboard::open(config, Some(Route::Admin)).await?;
    dashboard.sync.add_candidate(name).await?;
    println!("Candidate {} added successfully!", name.trim());
    dashboard.print();
    Ok(())
}

pub async fn admin_action(
    config: &BallotConfig,
    action: AdminAction,
    assume_yes: bool,
) -> anyhow::Result<()> {
    let dashboard = Dashboard::open(config, Some(Route::Admin)).await?;
    let phase = dashboard.sync.view().phase;

    if action != AdminAction::ResetElection && AdminAction::toggle_for(phase) != action {
        bail!("Cannot {action} the election: {}.", phase.status_line());
    }
    if !assume_yes && !confirm(action.confirmation_prompt()).await? {
        println!("Cancelled.");
        return Ok(());
    }

    match action {
        AdminAction::StartElection | AdminAction::EndElection => {
            dashboard.sync.toggle_election_phase().await?;
            println!("{}", dashboard.sync.view().phase.status_line());
        }
        AdminAction::ResetElection => {
            dashboard.sync.reset_election().await?;
            println!("Election has been reset successfully!");
        }
    }
    Ok(())
}

async fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read confirmation")?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Follow the dashboard until SIGINT/SIGTERM or until the session no longer
/// permits it.
pub async fn watch(config: &BallotConfig) -> anyhow::Result<()> {
    let mut dashboard = Dashboard::open(config, None).await?;
    let shutdown = ShutdownController::new();

    let mut tasks = Vec::new();
    if let Some(provider) = &dashboard.provider {
        tasks.push(provider.spawn_watcher(config.provider_poll_interval(), shutdown.subscribe()));
    }
    let events = dashboard.session.spawn_event_loop(shutdown.subscribe());
    tasks.push(dashboard.sync.watch_triggers(shutdown.subscribe()));

    let signal = shutdown.clone();
    tokio::spawn(async move { signal.wait_for_signal().await });

    let mut stop = shutdown.subscribe();
    let mut views = dashboard.sync.subscribe();
    let mut sessions = dashboard.session.subscribe();
    let mut ticker = tokio::time::interval(config.provider_poll_interval());
    let mut contract = sessions
        .borrow_and_update()
        .connection()
        .map(|c| c.contract.clone());
    dashboard.print();

    loop {
        tokio::select! {
            _ = stop.recv() => break,
            _ = ticker.tick() => {
                if let Err(e) = dashboard.sync.refresh(RefreshTrigger::Manual).await {
                    warn!("refresh failed: {e}");
                }
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                println!("{}", render::dashboard(&view, &dashboard.sync.identity()));
            }
            changed = sessions.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = sessions.borrow_and_update().clone();
                if snapshot.loading {
                    continue;
                }
                if let Some(route) = dashboard.router.on_session_change(&snapshot) {
                    println!("Session changed; returning to {}", route.path());
                    break;
                }
                let Some(connection) = snapshot.connection() else {
                    continue;
                };
                if connection.identity != dashboard.sync.identity()
                    || contract.as_ref() != Some(&connection.contract)
                {
                    contract = Some(connection.contract.clone());
                    info!(identity = %connection.identity, "rebinding dashboard");
                    if let Err(e) = dashboard
                        .sync
                        .rebind(Arc::clone(&connection.gateway), connection.identity.clone())
                        .await
                    {
                        warn!("reload after account change failed: {e}");
                    }
                }
            }
        }
    }

    shutdown.shutdown();
    for task in tasks {
        let _ = task.await;
    }
    if let Some(events) = events {
        events.join().await;
    }
    Ok(())
}

pub async fn proxy(config: &BallotConfig) -> anyhow::Result<()> {
    let rpc = RpcClient::new(config.rpc_url.clone())?;
    let contract = match &config.proxy_contract {
        Some(address) => address.clone(),
        None => {
            let network = JsonRpcProvider::new(rpc.clone()).network_id().await?;
            config
                .deployments()?
                .address_for(network)
                .cloned()
                .ok_or_else(|| anyhow!("voting contract is not deployed on network {network}"))?
        }
    };

    let gateway = RpcGateway::new(rpc, contract.clone())
        .with_gas_limit(config.gas_limit)
        .with_receipt_policy(config.receipt_policy());
    let mut state = ProxyState::new(Arc::new(gateway));
    if config.enable_metrics {
        state = state.with_metrics(Arc::new(ProxyMetrics::new()?));
    }

    info!(
        port = config.proxy_port,
        %contract,
        metrics = config.enable_metrics,
        "starting proxy"
    );

    let shutdown = ShutdownController::new();
    let server = ProxyServer::new(config.proxy_port, state).start(shutdown.subscribe());
    let signal = shutdown.clone();
    tokio::spawn(async move { signal.wait_for_signal().await });
    server.await?;
    info!("proxy stopped");
    Ok(())
}
