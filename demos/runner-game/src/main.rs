use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hostlink::HeartbeatTransport;
use hostlink::prelude::*;
use tokio::sync::Notify;
use tracing::{error, info, warn};

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// A stand-in match: players "run" laps until the agent shuts us down.
struct Race {
    runners: Vec<String>,
    laps: u32,
}

impl Race {
    fn new(runners: Vec<String>) -> Self {
        Self { runners, laps: 0 }
    }

    fn tick(&mut self) {
        self.laps += 1;
        if self.laps % 10 == 0 {
            info!(laps = self.laps, runners = self.runners.len(), "race progress");
        }
    }
}

/// Logs the session start and reports the runners as connected. Returns
/// `false` if the agent rejected either call.
fn report_roster<T: HeartbeatTransport>(
    agent: &GameServerAgent<T>,
    session: &str,
    runners: &[String],
) -> bool {
    let mut ok = true;
    if let Err(e) =
        agent.log_message(&format!("session {session} starting with {runners:?}"))
    {
        warn!(error = %e, "cannot write to agent log");
        ok = false;
    }
    if let Err(e) = agent
        .update_connected_players(runners.iter().map(ConnectedPlayer::new).collect())
    {
        warn!(error = %e, "cannot report connected players");
        ok = false;
    }
    ok
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let agent = Arc::new(GameServerAgent::new());

    let healthy = Arc::new(AtomicBool::new(true));
    let shutdown = Arc::new(Notify::new());

    agent.register_health_callback({
        let healthy = Arc::clone(&healthy);
        move || healthy.load(Ordering::Relaxed)
    });
    agent.register_shutdown_callback({
        let shutdown = Arc::clone(&shutdown);
        move || shutdown.notify_one()
    });
    agent.register_maintenance_callback(|at| {
        info!(%at, "host maintenance scheduled");
    });
    agent.register_maintenance_schedule_callback(|schedule| {
        info!(
            incarnation = %schedule.document_incarnation,
            events = schedule.events.len(),
            "maintenance schedule updated"
        );
    });

    if let Err(e) = agent.start_with_debug_logs() {
        error!(error = %e, "cannot start game server agent");
        eprintln!("runner-game: {e}");
        return ExitCode::FAILURE;
    }

    match agent.connection_info() {
        Ok(info) => {
            for port in &info.game_ports_configuration {
                info!(
                    name = %port.name,
                    listen = port.server_listening_port,
                    public = port.client_connection_port,
                    "port mapping"
                );
            }
        }
        Err(e) => error!(error = %e, "no connection info"),
    }

    let active = match agent.ready_for_players().await {
        Ok(active) => active,
        Err(e) => {
            error!(error = %e, "readiness wait failed");
            return ExitCode::FAILURE;
        }
    };
    if !active {
        info!("shut down before allocation");
        return ExitCode::SUCCESS;
    }

    let runners = agent.initial_players().unwrap_or_default();
    let session = agent
        .config_value(keys::SESSION_ID)
        .ok()
        .flatten()
        .unwrap_or_default();
    report_roster(&agent, &session, &runners);

    let mut race = Race::new(runners);
    let mut ticker = tokio::time::interval(std::time::Duration::from_millis(500));
    loop {
        tokio::select! {
            () = shutdown.notified() => break,
            _ = ticker.tick() => race.tick(),
        }
    }

    info!(laps = race.laps, "race over");
    ExitCode::SUCCESS
}
