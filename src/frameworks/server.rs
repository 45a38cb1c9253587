// Framework bootstrap for the arena runtime.

use crate::domain::asteroid::generate_field;
use crate::domain::tuning::Tuning;
use crate::domain::world::{Cue, World};
use crate::frameworks::{config, net};
use crate::interface_adapters::session::{Role, Session, SessionEvent};

use std::io::Result;
use std::net::SocketAddr;
use tokio::sync::mpsc;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Runs the session loop over an already-bound listener. Used directly by
/// tests to host on an ephemeral port.
pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let (event_tx, event_rx) = mpsc::channel(config::EVENT_CHANNEL_CAPACITY);
    tokio::spawn(net::listen(listener, event_tx));
    tracing::info!(%address, "hosting");

    // Drifting rocks behind the menu until a run starts.
    let mut world = World::new(Tuning::default());
    world.asteroids = generate_field(1, &mut world.rng, &world.tuning.asteroid);
    let session = Session::new(world, Role::Host);
    session_loop(session, event_rx, config::autostart()).await;
    Ok(())
}

/// Entry point: dial out as a client when `ARENA_CONNECT` is set, otherwise
/// host on `ARENA_PORT`.
pub async fn run_with_config() -> Result<()> {
    init_runtime();

    if let Some(address) = config::connect_address() {
        let (event_tx, event_rx) = mpsc::channel(config::EVENT_CHANNEL_CAPACITY);
        net::connect(&address, event_tx).await?;
        let session = Session::new(World::new(Tuning::default()), Role::Client);
        session_loop(session, event_rx, false).await;
        return Ok(());
    }

    let address = SocketAddr::from(([0, 0, 0, 0], config::port()));
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;
    run(listener).await
}

/// The fixed-rate runtime loop: drain inbound events, advance one tick, hand
/// audio cues to the embedder (logged here, there being no playback device).
async fn session_loop(
    mut session: Session,
    mut event_rx: mpsc::Receiver<SessionEvent>,
    autostart: bool,
) {
    let mut interval = tokio::time::interval(config::TICK_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut started = false;
    loop {
        interval.tick().await;

        // Apply every message that arrived since the last tick, in order,
        // before the collision pass.
        while let Ok(event) = event_rx.try_recv() {
            session.handle_event(event);
        }

        if autostart && !started {
            session.start_game();
            started = true;
        }

        session.tick();

        for cue in session.world.take_cues() {
            match cue {
                Cue::Play(sound) => tracing::debug!(?sound, "play"),
                Cue::Loop(sound) => tracing::debug!(?sound, "play looped"),
                Cue::Stop(sound) => tracing::debug!(?sound, "stop"),
            }
        }
    }
}
