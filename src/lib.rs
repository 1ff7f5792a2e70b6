pub mod camera;
pub mod capture;
pub mod codec;
pub mod events;
pub mod session;
pub mod settings;
pub mod strip;

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use camera::dummy::DummyBackend;
use capture::cue::CuePlayer;
use capture::sequencer::SequenceOutcome;
use events::{BoothEvent, EventSink};
use session::BoothSession;
use settings::store::ConfigSource;
use settings::types::BoothConfig;

/// Install the fmt subscriber. `RUST_LOG` wins over the configured filter.
fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Progress sink for the host: every event goes to the log.
fn log_events() -> EventSink {
    Arc::new(|event| match &event {
        BoothEvent::Countdown { shot, remaining } => {
            tracing::info!("shot {shot} in {remaining}")
        }
        BoothEvent::Flash { shot, .. } => tracing::debug!("flash for shot {shot}"),
        BoothEvent::Captured(progress) => {
            tracing::info!("progress {}", progress.label())
        }
        BoothEvent::Ready { artifact } => {
            tracing::info!("strip ready ({}x{})", artifact.width, artifact.height)
        }
        BoothEvent::Error { message } => tracing::error!("{message}"),
    })
}

#[cfg(feature = "audio")]
fn cue_player() -> Option<Arc<dyn CuePlayer>> {
    Some(Arc::new(capture::cue::CpalCuePlayer))
}

#[cfg(not(feature = "audio"))]
fn cue_player() -> Option<Arc<dyn CuePlayer>> {
    None
}

fn create_session(config: &BoothConfig) -> BoothSession {
    let session =
        BoothSession::new(Arc::new(DummyBackend::new()), config).with_events(log_events());
    match cue_player() {
        Some(cue) => session.with_cue(cue),
        None => session,
    }
}

/// Run one booth session against the simulated camera and export the strip.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = settings::store::config_path();
    let (config, source) = settings::store::load_with_source(&config_path)?;
    init_logging(&config.log_filter);
    match source {
        ConfigSource::File => tracing::info!("config loaded from {}", config_path.display()),
        ConfigSource::Defaults => {
            tracing::info!("no config at {}, using defaults", config_path.display())
        }
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut session = create_session(&config);
        let abort = session.abort_handle();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                abort.abort();
            }
        });

        match session.capture().await? {
            SequenceOutcome::Completed => {}
            SequenceOutcome::Aborted { captured } => {
                tracing::warn!("session aborted with {captured} frames, nothing to export");
                return Ok(());
            }
        }

        session.composite().await?;
        let path = session.export(Path::new(&config.export.dir), &config.export.file_name)?;
        tracing::info!("memory strip written to {}", path.display());
        session.discard();
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
