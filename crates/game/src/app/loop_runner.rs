use std::process::ExitCode;

use fieldwalk_engine::entity::SheetLayout;
use fieldwalk_engine::{
    DiskImageLoader, Entity, ImageLoader, MapSession, SessionError, SimulationMode,
    TransitionOutcome,
};
use tracing::{error, info, warn};

use super::bootstrap::AppWiring;
use super::script::intent_for_tick;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) ticks: u32,
    pub(crate) hits: usize,
    pub(crate) contacts: usize,
    pub(crate) removed: usize,
    pub(crate) transitions: usize,
    pub(crate) rejected_transitions: usize,
    pub(crate) avatar_defeated: bool,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let mut images = DiskImageLoader::new();
    let session = match open_session(&app, &mut images) {
        Ok(session) => session,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    let (session, summary) = run_ticks(session, &app, &mut images);
    info!(
        map = session.map_name(),
        ticks = summary.ticks,
        hits = summary.hits,
        contacts = summary.contacts,
        removed = summary.removed,
        transitions = summary.transitions,
        rejected_transitions = summary.rejected_transitions,
        avatar_defeated = summary.avatar_defeated,
        "run_complete"
    );
    session.close(&mut images);

    let leaked = images.live_count();
    if leaked > 0 {
        warn!(leaked, "image_handles_leaked");
    }
    ExitCode::SUCCESS
}

pub(crate) fn open_session(
    app: &AppWiring,
    images: &mut dyn ImageLoader,
) -> Result<MapSession, SessionError> {
    let mut avatar = Entity::avatar(app.settings.avatar_start(), app.world.creature_scale);
    if let Some(sprite) = &app.settings.avatar_sprite {
        let path = app.layout.asset_path(sprite);
        match images.load_image(&path) {
            Ok(handle) => avatar = avatar.with_sprite(handle, SheetLayout::default()),
            Err(err) => warn!(path = %path.display(), error = %err, "avatar_sprite_load_failed"),
        }
    }
    MapSession::open(
        &app.settings.start_map,
        avatar,
        app.world.clone(),
        app.layout.clone(),
        app.spawn_table.clone(),
        images,
    )
}

/// Drives the session for the configured number of ticks, or until the avatar dies.
pub(crate) fn run_ticks(
    mut session: MapSession,
    app: &AppWiring,
    images: &mut dyn ImageLoader,
) -> (MapSession, RunSummary) {
    let mut summary = RunSummary::default();
    for tick in 0..app.settings.ticks {
        let intent = intent_for_tick(tick);
        let report = session.tick(
            app.settings.tick_seconds,
            &intent,
            SimulationMode::Running,
            images,
        );
        summary.ticks += 1;
        summary.hits += report.sweep.hits;
        summary.contacts += report.sweep.contacts;
        summary.removed += report.removed;
        match report.transition {
            TransitionOutcome::Applied(applied) => {
                summary.transitions += 1;
                info!(tick, from = %applied.from, to = %applied.to, "map_changed");
            }
            TransitionOutcome::Rejected { .. } => summary.rejected_transitions += 1,
            TransitionOutcome::Stayed => {}
        }
        session.registry_mut().sort_by_depth();

        if session.registry().avatar().is_none() {
            summary.avatar_defeated = true;
            info!(tick, map = session.map_name(), "avatar_defeated");
            break;
        }
    }
    (session, summary)
}
