use std::io::{self, Write};

use anyhow::Result;

use crate::{
    domain::shell_state::ShellMode,
    usecases::{
        context::AppContext,
        contracts::{AppEventSource, ShellOrchestrator},
    },
};

use super::render::{self, DEFAULT_WIDTH};

pub fn start(
    context: &AppContext,
    event_source: &mut dyn AppEventSource,
    orchestrator: &mut dyn ShellOrchestrator,
) -> Result<()> {
    tracing::info!(
        log_level = %context.config.logging.level,
        data_dir = %context.layout.data_dir.display(),
        "starting chat shell"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_loop(&mut out, event_source, orchestrator)
}

/// Renders, then feeds one event to the orchestrator, until it stops.
pub fn run_loop(
    out: &mut dyn Write,
    event_source: &mut dyn AppEventSource,
    orchestrator: &mut dyn ShellOrchestrator,
) -> Result<()> {
    let mut last_frame: Vec<String> = Vec::new();

    while orchestrator.state().is_running() {
        let frame = compose_frame(orchestrator);
        let forced = orchestrator.state_mut().take_redraw();
        if forced || frame != last_frame {
            for line in &frame {
                writeln!(out, "{line}")?;
            }
            last_frame = frame;
        }
        if let Some(notice) = orchestrator.state_mut().take_notice() {
            writeln!(out, "! {notice}")?;
        }
        out.flush()?;

        if let Some(event) = event_source.next_event()? {
            orchestrator.handle_event(event)?;
        }
    }

    Ok(())
}

fn compose_frame(orchestrator: &dyn ShellOrchestrator) -> Vec<String> {
    match (orchestrator.state().mode(), orchestrator.open_chat()) {
        (ShellMode::Thread { .. }, Some(thread)) => {
            render::render_thread(thread, orchestrator.current_user_id(), DEFAULT_WIDTH)
        }
        _ => render::render_chat_list(orchestrator.chat_list(), DEFAULT_WIDTH),
    }
}
