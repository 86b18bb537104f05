//! Home overview and activity handlers

use anyhow::Result;

use studytube_core::{Library, StateStore};

use crate::output::Output;

/// Show per-subject progress, videos to continue and recent activity
pub fn home<S: StateStore>(library: &Library<S>, output: &Output) -> Result<()> {
    output.print_overview(
        &library.stats(),
        &library.continue_watching(),
        &library.recent_activity(),
        library.storage_usage(),
    );
    Ok(())
}

/// Show the activity log, newest first
pub fn activity<S: StateStore>(library: &Library<S>, limit: usize, output: &Output) -> Result<()> {
    let entries = library.state().recent_activity.recent(limit);
    output.print_activity(&entries);
    Ok(())
}
