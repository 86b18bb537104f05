//! Play command handler
//!
//! Runs a simulated player for a video and feeds its progress into the
//! library until the video ends or the user presses Ctrl-C.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use studytube_core::{
    Config, Library, PlaybackController, PlayerEvent, ProgressOutcome, StateStore, Subject,
};

use crate::output::{format_duration, progress_bar, Output};
use crate::player::SimulatedPlayer;

/// Options for a playback session
#[derive(Debug, Clone, Copy)]
pub struct PlayOptions {
    /// Length to assume when the video's duration is not known yet
    pub duration: f64,
    /// Playback speed multiplier
    pub speed: f64,
    /// Start from the beginning instead of the saved position
    pub restart: bool,
}

/// Play a video, tracking progress
pub async fn play<S: StateStore>(
    library: &mut Library<S>,
    config: &Config,
    subject: Subject,
    video_id: String,
    options: PlayOptions,
    output: &Output,
) -> Result<()> {
    if options.speed.is_nan() || options.speed <= 0.0 {
        bail!("Speed must be greater than zero");
    }

    let Some(video) = library.start_playback(subject, &video_id) else {
        bail!("Video not found in {}: {}", subject, video_id);
    };

    let duration = if video.duration > 0.0 {
        video.duration
    } else {
        options.duration
    };
    let offset = if options.restart || video.watched {
        0.0
    } else {
        duration * video.progress / 100.0
    };

    output.message(&format!(
        "Playing \"{}\" ({}) from {}. Press Ctrl-C to stop.",
        video.title,
        format_duration(duration),
        format_duration(offset)
    ));

    let player = Arc::new(SimulatedPlayer::new(offset, duration, options.speed));
    let (mut controller, mut ticks) = PlaybackController::new(config.progress_interval());
    controller.open(subject, video_id.clone(), player.clone());
    controller.handle(PlayerEvent::Playing);

    let mut autosave = tokio::time::interval(config.autosave_interval());
    autosave.set_missed_tick_behavior(MissedTickBehavior::Delay);
    autosave.tick().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            Some(tick) = ticks.recv() => {
                if !controller.accepts(&tick) {
                    debug!("Dropping stale tick from session {}", tick.session);
                    continue;
                }

                let outcome = library.update_progress(
                    tick.subject,
                    &tick.video_id,
                    tick.percent,
                    tick.current_time,
                );
                if let ProgressOutcome::Updated { progress, .. } = outcome {
                    print_position(output, tick.current_time, progress);
                }
                report_save_error(library, output);

                if player.has_ended() {
                    if let Some(completed) = controller.handle(PlayerEvent::Ended) {
                        library.mark_as_watched(completed.subject, &completed.video_id);
                        end_position_line(output);
                        output.success(&format!("Finished \"{}\"", video.title));
                    }
                    break;
                }
            }
            _ = autosave.tick() => {
                if let Some(Err(e)) = library.autosave() {
                    output.save_failed(&e);
                }
            }
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    debug!("Failed to listen for Ctrl-C: {}", e);
                }
                end_position_line(output);
                output.message("Stopped.");
                break;
            }
        }
    }

    controller.handle(PlayerEvent::Closed);
    info!("Playback of {} closed", video_id);

    if let Some(Err(e)) = library.autosave() {
        output.save_failed(&e);
    }
    Ok(())
}

fn print_position(output: &Output, current_time: f64, progress: f64) {
    if output.should_prompt() {
        print!(
            "\r{} {}",
            progress_bar(progress, 30),
            format_duration(current_time)
        );
        let _ = io::stdout().flush();
    }
}

fn end_position_line(output: &Output) {
    if output.should_prompt() {
        println!();
    }
}

fn report_save_error<S: StateStore>(library: &mut Library<S>, output: &Output) {
    if let Some(e) = library.take_save_error() {
        output.save_failed(&e);
    }
}
