//! Video command handlers

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use studytube_core::{
    analyze_links, split_links, Library, ProgressOutcome, StateStore, Subject, VideoLookup,
};

use crate::output::Output;
use crate::prompt::confirm;

/// Gather links from arguments and an optional file
///
/// Each source may hold several links separated by newlines or commas.
pub fn collect_links(links: &[String], file: Option<&PathBuf>) -> Result<Vec<String>> {
    let mut text = links.join("\n");
    if let Some(path) = file {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read links file: {:?}", path))?;
        text.push('\n');
        text.push_str(&contents);
    }
    Ok(split_links(&text))
}

/// Add videos to a subject
pub async fn add<S: StateStore, L: VideoLookup>(
    library: &mut Library<S>,
    subject: Subject,
    links: Vec<String>,
    lookup: &L,
    output: &Output,
) -> Result<()> {
    if links.is_empty() {
        bail!("Please enter at least one YouTube link");
    }

    let show_progress = output.should_prompt();
    let summary = library
        .add_videos(&links, subject, lookup, |progress| {
            if show_progress {
                eprint!(
                    "\rProcessing {}/{} ({:.0}%)",
                    progress.processed,
                    progress.total,
                    progress.percent()
                );
                let _ = io::stderr().flush();
            }
        })
        .await;
    if show_progress {
        eprintln!();
    }

    output.print_add_summary(subject, &summary);
    Ok(())
}

/// Report which links are valid without adding anything
pub fn check(links: Vec<String>, output: &Output) -> Result<()> {
    if links.is_empty() {
        bail!("Please enter at least one YouTube link");
    }
    output.print_link_checks(&analyze_links(&links));
    Ok(())
}

/// Open a subject and list its videos
pub fn list<S: StateStore>(library: &mut Library<S>, subject: Subject, output: &Output) -> Result<()> {
    library.navigate(subject);
    output.print_videos(subject, &library.sorted_videos(subject));
    Ok(())
}

/// Show one video
pub fn show<S: StateStore>(
    library: &Library<S>,
    subject: Subject,
    video_id: String,
    output: &Output,
) -> Result<()> {
    let video = library
        .find(subject, &video_id)
        .ok_or_else(|| anyhow::anyhow!("Video not found in {}: {}", subject, video_id))?;
    output.print_video(subject, video);
    Ok(())
}

/// Record a progress sample by hand
pub fn progress<S: StateStore>(
    library: &mut Library<S>,
    subject: Subject,
    video_id: String,
    percent: f64,
    current_time: Option<f64>,
    output: &Output,
) -> Result<()> {
    let outcome = library.update_progress(subject, &video_id, percent, current_time.unwrap_or(0.0));
    match outcome {
        ProgressOutcome::NotFound => {
            bail!("Video not found in {}: {}", subject, video_id)
        }
        ProgressOutcome::Ignored => bail!("Progress must be a number"),
        ProgressOutcome::Updated {
            progress,
            completed,
            ..
        } => {
            if completed {
                output.success(&format!("Completed {}", video_id));
            } else {
                output.success(&format!("{} at {:.0}%", video_id, progress));
            }
        }
    }
    Ok(())
}

/// Mark a video as watched
pub fn done<S: StateStore>(
    library: &mut Library<S>,
    subject: Subject,
    video_id: String,
    output: &Output,
) -> Result<()> {
    if !library.mark_as_watched(subject, &video_id) {
        bail!("Video not found in {}: {}", subject, video_id);
    }
    output.success(&format!("Marked {} as watched", video_id));
    Ok(())
}

/// Remove a video from a subject
pub fn remove<S: StateStore>(
    library: &mut Library<S>,
    subject: Subject,
    video_id: String,
    output: &Output,
) -> Result<()> {
    let video = library
        .find(subject, &video_id)
        .ok_or_else(|| anyhow::anyhow!("Video not found in {}: {}", subject, video_id))?;

    if output.should_prompt() {
        println!("Remove video: {} - {}", video.id, video.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    library.remove_video(subject, &video_id);
    output.success(&format!("Removed {} from {}", video_id, subject));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use studytube_core::metadata::{LookupError, VideoDetails};
    use studytube_core::MemoryStore;
    use tempfile::TempDir;

    struct StaticLookup;

    impl VideoLookup for StaticLookup {
        async fn lookup(&self, _video_id: &str) -> Result<VideoDetails, LookupError> {
            Ok(VideoDetails {
                title: "Lecture".to_string(),
                author: "Professor".to_string(),
            })
        }
    }

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_collect_links_from_args_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("links.txt");
        std::fs::write(&path, "https://youtu.be/aaaaaaaaaaa\n\nbbbbbbbbbbb, ccccccccccc\n").unwrap();

        let links = collect_links(&["ddddddddddd".to_string()], Some(&path)).unwrap();

        assert_eq!(
            links,
            vec![
                "ddddddddddd",
                "https://youtu.be/aaaaaaaaaaa",
                "bbbbbbbbbbb",
                "ccccccccccc"
            ]
        );
    }

    #[test]
    fn test_collect_links_missing_file() {
        let err = collect_links(&[], Some(&PathBuf::from("/nonexistent/links.txt"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read links file"));
    }

    #[tokio::test]
    async fn test_add_then_done() {
        let mut library = Library::open(MemoryStore::new());

        add(
            &mut library,
            Subject::Physics,
            vec!["dQw4w9WgXcQ".to_string()],
            &StaticLookup,
            &quiet(),
        )
        .await
        .unwrap();
        done(&mut library, Subject::Physics, "dQw4w9WgXcQ".to_string(), &quiet()).unwrap();

        let video = library.find(Subject::Physics, "dQw4w9WgXcQ").unwrap();
        assert_eq!(video.title, "Lecture");
        assert!(video.watched);
    }

    #[tokio::test]
    async fn test_add_requires_links() {
        let mut library = Library::open(MemoryStore::new());
        let result = add(&mut library, Subject::Biology, Vec::new(), &StaticLookup, &quiet()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_video_errors() {
        let mut library = Library::open(MemoryStore::new());
        let id = "dQw4w9WgXcQ".to_string();

        assert!(done(&mut library, Subject::Chemistry, id.clone(), &quiet()).is_err());
        assert!(progress(&mut library, Subject::Chemistry, id.clone(), 50.0, None, &quiet()).is_err());
        assert!(remove(&mut library, Subject::Chemistry, id, &quiet()).is_err());
    }

    #[test]
    fn test_list_records_navigation() {
        let mut library = Library::open(MemoryStore::new());
        list(&mut library, Subject::Biology, &quiet()).unwrap();
        assert_eq!(library.state().recent_activity.len(), 1);
    }
}
