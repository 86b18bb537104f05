//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use studytube_core::activity::time_ago;
use studytube_core::library::{AddSummary, StorageUsage};
use studytube_core::models::now_millis;
use studytube_core::progress::{ContinueCandidate, SubjectStats};
use studytube_core::storage::BackupPreview;
use studytube_core::video_id::LinkCheck;
use studytube_core::{ActivityEntry, StorageError, Subject, VideoRecord};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single video
    pub fn print_video(&self, subject: Subject, video: &VideoRecord) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", video.id);
                println!("Title:    {}", video.title);
                println!("Channel:  {}", video.author);
                println!("Subject:  {}", subject.label());
                println!("Status:   {}", video.status());
                println!("Progress: {}", progress_bar(video.progress, 20));
                if video.duration > 0.0 {
                    println!("Duration: {}", format_duration(video.duration));
                }
                println!("Added:    {}", time_ago(video.added_date, now_millis()));
                if let Some(last) = video.last_watched {
                    println!("Watched:  {}", time_ago(last, now_millis()));
                }
                println!("URL:      https://www.youtube.com/watch?v={}", video.id);
            }
            OutputFormat::Json => print_json(video),
            OutputFormat::Quiet => println!("{}", video.id),
        }
    }

    /// Print a subject's videos in display order
    pub fn print_videos(&self, subject: Subject, videos: &[&VideoRecord]) {
        match self.format {
            OutputFormat::Human => {
                if videos.is_empty() {
                    println!("No videos in {} yet.", subject.label());
                    println!("Add some with: studytube add {} <link>...", subject);
                    return;
                }
                for video in videos {
                    let marker = if video.watched { "✓" } else { " " };
                    println!(
                        "{} {} | {} | {} | {}",
                        marker,
                        video.id,
                        truncate(&video.title, 40),
                        truncate(&video.author, 20),
                        video.status()
                    );
                }
                let unwatched = videos.iter().filter(|v| !v.watched).count();
                println!("\n{} video(s), {} unwatched", videos.len(), unwatched);
            }
            OutputFormat::Json => print_json(&videos),
            OutputFormat::Quiet => {
                for video in videos {
                    println!("{}", video.id);
                }
            }
        }
    }

    /// Print the outcome of a bulk add
    pub fn print_add_summary(&self, subject: Subject, summary: &AddSummary) {
        match self.format {
            OutputFormat::Human => {
                println!("✓ {}", summary.message(subject));
                for error in &summary.errors {
                    println!("  {}", error);
                }
            }
            OutputFormat::Json => print_json(&serde_json::json!({
                "subject": subject,
                "added": summary.added,
                "duplicates": summary.duplicates,
                "invalid": summary.invalid,
                "errors": summary.errors,
            })),
            OutputFormat::Quiet => println!("{}", summary.added),
        }
    }

    /// Print a link analysis
    pub fn print_link_checks(&self, checks: &[LinkCheck]) {
        let valid = checks.iter().filter(|c| c.is_valid()).count();
        match self.format {
            OutputFormat::Human => {
                for check in checks {
                    match &check.video_id {
                        Some(id) => println!("✓ {} -> {}", truncate(&check.link, 50), id),
                        None => println!("✗ {}", truncate(&check.link, 50)),
                    }
                }
                println!(
                    "\n{} valid, {} invalid",
                    valid,
                    checks.len() - valid
                );
            }
            OutputFormat::Json => {
                let items: Vec<_> = checks
                    .iter()
                    .map(|c| serde_json::json!({"link": c.link, "videoId": c.video_id}))
                    .collect();
                print_json(&items);
            }
            OutputFormat::Quiet => {
                for id in checks.iter().filter_map(|c| c.video_id.as_ref()) {
                    println!("{}", id);
                }
            }
        }
    }

    /// Print the home overview
    pub fn print_overview(
        &self,
        stats: &[SubjectStats],
        continuing: &[ContinueCandidate<'_>],
        activity: &[&ActivityEntry],
        usage: StorageUsage,
    ) {
        match self.format {
            OutputFormat::Human => {
                println!("Subjects:");
                for s in stats {
                    println!(
                        "  {:<10} {:>3} videos, {:>3} to watch, {:>3}% complete",
                        s.subject.label(),
                        s.total,
                        s.unwatched(),
                        s.percent
                    );
                }

                if !continuing.is_empty() {
                    println!();
                    println!("Continue watching:");
                    for c in continuing {
                        println!(
                            "  {} {} | {} | {}",
                            progress_bar(c.video.progress, 10),
                            c.video.id,
                            truncate(&c.video.title, 40),
                            c.subject.label()
                        );
                    }
                }

                println!();
                self.print_activity_lines(activity);

                println!();
                println!(
                    "Storage: {} of {} ({:.1}%)",
                    format_bytes(usage.bytes),
                    format_bytes(usage.budget),
                    usage.percent()
                );
            }
            OutputFormat::Json => {
                let stats: Vec<_> = stats
                    .iter()
                    .map(|s| {
                        serde_json::json!({
                            "subject": s.subject,
                            "total": s.total,
                            "watched": s.watched,
                            "unwatched": s.unwatched(),
                            "percent": s.percent,
                        })
                    })
                    .collect();
                let continuing: Vec<_> = continuing
                    .iter()
                    .map(|c| serde_json::json!({"subject": c.subject, "video": c.video}))
                    .collect();
                print_json(&serde_json::json!({
                    "subjects": stats,
                    "continueWatching": continuing,
                    "recentActivity": activity,
                    "storage": {
                        "bytes": usage.bytes,
                        "budget": usage.budget,
                        "percent": usage.percent(),
                    },
                }));
            }
            OutputFormat::Quiet => {
                for s in stats {
                    println!("{} {}", s.subject, s.unwatched());
                }
            }
        }
    }

    /// Print recent activity, newest first
    pub fn print_activity(&self, activity: &[&ActivityEntry]) {
        match self.format {
            OutputFormat::Human => self.print_activity_lines(activity),
            OutputFormat::Json => print_json(&activity),
            OutputFormat::Quiet => {
                for entry in activity {
                    println!("{}", entry.message());
                }
            }
        }
    }

    fn print_activity_lines(&self, activity: &[&ActivityEntry]) {
        if activity.is_empty() {
            println!("No recent activity.");
            return;
        }
        println!("Recent activity:");
        let now = now_millis();
        for entry in activity {
            println!("  {} ({})", entry.message(), time_ago(entry.timestamp, now));
        }
    }

    /// Print a backup summary
    pub fn print_backup_preview(&self, preview: &BackupPreview) {
        match self.format {
            OutputFormat::Human => {
                println!(
                    "Backup from: {}",
                    preview.export_date.as_deref().unwrap_or("(unknown date)")
                );
                for (subject, count) in &preview.counts {
                    println!("  {:<10} {} videos", subject.label(), count);
                }
                println!("\n{} video(s) in total", preview.total());
            }
            OutputFormat::Json => {
                let counts: serde_json::Map<_, _> = preview
                    .counts
                    .iter()
                    .map(|(s, n)| (s.to_string(), serde_json::json!(n)))
                    .collect();
                print_json(&serde_json::json!({
                    "exportDate": preview.export_date,
                    "counts": counts,
                    "total": preview.total(),
                }));
            }
            OutputFormat::Quiet => println!("{}", preview.total()),
        }
    }

    /// Report a failed save; the command itself still succeeded in memory
    pub fn save_failed(&self, error: &StorageError) {
        if self.is_json() {
            eprintln!(
                "{}",
                serde_json::json!({"status": "warning", "message": error.to_string()})
            );
            return;
        }
        eprintln!("⚠ Failed to save: {}", error);
        if let Some(hint) = error.recovery_suggestion() {
            eprintln!("  {}", hint);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

/// Text progress bar like `[#####-----]  50%`
pub fn progress_bar(percent: f64, width: usize) -> String {
    let percent = percent.clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        percent.round() as u32
    )
}

/// Seconds as `m:ss` or `h:mm:ss`
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

fn format_bytes(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let bytes = bytes as f64;
    if bytes < KIB {
        format!("{} B", bytes)
    } else if bytes < KIB * KIB {
        format!("{:.1} KiB", bytes / KIB)
    } else {
        format!("{:.1} MiB", bytes / (KIB * KIB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ünïcödé títle", 8), "ünïcö...");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 10), "[----------]   0%");
        assert_eq!(progress_bar(50.0, 10), "[#####-----]  50%");
        assert_eq!(progress_bar(120.0, 4), "[####] 100%");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(59.4), "0:59");
        assert_eq!(format_duration(212.0), "3:32");
        assert_eq!(format_duration(3725.0), "1:02:05");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }
}
