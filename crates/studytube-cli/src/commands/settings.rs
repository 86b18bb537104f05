//! Theme and autosave handlers

use anyhow::Result;

use studytube_core::{Library, StateStore, Theme, UnknownTheme};

use crate::output::Output;

/// Requested theme change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeChoice {
    Set(Theme),
    Toggle,
}

impl std::str::FromStr for ThemeChoice {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("toggle") {
            Ok(ThemeChoice::Toggle)
        } else {
            s.parse().map(ThemeChoice::Set)
        }
    }
}

/// Show or change the theme
pub fn theme<S: StateStore>(
    library: &mut Library<S>,
    choice: Option<ThemeChoice>,
    output: &Output,
) -> Result<()> {
    let theme = match choice {
        None => {
            output.message(&format!("Theme: {}", library.state().settings.theme));
            return Ok(());
        }
        Some(ThemeChoice::Toggle) => library.toggle_theme(),
        Some(ThemeChoice::Set(theme)) => {
            library.set_theme(theme);
            theme
        }
    };
    output.success(&format!("Theme set to {}", theme));
    Ok(())
}

/// Show or change autosave
pub fn autosave<S: StateStore>(
    library: &mut Library<S>,
    enabled: Option<bool>,
    output: &Output,
) -> Result<()> {
    let Some(enabled) = enabled else {
        let state = if library.state().settings.auto_save {
            "on"
        } else {
            "off"
        };
        output.message(&format!("Autosave: {}", state));
        return Ok(());
    };

    library.set_auto_save(enabled);
    output.success(if enabled {
        "Autosave enabled"
    } else {
        "Autosave disabled"
    });
    Ok(())
}

/// Parse `on`/`off` style switches
pub fn parse_switch(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("Expected on or off, got '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{Output, OutputFormat};
    use studytube_core::MemoryStore;

    #[test]
    fn test_theme_choice_parse() {
        assert_eq!("toggle".parse::<ThemeChoice>(), Ok(ThemeChoice::Toggle));
        assert_eq!("Dark".parse::<ThemeChoice>(), Ok(ThemeChoice::Set(Theme::Dark)));
        assert_eq!(
            "blue".parse::<ThemeChoice>(),
            Err(UnknownTheme("blue".to_string()))
        );
    }

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("on"), Ok(true));
        assert_eq!(parse_switch("OFF"), Ok(false));
        assert!(parse_switch("maybe").is_err());
    }

    #[test]
    fn test_theme_and_autosave() {
        let mut library = Library::open(MemoryStore::new());
        let output = Output::new(OutputFormat::Quiet);

        theme(&mut library, Some(ThemeChoice::Toggle), &output).unwrap();
        assert_eq!(library.state().settings.theme, Theme::Dark);
        theme(&mut library, Some(ThemeChoice::Set(Theme::Light)), &output).unwrap();
        assert_eq!(library.state().settings.theme, Theme::Light);

        autosave(&mut library, Some(false), &output).unwrap();
        assert!(!library.state().settings.auto_save);

        // showing does not record anything
        theme(&mut library, None, &output).unwrap();
        assert_eq!(library.state().recent_activity.len(), 3);
    }
}
