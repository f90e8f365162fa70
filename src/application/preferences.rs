use tracing::warn;

use crate::application::persistence::Persistence;
use crate::domain::{clock::Clock, storage::KeyValueStorage, theme::Theme};
use crate::error::Result;

pub const THEME_KEY: &str = "taskflow-theme";

impl<S: KeyValueStorage, C: Clock> Persistence<S, C> {
    /// Stored theme preference; anything unreadable or unrecognised reads as `System`.
    pub fn load_theme(&self) -> Theme {
        match self.storage().get_item(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|err| {
                warn!(error = %err, "ignoring stored theme");
                Theme::System
            }),
            Ok(None) => Theme::System,
            Err(err) => {
                warn!(error = %err, "failed to read theme preference");
                Theme::System
            }
        }
    }

    pub fn save_theme(&self, theme: Theme) -> Result<()> {
        self.storage().set_item(THEME_KEY, theme.as_str())?;
        Ok(())
    }
}
