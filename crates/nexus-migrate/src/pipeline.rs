//! Migration pipeline orchestration.

use futures::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::destination::Migrate;
use crate::error::Result;
use crate::mapping::map_player;
use crate::source::{LegacyCharacter, PlayerSource, ELIGIBLE_VERSION, LEGACY_SLOTS};

/// Migration statistics.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MigrationStats {
    /// Player rows read from the source.
    pub players: u64,
    /// Players skipped for having no account id.
    pub skipped: u64,
    /// User documents written.
    pub users: u64,
    /// Character documents written.
    pub characters: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl MigrationStats {
    /// Documents written per second.
    #[must_use]
    pub fn throughput(&self) -> f64 {
        if self.duration_secs > 0.0 {
            (self.users + self.characters) as f64 / self.duration_secs
        } else {
            0.0
        }
    }
}

/// Console progress: a spinner plus the per-record lines operators follow.
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    /// Creates a spinner, or a hidden one when `quiet`.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        if quiet {
            return Self::hidden();
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} players {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// Progress that draws nothing.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Prints a line to stdout without tearing the spinner.
    pub fn line(&self, message: &str) {
        self.bar.suspend(|| println!("{message}"));
    }

    fn player_done(&self) {
        self.bar.inc(1);
    }

    /// Stops the spinner.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Moves every eligible player from `source` into `writer`.
///
/// Characters are written before the user that references them. Players with
/// an empty account id are skipped. The first error stops the import.
///
/// # Errors
///
/// Returns the first source, encoding or write error.
pub async fn import_players<S, W>(source: &S, writer: &W, progress: &Progress) -> Result<MigrationStats>
where
    S: PlayerSource + ?Sized,
    W: Migrate + ?Sized,
{
    let start = Instant::now();
    let mut stats = MigrationStats::default();

    let ineligible = source.count_ineligible_characters().await?;
    if ineligible > 0 {
        warn!(
            "{ineligible} character rows have a version other than {ELIGIBLE_VERSION} and will not be migrated"
        );
    }

    let mut players = source.list_players();
    while let Some(player) = players.try_next().await? {
        stats.players += 1;
        progress.player_done();

        if player.steam_id.is_empty() {
            debug!("Skipping player {} without account id", player.id);
            stats.skipped += 1;
            continue;
        }

        progress.line(&format!("Starting migration for {}", player.steam_id));

        let mut found: [Option<LegacyCharacter>; LEGACY_SLOTS as usize] = Default::default();
        for (slot, entry) in (0u8..).zip(found.iter_mut()) {
            *entry = source.find_character(&player.id, slot).await?;
        }

        let (user, characters) = map_player(&player, found);

        for character in &characters {
            progress.line(&format!(
                "Importing character slot {} for {} - {}",
                character.slot, user.id, character.id
            ));
            writer.insert_char(character).await?;
            stats.characters += 1;
        }

        progress.line(&format!("Importing user {}\n", user.id));
        writer.insert_user(&user).await?;
        stats.users += 1;
    }

    stats.duration_secs = start.elapsed().as_secs_f64();
    info!(
        "Imported {} users and {} characters from {} players ({} skipped) in {:.2}s",
        stats.users, stats.characters, stats.players, stats.skipped, stats.duration_secs
    );

    Ok(stats)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
