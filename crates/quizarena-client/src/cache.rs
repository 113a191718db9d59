//! Local JSON cache for the profile and the daily-reward state.
//!
//! Files are written to a temporary sibling and renamed into place so a
//! crash mid-write never leaves a truncated document behind.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use quizarena_shared::daily::DailyState;
use quizarena_shared::profile::PlayerProfile;

use crate::error::Result;

const PROFILE_FILE: &str = "profile.json";
const DAILY_FILE: &str = "daily.json";

#[derive(Debug, Clone)]
pub struct ProfileCache {
    dir: PathBuf,
}

impl ProfileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn load_profile(&self) -> Result<Option<PlayerProfile>> {
        self.read(PROFILE_FILE).await
    }

    pub async fn save_profile(&self, profile: &PlayerProfile) -> Result<()> {
        self.write(PROFILE_FILE, profile).await
    }

    pub async fn load_daily(&self) -> Result<DailyState> {
        Ok(self.read(DAILY_FILE).await?.unwrap_or_default())
    }

    pub async fn save_daily(&self, state: &DailyState) -> Result<()> {
        self.write(DAILY_FILE, state).await
    }

    /// Forget everything cached, e.g. on logout.
    pub async fn clear(&self) -> Result<()> {
        for name in [PROFILE_FILE, DAILY_FILE] {
            match tokio::fs::remove_file(self.dir.join(name)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.dir.join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec_pretty(value)?;
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), "cache written");
        Ok(())
    }
}
