//! Everything a running client holds on to, wired together at startup.

use rand::thread_rng;
use tracing::{info, warn};

use quizarena_shared::daily::DailyState;
use quizarena_shared::profile::PlayerProfile;
use quizarena_shared::protocol::UserView;
use quizarena_shared::types::GameMode;

use crate::api_client::ApiClient;
use crate::bank::QuestionBank;
use crate::cache::ProfileCache;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::game::{start_match, MatchConfig, MatchHandle};
use crate::profile::{initial_profile, ProfileHandle, ProfileTask, SyncWorker};
use crate::scheduler::Scheduler;

/// A question bank dropped into the cache directory replaces the built-in one.
const QUESTIONS_FILE: &str = "questions.json";

pub struct AppState {
    pub api: ApiClient,
    pub cache: ProfileCache,
    pub profile: ProfileHandle,
    pub scheduler: Scheduler,
    pub bank: QuestionBank,
}

impl AppState {
    /// Load the profile (server first, then cache, then a guest profile),
    /// start the profile task with cache and sync attached and load the
    /// question bank.
    pub async fn start(config: ClientConfig) -> Result<Self> {
        let api = ApiClient::new(config.clone())?;
        let cache = ProfileCache::new(config.cache_dir.clone());

        let (profile, daily, bank) = futures::join!(
            initial_profile(&api, &cache),
            cache.load_daily(),
            load_bank(&cache),
        );
        let profile = profile.unwrap_or_else(|| PlayerProfile::new("guest", "Player"));
        let daily = daily.unwrap_or_else(|e| {
            warn!(error = %e, "unreadable daily state, starting over");
            DailyState::default()
        });
        let bank = bank?;
        info!(profile = %profile.id, questions = bank.len(), "client started");

        let handle = ProfileTask::new(profile, daily)
            .with_cache(cache.clone())
            .with_sync(SyncWorker::spawn(api.clone()))
            .spawn();

        Ok(Self {
            api,
            cache,
            profile: handle,
            scheduler: Scheduler::new(),
            bank,
        })
    }

    /// Log in and adopt the server's copy of the profile.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserView> {
        let user = self.api.login(email, password).await?;
        self.profile.replace(user.to_profile()).await?;
        Ok(user)
    }

    /// Log out and drop the cached profile. The in-memory profile stays
    /// until the next start.
    pub async fn sign_out(&self) -> Result<()> {
        self.api.logout().await?;
        self.cache.clear().await
    }

    pub fn new_match(&self, mode: GameMode, category: Option<&str>) -> Result<MatchHandle> {
        let questions = self.bank.draw(mode, category, &mut thread_rng())?;
        start_match(
            MatchConfig {
                mode,
                questions,
                seed: None,
            },
            self.profile.clone(),
            self.scheduler.clone(),
        )
    }
}

async fn load_bank(cache: &ProfileCache) -> Result<QuestionBank> {
    let path = cache.dir().join(QUESTIONS_FILE);
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        match QuestionBank::load(&path).await {
            Ok(bank) if !bank.is_empty() => return Ok(bank),
            Ok(_) => warn!(path = %path.display(), "custom question bank is empty"),
            Err(e) => warn!(path = %path.display(), error = %e, "ignoring custom question bank"),
        }
    }
    QuestionBank::builtin()
}
