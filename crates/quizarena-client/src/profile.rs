//! The profile task: single owner of the player's progression state.
//!
//! All mutations arrive as [`ProfileCommand`]s over an mpsc channel and are
//! applied one at a time, so two purchases can never both pass the coin
//! check against the same balance. After every successful mutation the task
//! writes the local cache and hands a snapshot to the remote sync. Neither
//! step can undo the mutation: failures are logged and dropped.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};
use rand::Rng;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use quizarena_shared::achievements::{evaluate_all, AchievementProgress};
use quizarena_shared::cosmetics::CosmeticKind;
use quizarena_shared::daily::{DailyReward, DailyState, DailyStatus};
use quizarena_shared::error::ProgressionError;
use quizarena_shared::leaderboard::{generate_leaderboard, LeaderboardEntry};
use quizarena_shared::lifeline::LifelineKind;
use quizarena_shared::profile::{CosmeticPurchase, MatchRecorded, MatchResult, PlayerProfile};
use quizarena_shared::protocol::ProfileUpdate;

use crate::api_client::ApiClient;
use crate::cache::ProfileCache;
use crate::error::{ClientError, Result};

const COMMAND_BUFFER: usize = 64;

// ---------------------------------------------------------------------------
// Remote sync seam
// ---------------------------------------------------------------------------

/// Receives a snapshot after each successful mutation. Must not block:
/// implementations hand the work off and return immediately.
pub trait RemoteSync: Send + Sync + 'static {
    fn push(&self, update: ProfileUpdate);
}

/// Uploads profile snapshots in the background, newest first.
///
/// Snapshots pushed while an upload is in flight are coalesced: only the
/// latest one is sent next. A failed upload is logged and not retried.
pub struct SyncWorker {
    tx: watch::Sender<Option<ProfileUpdate>>,
}

impl SyncWorker {
    pub fn spawn(api: ApiClient) -> Arc<Self> {
        let (tx, mut rx) = watch::channel::<Option<ProfileUpdate>>(None);

        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let Some(update) = rx.borrow_and_update().clone() else {
                    continue;
                };
                match api.update_profile(&update).await {
                    Ok(user) => debug!(xp = user.xp, coins = user.coins, "profile synced"),
                    Err(e) => warn!(error = %e, "profile sync failed, keeping local state"),
                }
            }
            debug!("sync worker stopped");
        });

        Arc::new(Self { tx })
    }
}

impl RemoteSync for SyncWorker {
    fn push(&self, update: ProfileUpdate) {
        self.tx.send_replace(Some(update));
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

type Reply<T> = oneshot::Sender<T>;

#[derive(Debug)]
pub enum ProfileCommand {
    Snapshot(Reply<PlayerProfile>),
    BuyLifeline {
        kind: LifelineKind,
        reply: Reply<std::result::Result<u32, ProgressionError>>,
    },
    UseLifeline {
        kind: LifelineKind,
        reply: Reply<std::result::Result<u32, ProgressionError>>,
    },
    BuyFrame {
        id: String,
        reply: Reply<std::result::Result<CosmeticPurchase, ProgressionError>>,
    },
    BuyTheme {
        id: String,
        reply: Reply<std::result::Result<CosmeticPurchase, ProgressionError>>,
    },
    Equip {
        kind: CosmeticKind,
        id: String,
        reply: Reply<std::result::Result<(), ProgressionError>>,
    },
    AddXp {
        amount: u32,
        reply: Reply<PlayerProfile>,
    },
    AddCoins {
        amount: u32,
        reply: Reply<PlayerProfile>,
    },
    RecordMatch {
        result: MatchResult,
        reply: Reply<std::result::Result<MatchRecorded, ProgressionError>>,
    },
    DailyStatus {
        now: DateTime<FixedOffset>,
        reply: Reply<DailyStatus>,
    },
    ClaimDaily {
        now: DateTime<FixedOffset>,
        reply: Reply<std::result::Result<DailyReward, ProgressionError>>,
    },
    /// Adopt a profile fetched from the server, e.g. after login.
    Replace {
        profile: PlayerProfile,
        reply: Reply<()>,
    },
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

pub struct ProfileTask {
    profile: PlayerProfile,
    daily: DailyState,
    cache: Option<ProfileCache>,
    sync: Option<Arc<dyn RemoteSync>>,
}

impl ProfileTask {
    pub fn new(profile: PlayerProfile, daily: DailyState) -> Self {
        Self {
            profile,
            daily,
            cache: None,
            sync: None,
        }
    }

    pub fn with_cache(mut self, cache: ProfileCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_sync(mut self, sync: Arc<dyn RemoteSync>) -> Self {
        self.sync = Some(sync);
        self
    }

    /// Start serving commands on a background task.
    pub fn spawn(self) -> ProfileHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(self.run(rx));
        ProfileHandle { tx }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<ProfileCommand>) {
        info!(profile = %self.profile.id, "profile task started");

        while let Some(cmd) = rx.recv().await {
            match cmd {
                ProfileCommand::Snapshot(reply) => {
                    let _ = reply.send(self.profile.clone());
                }
                ProfileCommand::BuyLifeline { kind, reply } => {
                    let res = self.profile.buy_lifeline(kind);
                    if res.is_ok() {
                        debug!(%kind, coins = self.profile.coins, "lifeline bought");
                        self.persist(false).await;
                    }
                    let _ = reply.send(res);
                }
                ProfileCommand::UseLifeline { kind, reply } => {
                    let res = self.profile.use_lifeline(kind);
                    if res.is_ok() {
                        self.persist(false).await;
                    }
                    let _ = reply.send(res);
                }
                ProfileCommand::BuyFrame { id, reply } => {
                    let res = self.profile.buy_frame(&id);
                    self.after_cosmetic(CosmeticKind::Frame, &id, &res).await;
                    let _ = reply.send(res);
                }
                ProfileCommand::BuyTheme { id, reply } => {
                    let res = self.profile.buy_theme(&id);
                    self.after_cosmetic(CosmeticKind::Theme, &id, &res).await;
                    let _ = reply.send(res);
                }
                ProfileCommand::Equip { kind, id, reply } => {
                    let res = self.profile.equip(kind, &id);
                    if res.is_ok() {
                        debug!(%kind, id, "equipped");
                        self.persist(false).await;
                    }
                    let _ = reply.send(res);
                }
                ProfileCommand::AddXp { amount, reply } => {
                    self.profile.add_xp(amount);
                    self.persist(false).await;
                    let _ = reply.send(self.profile.clone());
                }
                ProfileCommand::AddCoins { amount, reply } => {
                    self.profile.add_coins(amount);
                    self.persist(false).await;
                    let _ = reply.send(self.profile.clone());
                }
                ProfileCommand::RecordMatch { result, reply } => {
                    let res = self.profile.record_match(result);
                    if let Ok(recorded) = &res {
                        if recorded.ranked_up() {
                            info!(rank = %recorded.rank_after.label, "ranked up");
                        }
                        self.persist(false).await;
                    }
                    let _ = reply.send(res);
                }
                ProfileCommand::DailyStatus { now, reply } => {
                    let _ = reply.send(self.daily.status(&now));
                }
                ProfileCommand::ClaimDaily { now, reply } => {
                    let res = self.daily.claim(&now);
                    if let Ok(reward) = &res {
                        self.profile.add_coins(reward.coins);
                        self.profile.add_xp(reward.xp);
                        info!(day = reward.day, streak = self.daily.streak, "daily reward claimed");
                        self.persist(true).await;
                    }
                    let _ = reply.send(res);
                }
                ProfileCommand::Replace { profile, reply } => {
                    self.profile = profile;
                    if let Some(cache) = &self.cache {
                        if let Err(e) = cache.save_profile(&self.profile).await {
                            warn!(error = %e, "failed to cache profile");
                        }
                    }
                    let _ = reply.send(());
                }
            }
        }

        debug!("profile task stopped");
    }

    async fn after_cosmetic(
        &self,
        kind: CosmeticKind,
        id: &str,
        res: &std::result::Result<CosmeticPurchase, ProgressionError>,
    ) {
        match res {
            Ok(CosmeticPurchase::Bought { coins_left }) => {
                info!(%kind, id, coins_left, "cosmetic bought");
                self.persist(false).await;
            }
            Ok(CosmeticPurchase::Equipped) => {
                debug!(%kind, id, "equipped");
                self.persist(false).await;
            }
            Err(_) => {}
        }
    }

    /// Write the cache and push to the remote. Best effort on both counts.
    async fn persist(&self, daily_changed: bool) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save_profile(&self.profile).await {
                warn!(error = %e, "failed to cache profile");
            }
            if daily_changed {
                if let Err(e) = cache.save_daily(&self.daily).await {
                    warn!(error = %e, "failed to cache daily state");
                }
            }
        }
        if let Some(sync) = &self.sync {
            sync.push(ProfileUpdate::from(&self.profile));
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cheap, cloneable front end to the profile task.
#[derive(Clone)]
pub struct ProfileHandle {
    tx: mpsc::Sender<ProfileCommand>,
}

impl ProfileHandle {
    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> ProfileCommand) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ClientError::ProfileTaskGone)?;
        rx.await.map_err(|_| ClientError::ProfileTaskGone)
    }

    pub async fn snapshot(&self) -> Result<PlayerProfile> {
        self.call(ProfileCommand::Snapshot).await
    }

    /// Buy one lifeline, returning the new count.
    pub async fn buy_lifeline(&self, kind: LifelineKind) -> Result<u32> {
        Ok(self
            .call(|reply| ProfileCommand::BuyLifeline { kind, reply })
            .await??)
    }

    /// Consume one lifeline, returning how many are left.
    pub async fn use_lifeline(&self, kind: LifelineKind) -> Result<u32> {
        Ok(self
            .call(|reply| ProfileCommand::UseLifeline { kind, reply })
            .await??)
    }

    /// Buy and equip a frame, or re-equip one already owned.
    pub async fn buy_frame(&self, id: impl Into<String>) -> Result<CosmeticPurchase> {
        let id = id.into();
        Ok(self
            .call(|reply| ProfileCommand::BuyFrame { id, reply })
            .await??)
    }

    pub async fn buy_theme(&self, id: impl Into<String>) -> Result<CosmeticPurchase> {
        let id = id.into();
        Ok(self
            .call(|reply| ProfileCommand::BuyTheme { id, reply })
            .await??)
    }

    pub async fn equip(&self, kind: CosmeticKind, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        Ok(self
            .call(|reply| ProfileCommand::Equip { kind, id, reply })
            .await??)
    }

    pub async fn add_xp(&self, amount: u32) -> Result<PlayerProfile> {
        self.call(|reply| ProfileCommand::AddXp { amount, reply })
            .await
    }

    pub async fn add_coins(&self, amount: u32) -> Result<PlayerProfile> {
        self.call(|reply| ProfileCommand::AddCoins { amount, reply })
            .await
    }

    pub async fn record_match(&self, result: MatchResult) -> Result<MatchRecorded> {
        Ok(self
            .call(|reply| ProfileCommand::RecordMatch { result, reply })
            .await??)
    }

    pub async fn daily_status(&self) -> Result<DailyStatus> {
        self.daily_status_at(Local::now().fixed_offset()).await
    }

    pub async fn daily_status_at(&self, now: DateTime<FixedOffset>) -> Result<DailyStatus> {
        self.call(|reply| ProfileCommand::DailyStatus { now, reply })
            .await
    }

    /// Claim today's login reward in the device's local timezone.
    pub async fn claim_daily(&self) -> Result<DailyReward> {
        self.claim_daily_at(Local::now().fixed_offset()).await
    }

    pub async fn claim_daily_at(&self, now: DateTime<FixedOffset>) -> Result<DailyReward> {
        Ok(self
            .call(|reply| ProfileCommand::ClaimDaily { now, reply })
            .await??)
    }

    pub async fn replace(&self, profile: PlayerProfile) -> Result<()> {
        self.call(|reply| ProfileCommand::Replace { profile, reply })
            .await
    }

    pub async fn achievements(&self) -> Result<Vec<AchievementProgress>> {
        Ok(evaluate_all(&self.snapshot().await?))
    }

    /// A freshly synthesized leaderboard around the current player.
    pub async fn leaderboard<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        bots: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        let profile = self.snapshot().await?;
        Ok(generate_leaderboard(rng, &profile.name, profile.xp, bots))
    }
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

/// Pick the profile to start from: the server's copy when reachable and
/// signed in, else the cached copy.
pub async fn initial_profile(api: &ApiClient, cache: &ProfileCache) -> Option<PlayerProfile> {
    match api.me().await {
        Ok(user) => return Some(user.to_profile()),
        Err(e) => debug!(error = %e, "no server profile, trying cache"),
    }
    match cache.load_profile().await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(error = %e, "unreadable profile cache");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSync {
        pushed: Mutex<Vec<ProfileUpdate>>,
    }

    impl RemoteSync for RecordingSync {
        fn push(&self, update: ProfileUpdate) {
            self.pushed.lock().unwrap().push(update);
        }
    }

    fn spawn_fresh() -> (ProfileHandle, Arc<RecordingSync>) {
        let sync = Arc::new(RecordingSync::default());
        let handle = ProfileTask::new(PlayerProfile::new("u1", "Ada"), DailyState::default())
            .with_sync(sync.clone())
            .spawn();
        (handle, sync)
    }

    fn result(position: u32) -> MatchResult {
        MatchResult {
            id: format!("m_{position}"),
            date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            position,
            score: 900,
            total_players: 10,
            xp_gained: 70,
            coins_gained: 105,
        }
    }

    #[tokio::test]
    async fn concurrent_purchases_never_overspend() {
        let (handle, _) = spawn_fresh();
        // 500 coins buy exactly five shields at 100 each.
        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let h = handle.clone();
                tokio::spawn(async move { h.buy_lifeline(LifelineKind::Shield).await })
            })
            .collect();

        let mut ok = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => ok += 1,
                Err(ClientError::Progression(ProgressionError::InsufficientCoins { .. })) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        let profile = handle.snapshot().await.unwrap();
        assert_eq!(ok, 5);
        assert_eq!(profile.coins, 0);
        assert_eq!(profile.lifeline_count(LifelineKind::Shield), 6);
    }

    #[tokio::test]
    async fn concurrent_frame_purchases_spend_once() {
        let (handle, sync) = spawn_fresh();
        let attempts: Vec<_> = ["frame_gold", "frame_neon", "frame_gold"]
            .into_iter()
            .map(|id| {
                let h = handle.clone();
                tokio::spawn(async move { h.buy_frame(id).await })
            })
            .collect();
        let mut outcomes = Vec::new();
        for attempt in attempts {
            outcomes.push(attempt.await.unwrap());
        }

        // 500 coins cover one 500-coin frame. Whichever lands second is
        // refused, a repeat of the bought one only re-equips it.
        let bought = outcomes
            .iter()
            .filter(|o| matches!(o, Ok(CosmeticPurchase::Bought { .. })))
            .count();
        assert_eq!(bought, 1);
        let profile = handle.snapshot().await.unwrap();
        assert_eq!(profile.coins, 0);
        assert_eq!(profile.owned_frames.len(), 2);
        assert!(profile.owns(CosmeticKind::Frame, &profile.equipped_frame));

        let pushed = sync.pushed.lock().unwrap();
        assert_eq!(pushed.last().unwrap().owned_frames, Some(profile.owned_frames.clone()));
    }

    #[tokio::test]
    async fn theme_purchase_then_reequip() {
        let (handle, _) = spawn_fresh();
        handle.add_coins(300).await.unwrap();

        assert_eq!(
            handle.buy_theme("theme_galaxy").await.unwrap(),
            CosmeticPurchase::Bought { coins_left: 200 }
        );
        assert!(matches!(
            handle.buy_theme("theme_aurora").await,
            Err(ClientError::Progression(ProgressionError::InsufficientCoins {
                needed: 800,
                available: 200
            }))
        ));

        handle.equip(CosmeticKind::Theme, "default").await.unwrap();
        assert_eq!(
            handle.buy_theme("theme_galaxy").await.unwrap(),
            CosmeticPurchase::Equipped
        );
        assert!(matches!(
            handle.equip(CosmeticKind::Theme, "theme_royal").await,
            Err(ClientError::Progression(ProgressionError::NotOwned { .. }))
        ));

        let profile = handle.snapshot().await.unwrap();
        assert_eq!(profile.coins, 200);
        assert_eq!(profile.equipped_theme, "theme_galaxy");
    }

    #[tokio::test]
    async fn use_lifeline_until_empty() {
        let (handle, sync) = spawn_fresh();
        assert_eq!(handle.use_lifeline(LifelineKind::TimeFreeze).await.unwrap(), 0);
        let err = handle
            .use_lifeline(LifelineKind::TimeFreeze)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Progression(ProgressionError::NoLifelineLeft(LifelineKind::TimeFreeze))
        ));
        // Only the successful use was synced.
        assert_eq!(sync.pushed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn record_match_updates_counters_and_syncs() {
        let (handle, sync) = spawn_fresh();
        let recorded = handle.record_match(result(4)).await.unwrap();
        assert!(!recorded.ranked_up());

        let profile = handle.snapshot().await.unwrap();
        assert_eq!(profile.games_played, 1);
        assert_eq!(profile.losses, 1);
        assert_eq!(profile.xp, 70);
        assert_eq!(profile.coins, 605);

        let pushed = sync.pushed.lock().unwrap();
        let last = pushed.last().unwrap();
        assert_eq!(last.xp, Some(70));
        assert_eq!(last.recent_matches.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn daily_claim_credits_profile_once_per_day() {
        let (handle, _) = spawn_fresh();
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let morning = tz.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();

        assert!(handle.daily_status_at(morning).await.unwrap().claimable);
        let reward = handle.claim_daily_at(morning).await.unwrap();
        assert_eq!((reward.coins, reward.xp), (50, 10));

        let evening = tz.with_ymd_and_hms(2026, 5, 1, 23, 30, 0).unwrap();
        assert!(matches!(
            handle.claim_daily_at(evening).await,
            Err(ClientError::Progression(ProgressionError::AlreadyClaimedToday))
        ));

        let next_day = tz.with_ymd_and_hms(2026, 5, 2, 0, 10, 0).unwrap();
        let reward = handle.claim_daily_at(next_day).await.unwrap();
        assert_eq!(reward.day, 2);

        let profile = handle.snapshot().await.unwrap();
        assert_eq!(profile.coins, 500 + 50 + 75);
        assert_eq!(profile.xp, 10 + 15);
    }

    #[tokio::test]
    async fn mutations_are_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProfileCache::new(dir.path());
        let handle = ProfileTask::new(PlayerProfile::new("u1", "Ada"), DailyState::default())
            .with_cache(cache.clone())
            .spawn();

        handle.add_coins(25).await.unwrap();
        let cached = cache.load_profile().await.unwrap().unwrap();
        assert_eq!(cached.coins, 525);

        let tz = FixedOffset::east_opt(0).unwrap();
        handle
            .claim_daily_at(tz.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap())
            .await
            .unwrap();
        assert_eq!(cache.load_daily().await.unwrap().streak, 1);
    }

    #[tokio::test]
    async fn views_derive_from_snapshot() {
        let (handle, _) = spawn_fresh();
        handle.add_xp(1200).await.unwrap();

        let achievements = handle.achievements().await.unwrap();
        assert!(achievements
            .iter()
            .any(|a| a.achievement.id == "xp_1000" && a.unlocked));

        let mut rng = StdRng::seed_from_u64(3);
        let board = handle.leaderboard(&mut rng, 15).await.unwrap();
        assert_eq!(board.len(), 16);
        assert_eq!(board.iter().filter(|e| e.is_player).count(), 1);
    }

    #[tokio::test]
    async fn dropped_task_reports_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = ProfileHandle { tx };
        assert!(matches!(
            handle.snapshot().await,
            Err(ClientError::ProfileTaskGone)
        ));
    }
}
