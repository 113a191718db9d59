//! Match sessions.
//!
//! A match runs on its own task that owns a [`MatchState`] and serves both
//! player actions and timer events from one channel. The per-question
//! countdown, the simulated opponents and the pause between questions are
//! timers on the shared [`Scheduler`], keyed by the match's [`SessionId`]
//! and cancelled whenever the match moves to the next question or ends.
//! Timers hold only a weak sender, so dropping the [`MatchHandle`] ends the
//! match without recording it.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{Local, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use quizarena_shared::constants::{CLASSIC_PLAYERS, TIME_FREEZE_SECS, TIME_PER_QUESTION_SECS};
use quizarena_shared::lifeline::LifelineKind;
use quizarena_shared::profile::{MatchRecorded, MatchResult};
use quizarena_shared::questions::Question;
use quizarena_shared::rewards::{question_points, settle, FinalScores, MatchReward};
use quizarena_shared::types::GameMode;

use crate::error::{ClientError, Result};
use crate::profile::ProfileHandle;
use crate::scheduler::{Scheduler, SessionId};

/// Pause between closing a question and showing the next one.
pub const REVEAL_DELAY: Duration = Duration::from_millis(1200);

const TICK: Duration = Duration::from_secs(1);
const INPUT_BUFFER: usize = 32;

/// How a simulated player answers: hit rate, points range on a hit and the
/// delay before answering, both ranges half-open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotProfile {
    pub accuracy: f64,
    pub points: (u32, u32),
    pub delay_ms: (u64, u64),
}

impl BotProfile {
    fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if rng.gen_bool(self.accuracy) {
            rng.gen_range(self.points.0..self.points.1)
        } else {
            0
        }
    }

    fn delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.gen_range(self.delay_ms.0..self.delay_ms.1))
    }
}

/// Classic bots answer when the question closes.
pub const CLASSIC_BOT: BotProfile = BotProfile {
    accuracy: 0.65,
    points: (50, 150),
    delay_ms: (0, 1),
};

pub const DUEL_OPPONENT: BotProfile = BotProfile {
    accuracy: 0.6,
    points: (40, 120),
    delay_ms: (2_000, 10_000),
};

pub const TEAMMATE: BotProfile = BotProfile {
    accuracy: 0.55,
    points: (40, 110),
    delay_ms: (3_000, 10_000),
};

pub const ENEMY_TEAM: BotProfile = BotProfile {
    accuracy: 0.6,
    points: (40, 120),
    delay_ms: (2_000, 10_000),
};

/// A simulated participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    Opponent(usize),
    Teammate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The countdown is running and the player may answer.
    Answering,
    /// The question is closed; the next one follows after [`REVEAL_DELAY`].
    Revealing,
    Finished,
}

/// The feedback signal the UI should play for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Success,
    Failure,
    /// A wrong answer absorbed by the shield.
    Suppressed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_index: usize,
    pub points: u32,
    pub feedback: Feedback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifelineEffect {
    HiddenOptions(Vec<usize>),
    Frozen { secs: u64 },
    ShieldArmed,
    /// The lifeline is already in effect; nothing was consumed.
    AlreadyActive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub session: SessionId,
    pub mode: GameMode,
    pub phase: Phase,
    pub question_index: usize,
    pub question_count: usize,
    pub question: Option<Question>,
    pub remaining_secs: u32,
    pub frozen: bool,
    pub hidden_options: Vec<usize>,
    pub shield_active: bool,
    pub player_score: u32,
    /// Player plus teammate, in team matches.
    pub team_score: Option<u32>,
    pub opponent_scores: Vec<u32>,
}

/// Everything a finished match produced.
#[derive(Debug, Clone)]
pub struct MatchSummary {
    pub scores: FinalScores,
    pub reward: MatchReward,
    pub result: MatchResult,
    /// `None` when the profile task could not record the result.
    pub recorded: Option<MatchRecorded>,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The rules of a match, free of timers and channels.
#[derive(Debug, Clone)]
pub struct MatchState {
    mode: GameMode,
    questions: Vec<Question>,
    index: usize,
    phase: Phase,
    remaining_secs: u32,
    frozen: bool,
    hidden: Vec<usize>,
    shield: bool,
    player_score: u32,
    teammate_score: u32,
    opponents: Vec<u32>,
    bots_answered: HashSet<Seat>,
}

impl MatchState {
    pub fn new(mode: GameMode, questions: Vec<Question>) -> Result<Self> {
        if questions.is_empty() {
            return Err(ClientError::InvalidMove(
                "A match needs at least one question".into(),
            ));
        }
        let opponents = match mode {
            GameMode::Classic => vec![0; (CLASSIC_PLAYERS - 1) as usize],
            GameMode::Duel | GameMode::Teams => vec![0],
        };
        Ok(Self {
            mode,
            questions,
            index: 0,
            phase: Phase::Answering,
            remaining_secs: TIME_PER_QUESTION_SECS,
            frozen: false,
            hidden: Vec::new(),
            shield: false,
            player_score: 0,
            teammate_score: 0,
            opponents,
            bots_answered: HashSet::new(),
        })
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn question(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    pub fn shield_active(&self) -> bool {
        self.shield
    }

    /// Simulated players that answer on their own timer, with their profile.
    pub fn scheduled_bots(&self) -> Vec<(Seat, BotProfile)> {
        match self.mode {
            GameMode::Classic => Vec::new(),
            GameMode::Duel => vec![(Seat::Opponent(0), DUEL_OPPONENT)],
            GameMode::Teams => vec![(Seat::Teammate, TEAMMATE), (Seat::Opponent(0), ENEMY_TEAM)],
        }
    }

    fn ensure_answering(&self) -> Result<&Question> {
        match (self.phase, self.question()) {
            (Phase::Answering, Some(q)) => Ok(q),
            (Phase::Finished, _) | (_, None) => {
                Err(ClientError::InvalidMove("The match is over".into()))
            }
            (Phase::Revealing, _) => {
                Err(ClientError::InvalidMove("This question is already closed".into()))
            }
        }
    }

    /// Answer the current question with option `choice`.
    pub fn answer<R: Rng + ?Sized>(&mut self, choice: usize, rng: &mut R) -> Result<AnswerOutcome> {
        let question = self.ensure_answering()?;
        if choice >= question.options.len() {
            return Err(ClientError::InvalidMove(format!("No option {choice}")));
        }
        if self.hidden.contains(&choice) {
            return Err(ClientError::InvalidMove("That option was removed".into()));
        }

        let correct_index = question.correct_index;
        let correct = choice == correct_index;
        let points = question_points(correct, self.remaining_secs);
        let feedback = if correct {
            Feedback::Success
        } else if self.shield {
            self.shield = false;
            Feedback::Suppressed
        } else {
            Feedback::Failure
        };
        self.player_score += points;
        // classic bots only move when the player commits an answer
        if self.mode == GameMode::Classic {
            for score in &mut self.opponents {
                *score += CLASSIC_BOT.roll(rng);
            }
        }
        self.close();

        Ok(AnswerOutcome {
            correct,
            correct_index,
            points,
            feedback,
        })
    }

    /// One second of countdown. Returns the timeout outcome when the clock
    /// runs out. A frozen clock does not move.
    pub fn tick(&mut self) -> Option<AnswerOutcome> {
        if self.phase != Phase::Answering || self.frozen {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }
        let correct_index = self.question()?.correct_index;
        self.close();
        Some(AnswerOutcome {
            correct: false,
            correct_index,
            points: 0,
            feedback: Feedback::Failure,
        })
    }

    fn close(&mut self) {
        self.phase = Phase::Revealing;
        self.frozen = false;
    }

    /// A scheduled bot answers. Returns the points it scored, or `None` when
    /// the answer no longer counts. A teammate answering first locks the
    /// team's answer and closes the question.
    pub fn bot_answered<R: Rng + ?Sized>(&mut self, seat: Seat, rng: &mut R) -> Option<u32> {
        if self.phase == Phase::Finished || !self.bots_answered.insert(seat) {
            return None;
        }
        match seat {
            Seat::Teammate => {
                if self.phase != Phase::Answering {
                    return None;
                }
                let points = TEAMMATE.roll(rng);
                self.teammate_score += points;
                self.close();
                Some(points)
            }
            Seat::Opponent(i) => {
                let profile = match self.mode {
                    GameMode::Teams => ENEMY_TEAM,
                    GameMode::Duel => DUEL_OPPONENT,
                    GameMode::Classic => CLASSIC_BOT,
                };
                let points = profile.roll(rng);
                *self.opponents.get_mut(i)? += points;
                Some(points)
            }
        }
    }

    /// Whether using `kind` now would change anything. `Ok(false)` means it
    /// is already in effect and must not be consumed again.
    pub fn lifeline_applies(&self, kind: LifelineKind) -> Result<bool> {
        self.ensure_answering()?;
        Ok(match kind {
            LifelineKind::FiftyFifty => self.hidden.is_empty(),
            LifelineKind::TimeFreeze => !self.frozen,
            LifelineKind::Shield => !self.shield,
        })
    }

    pub fn apply_lifeline<R: Rng + ?Sized>(
        &mut self,
        kind: LifelineKind,
        rng: &mut R,
    ) -> Result<LifelineEffect> {
        if !self.lifeline_applies(kind)? {
            return Ok(LifelineEffect::AlreadyActive);
        }
        Ok(match kind {
            LifelineKind::FiftyFifty => {
                let mut wrong = self.ensure_answering()?.wrong_indices();
                wrong.shuffle(rng);
                wrong.truncate(2);
                wrong.sort_unstable();
                self.hidden = wrong.clone();
                LifelineEffect::HiddenOptions(wrong)
            }
            LifelineKind::TimeFreeze => {
                self.frozen = true;
                LifelineEffect::Frozen {
                    secs: TIME_FREEZE_SECS,
                }
            }
            LifelineKind::Shield => {
                self.shield = true;
                LifelineEffect::ShieldArmed
            }
        })
    }

    /// End a freeze started on question `question`.
    pub fn unfreeze(&mut self, question: usize) {
        if question == self.index {
            self.frozen = false;
        }
    }

    /// Move past a closed question. An armed shield carries over.
    pub fn advance(&mut self) -> Phase {
        if self.phase != Phase::Revealing {
            return self.phase;
        }
        self.index += 1;
        self.hidden.clear();
        self.bots_answered.clear();
        self.frozen = false;
        self.remaining_secs = TIME_PER_QUESTION_SECS;
        self.phase = if self.index >= self.questions.len() {
            Phase::Finished
        } else {
            Phase::Answering
        };
        self.phase
    }

    pub fn final_scores(&self) -> FinalScores {
        let rival = self.opponents.first().copied().unwrap_or(0);
        match self.mode {
            GameMode::Classic => FinalScores::Classic {
                bot_scores: self.opponents.clone(),
                player: self.player_score,
            },
            GameMode::Duel => FinalScores::Duel {
                player: self.player_score,
                opponent: rival,
            },
            GameMode::Teams => FinalScores::Teams {
                team: self.player_score + self.teammate_score,
                enemy: rival,
            },
        }
    }

    pub fn snapshot(&self, session: SessionId) -> MatchSnapshot {
        MatchSnapshot {
            session,
            mode: self.mode,
            phase: self.phase,
            question_index: self.index,
            question_count: self.questions.len(),
            question: self.question().cloned(),
            remaining_secs: self.remaining_secs,
            frozen: self.frozen,
            hidden_options: self.hidden.clone(),
            shield_active: self.shield,
            player_score: self.player_score,
            team_score: (self.mode == GameMode::Teams)
                .then_some(self.player_score + self.teammate_score),
            opponent_scores: self.opponents.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session task
// ---------------------------------------------------------------------------

type Reply<T> = oneshot::Sender<T>;

enum MatchInput {
    Answer {
        choice: usize,
        reply: Reply<Result<AnswerOutcome>>,
    },
    UseLifeline {
        kind: LifelineKind,
        reply: Reply<Result<LifelineEffect>>,
    },
    Snapshot(Reply<MatchSnapshot>),
    Abort,
    Tick { question: usize },
    Bot { question: usize, seat: Seat },
    Unfreeze { question: usize },
    Advance { question: usize },
}

pub struct MatchConfig {
    pub mode: GameMode,
    pub questions: Vec<Question>,
    /// Seed for the bots and lifelines. `None` seeds from the OS.
    pub seed: Option<u64>,
}

/// Start a match on a background task.
pub fn start_match(
    config: MatchConfig,
    profile: ProfileHandle,
    scheduler: Scheduler,
) -> Result<MatchHandle> {
    let state = MatchState::new(config.mode, config.questions)?;
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let session = SessionId::new();
    let (tx, rx) = mpsc::channel(INPUT_BUFFER);
    let (done_tx, done_rx) = oneshot::channel();

    let task = MatchTask {
        session,
        state,
        rng,
        profile,
        scheduler,
        timers: tx.downgrade(),
        advance_scheduled: false,
        done: Some(done_tx),
    };
    info!(%session, mode = ?config.mode, "match started");
    tokio::spawn(task.run(rx));

    Ok(MatchHandle {
        session,
        tx,
        done: done_rx,
    })
}

struct MatchTask {
    session: SessionId,
    state: MatchState,
    rng: StdRng,
    profile: ProfileHandle,
    scheduler: Scheduler,
    timers: mpsc::WeakSender<MatchInput>,
    advance_scheduled: bool,
    done: Option<oneshot::Sender<MatchSummary>>,
}

impl MatchTask {
    async fn run(mut self, mut rx: mpsc::Receiver<MatchInput>) {
        self.begin_question();

        while let Some(input) = rx.recv().await {
            match input {
                MatchInput::Answer { choice, reply } => {
                    let res = self.state.answer(choice, &mut self.rng);
                    if let Ok(outcome) = &res {
                        debug!(session = %self.session, correct = outcome.correct, points = outcome.points, "answered");
                    }
                    let _ = reply.send(res);
                }
                MatchInput::UseLifeline { kind, reply } => {
                    let res = self.use_lifeline(kind).await;
                    let _ = reply.send(res);
                }
                MatchInput::Snapshot(reply) => {
                    let _ = reply.send(self.state.snapshot(self.session));
                }
                MatchInput::Abort => {
                    info!(session = %self.session, "match aborted");
                    break;
                }
                MatchInput::Tick { question } => {
                    if question == self.state.index() && self.state.tick().is_some() {
                        debug!(session = %self.session, question, "time up");
                    }
                }
                MatchInput::Bot { question, seat } => {
                    if question == self.state.index() {
                        if let Some(points) = self.state.bot_answered(seat, &mut self.rng) {
                            debug!(session = %self.session, ?seat, points, "bot answered");
                        }
                    }
                }
                MatchInput::Unfreeze { question } => self.state.unfreeze(question),
                MatchInput::Advance { question } => {
                    if question != self.state.index() {
                        continue;
                    }
                    self.scheduler.cancel(self.session);
                    if self.state.advance() == Phase::Finished {
                        self.finish().await;
                        break;
                    }
                    self.begin_question();
                }
            }

            if self.state.phase() == Phase::Revealing && !self.advance_scheduled {
                self.advance_scheduled = true;
                let question = self.state.index();
                self.schedule(REVEAL_DELAY, MatchInput::Advance { question });
            }
        }

        self.scheduler.cancel(self.session);
        debug!(session = %self.session, "match task stopped");
    }

    fn begin_question(&mut self) {
        let question = self.state.index();
        self.advance_scheduled = false;

        let timers = self.timers.clone();
        self.scheduler.every(self.session, TICK, move || {
            let timers = timers.clone();
            async move {
                match timers.upgrade() {
                    Some(tx) => tx.send(MatchInput::Tick { question }).await.is_ok(),
                    None => false,
                }
            }
        });

        for (seat, bot) in self.state.scheduled_bots() {
            let delay = bot.delay(&mut self.rng);
            self.schedule(delay, MatchInput::Bot { question, seat });
        }
    }

    fn schedule(&self, delay: Duration, input: MatchInput) {
        let timers = self.timers.clone();
        self.scheduler.after(self.session, delay, async move {
            if let Some(tx) = timers.upgrade() {
                let _ = tx.send(input).await;
            }
        });
    }

    async fn use_lifeline(&mut self, kind: LifelineKind) -> Result<LifelineEffect> {
        if !self.state.lifeline_applies(kind)? {
            return Ok(LifelineEffect::AlreadyActive);
        }
        let left = self.profile.use_lifeline(kind).await?;
        let effect = self.state.apply_lifeline(kind, &mut self.rng)?;
        if let LifelineEffect::Frozen { secs } = effect {
            let question = self.state.index();
            self.schedule(Duration::from_secs(secs), MatchInput::Unfreeze { question });
        }
        debug!(session = %self.session, %kind, left, "lifeline used");
        Ok(effect)
    }

    async fn finish(&mut self) {
        let scores = self.state.final_scores();
        let reward = settle(&scores);
        let result = reward.into_result(
            format!("m_{}", Utc::now().timestamp_millis()),
            Local::now().date_naive(),
            scores.player_score(),
        );
        let recorded = match self.profile.record_match(result.clone()).await {
            Ok(recorded) => Some(recorded),
            Err(e) => {
                warn!(session = %self.session, error = %e, "failed to record match");
                None
            }
        };
        info!(
            session = %self.session,
            position = reward.position,
            score = result.score,
            "match finished"
        );
        if let Some(done) = self.done.take() {
            let _ = done.send(MatchSummary {
                scores,
                reward,
                result,
                recorded,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Front end to a running match. Dropping it ends the match unrecorded.
pub struct MatchHandle {
    session: SessionId,
    tx: mpsc::Sender<MatchInput>,
    done: oneshot::Receiver<MatchSummary>,
}

impl MatchHandle {
    pub fn session(&self) -> SessionId {
        self.session
    }

    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> MatchInput) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ClientError::MatchClosed)?;
        rx.await.map_err(|_| ClientError::MatchClosed)
    }

    pub async fn answer(&self, choice: usize) -> Result<AnswerOutcome> {
        self.call(|reply| MatchInput::Answer { choice, reply })
            .await?
    }

    pub async fn use_lifeline(&self, kind: LifelineKind) -> Result<LifelineEffect> {
        self.call(|reply| MatchInput::UseLifeline { kind, reply })
            .await?
    }

    pub async fn snapshot(&self) -> Result<MatchSnapshot> {
        self.call(MatchInput::Snapshot).await
    }

    /// Stop the match and all of its timers without recording a result.
    pub async fn abort(&self) -> Result<()> {
        self.tx
            .send(MatchInput::Abort)
            .await
            .map_err(|_| ClientError::MatchClosed)
    }

    /// Wait for the last question to close and the result to be recorded.
    pub async fn wait(self) -> Result<MatchSummary> {
        self.done.await.map_err(|_| ClientError::MatchClosed)
    }
}
