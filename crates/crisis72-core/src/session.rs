//! The live game session.
//!
//! [`GameSession`] owns the single run the server hosts: game state, the
//! step on screen, the decision timer and the final report. All mutable
//! state sits behind one [`tokio::sync::Mutex`] which is never held across
//! a provider call.
//!
//! # Concurrency rules
//!
//! - **Loading fence**: while a start, next-step or report request is in
//!   flight, `start`, `choose` and `retry_next_step` fail with
//!   [`SessionError::Busy`]. The advisor is independent and may overlap.
//! - **Owned round-trips**: every provider request that holds the loading
//!   fence runs in a task spawned by the session. Dropping the caller's
//!   future detaches from that task; the result is still installed and
//!   `loading` is always cleared.
//! - **Generation fence**: `start` and `restart` bump a generation counter.
//!   A provider response carrying an older generation is discarded.
//! - **Single countdown**: the decision timer is ticked only by the task
//!   returned from [`spawn_timer_driver`], which never waits on the
//!   provider and re-phases its interval whenever a new step is presented.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crisis72_types::{
    CrisisEvent, EndReason, GameMode, GameState, ReportSource, SessionEvent, SessionId,
    SessionPhase, SessionSnapshot, SimulationResult, SimulationStep,
};
use tokio::sync::{Mutex, Notify, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{ReportConfig, RulesConfig};
use crate::content::{ContentError, ContentProvider, advice_or_fallback, validate_step};
use crate::report::{fallback_report, produce_report};
use crate::rules::{self, RuleError};
use crate::timer::{DecisionTimer, TickOutcome, TimerError};

/// Shown when the first step cannot be produced.
pub const START_FAILED_MESSAGE: &str = "Error al inicializar la simulación. Verifica tu API Key.";

/// Shown when the next step cannot be produced.
pub const NEXT_STEP_FAILED_MESSAGE: &str =
    "No se pudo obtener el siguiente paso de la simulación. Intenta de nuevo.";

/// Buffered events per subscriber before it starts lagging.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Errors returned by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A provider request is already in flight.
    #[error("a request is already in progress")]
    Busy,

    /// The operation does not apply to the current screen.
    #[error("operation not allowed in phase {phase:?}")]
    WrongPhase {
        /// Phase the session was in.
        phase: SessionPhase,
    },

    /// The chosen option id is not part of the step on screen.
    #[error("unknown option {option_id}")]
    UnknownOption {
        /// The rejected id.
        option_id: String,
    },

    /// The turn could not be applied.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// The content provider failed. `message` is shown to the player.
    #[error("{message}")]
    Content {
        /// User-facing message.
        message: String,
        /// The underlying provider error.
        #[source]
        source: ContentError,
    },

    /// The session was restarted while the request was in flight.
    #[error("the session was restarted before the request completed")]
    Superseded,

    /// The request task died before installing its result. The session
    /// has been put back into a playable phase.
    #[error("the request was interrupted: {0}")]
    Interrupted(String),
}

/// Mutable session state. Only touched with the mutex held.
#[derive(Debug)]
struct Inner {
    session_id: SessionId,
    generation: u64,
    phase: SessionPhase,
    loading: bool,
    crisis: Option<CrisisEvent>,
    state: GameState,
    step: Option<SimulationStep>,
    pending_choice: Option<String>,
    timer: DecisionTimer,
    end_reason: Option<EndReason>,
    report: Option<SimulationResult>,
    report_source: Option<ReportSource>,
    last_error: Option<String>,
    started_at: Option<DateTime<Utc>>,
}

impl Inner {
    /// Drop everything from the previous run and bump the generation.
    fn reset(&mut self, mode: GameMode) {
        self.session_id = SessionId::new();
        self.generation = self.generation.saturating_add(1);
        self.phase = SessionPhase::Intro;
        self.loading = false;
        self.crisis = None;
        self.state = rules::new_game(mode);
        self.step = None;
        self.pending_choice = None;
        self.timer.stop();
        self.end_reason = None;
        self.report = None;
        self.report_source = None;
        self.last_error = None;
        self.started_at = None;
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            generation: self.generation,
            phase: self.phase,
            loading: self.loading,
            crisis: self.crisis,
            state: self.state.clone(),
            current_step: self.step.clone(),
            timer: self.timer.status(),
            end_reason: self.end_reason,
            report: self.report.clone(),
            report_source: self.report_source,
            last_error: self.last_error.clone(),
            started_at: self.started_at,
        }
    }

    /// Put a freshly generated step on screen and restart the countdown.
    fn present(&mut self, step: SimulationStep) {
        self.step = Some(step);
        self.pending_choice = None;
        self.phase = SessionPhase::Playing;
        self.last_error = None;
        self.timer.start();
    }

    /// Enter the reporting phase for a finished run.
    fn end_run(&mut self, reason: EndReason) {
        self.end_reason = Some(reason);
        self.phase = SessionPhase::Reporting;
        self.loading = true;
        self.timer.stop();
    }

    fn install_report(&mut self, report: SimulationResult, source: ReportSource) {
        self.state.achievements.clone_from(&report.achievements);
        self.report = Some(report);
        self.report_source = Some(source);
        self.phase = SessionPhase::Finished;
        self.loading = false;
    }

    const fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.loading {
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    fn ensure_phase(&self, expected: SessionPhase) -> Result<(), SessionError> {
        if self.phase != expected {
            return Err(SessionError::WrongPhase { phase: self.phase });
        }
        Ok(())
    }
}

/// The single game session hosted by the server.
#[derive(Debug)]
pub struct GameSession<P> {
    provider: P,
    rules: RulesConfig,
    report: ReportConfig,
    inner: Mutex<Inner>,
    events: broadcast::Sender<SessionEvent>,
    presented: Notify,
}

impl<P: ContentProvider> GameSession<P> {
    /// Create a session sitting on the intro screen.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidConfig`] if the decision limit is zero.
    pub fn new(provider: P, rules: RulesConfig, report: ReportConfig) -> Result<Self, TimerError> {
        let timer = DecisionTimer::new(rules.decision_time_limit_secs, rules.urgent_threshold_secs)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            provider,
            rules,
            report,
            inner: Mutex::new(Inner {
                session_id: SessionId::new(),
                generation: 0,
                phase: SessionPhase::Intro,
                loading: false,
                crisis: None,
                state: rules::new_game(GameMode::default()),
                step: None,
                pending_choice: None,
                timer,
                end_reason: None,
                report: None,
                report_source: None,
                last_error: None,
                started_at: None,
            }),
            events,
            presented: Notify::new(),
        })
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Current snapshot.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// The final report, once available.
    pub async fn report(&self) -> Option<SimulationResult> {
        self.inner.lock().await.report.clone()
    }

    /// The rules this session plays by.
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    fn publish(&self, inner: &Inner) -> SessionSnapshot {
        let snapshot = inner.snapshot();
        // No subscribers is fine.
        let _ = self.events.send(SessionEvent::Updated {
            snapshot: Box::new(snapshot.clone()),
        });
        snapshot
    }

    /// Put `step` on screen and tell the timer driver to re-phase.
    fn present(&self, inner: &mut Inner, step: SimulationStep) -> SessionSnapshot {
        inner.present(step);
        self.presented.notify_one();
        self.publish(inner)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Start a new run and fetch its first step.
    ///
    /// On failure the session returns to the intro screen with a
    /// user-facing error.
    pub async fn start(
        self: &Arc<Self>,
        crisis: CrisisEvent,
        mode: GameMode,
    ) -> Result<SessionSnapshot, SessionError> {
        let generation = {
            let mut inner = self.inner.lock().await;
            inner.ensure_idle()?;
            if !matches!(inner.phase, SessionPhase::Intro | SessionPhase::Finished) {
                return Err(SessionError::WrongPhase { phase: inner.phase });
            }
            inner.reset(mode);
            inner.crisis = Some(crisis);
            inner.started_at = Some(Utc::now());
            inner.loading = true;
            info!(
                session_id = %inner.session_id,
                generation = inner.generation,
                %crisis,
                %mode,
                "starting simulation"
            );
            self.publish(&inner);
            inner.generation
        };

        let session = Arc::clone(self);
        let task = tokio::spawn(async move {
            let result = session
                .provider
                .start_simulation(crisis, mode)
                .await
                .and_then(|step| validate_step(&step).map(|()| step));
            session.install_first_step(generation, result).await
        });
        self.join(task, generation).await
    }

    async fn install_first_step(
        &self,
        generation: u64,
        result: Result<SimulationStep, ContentError>,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!(generation, current = inner.generation, "discarding stale first step");
            return Err(SessionError::Superseded);
        }
        inner.loading = false;
        match result {
            Ok(step) => {
                info!(step = step.step, title = %step.title, "first step presented");
                Ok(self.present(&mut inner, step))
            }
            Err(source) => {
                warn!(error = %source, "failed to start simulation");
                inner.phase = SessionPhase::Intro;
                inner.last_error = Some(START_FAILED_MESSAGE.to_owned());
                self.publish(&inner);
                Err(SessionError::Content {
                    message: START_FAILED_MESSAGE.to_owned(),
                    source,
                })
            }
        }
    }

    /// Apply the player's decision, then fetch the next step or the report.
    ///
    /// A missing effect drops the turn and leaves the countdown running.
    pub async fn choose(self: &Arc<Self>, option_id: &str) -> Result<SessionSnapshot, SessionError> {
        let mut inner = self.inner.lock().await;
        inner.ensure_idle()?;
        inner.ensure_phase(SessionPhase::Playing)?;
        let Some(step) = inner.step.clone() else {
            return Err(SessionError::WrongPhase { phase: inner.phase });
        };
        if step.option(option_id).is_none() && step.effect(option_id).is_none() {
            return Err(SessionError::UnknownOption {
                option_id: option_id.to_owned(),
            });
        }

        let outcome = rules::resolve_choice(&inner.state, &step, option_id, self.rules.survival_hours)?;
        inner.state = outcome.state;
        let generation = inner.generation;

        if let Some(reason) = outcome.end {
            info!(
                ?reason,
                hours_passed = inner.state.hours_passed,
                score = inner.state.score,
                "run ended"
            );
            inner.end_run(reason);
            let state = inner.state.clone();
            self.publish(&inner);
            drop(inner);
            let task = self.spawn_report(generation, state, reason);
            return self.join(task, generation).await;
        }

        inner.timer.suspend();
        inner.loading = true;
        inner.pending_choice = Some(option_id.to_owned());
        let state = inner.state.clone();
        self.publish(&inner);
        drop(inner);

        let task = self.spawn_next_step(generation, step, option_id.to_owned(), state);
        self.join(task, generation).await
    }

    /// Ask again for the step that failed to arrive.
    pub async fn retry_next_step(self: &Arc<Self>) -> Result<SessionSnapshot, SessionError> {
        let mut inner = self.inner.lock().await;
        inner.ensure_idle()?;
        inner.ensure_phase(SessionPhase::AwaitingStep)?;
        let (Some(step), Some(option_id)) = (inner.step.clone(), inner.pending_choice.clone())
        else {
            return Err(SessionError::WrongPhase { phase: inner.phase });
        };
        inner.loading = true;
        inner.last_error = None;
        let generation = inner.generation;
        let state = inner.state.clone();
        self.publish(&inner);
        drop(inner);

        info!(step = step.step, option_id = %option_id, "retrying next step");
        let task = self.spawn_next_step(generation, step, option_id, state);
        self.join(task, generation).await
    }

    fn spawn_next_step(
        self: &Arc<Self>,
        generation: u64,
        step: SimulationStep,
        option_id: String,
        state: GameState,
    ) -> JoinHandle<Result<SessionSnapshot, SessionError>> {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            let result = session
                .provider
                .next_turn(&step, &option_id, &state)
                .await
                .and_then(|next| validate_step(&next).map(|()| next));
            session.install_next_step(generation, step.step, result).await
        })
    }

    async fn install_next_step(
        &self,
        generation: u64,
        previous: u32,
        result: Result<SimulationStep, ContentError>,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!(generation, current = inner.generation, "discarding stale next step");
            return Err(SessionError::Superseded);
        }
        inner.loading = false;
        match result {
            Ok(next) => {
                debug!(step = next.step, title = %next.title, "next step presented");
                Ok(self.present(&mut inner, next))
            }
            Err(source) => {
                warn!(error = %source, step = previous, "failed to fetch next step");
                inner.phase = SessionPhase::AwaitingStep;
                inner.timer.stop();
                inner.last_error = Some(NEXT_STEP_FAILED_MESSAGE.to_owned());
                self.publish(&inner);
                Err(SessionError::Content {
                    message: NEXT_STEP_FAILED_MESSAGE.to_owned(),
                    source,
                })
            }
        }
    }

    /// Produce the report for an ended run and install it.
    fn spawn_report(
        self: &Arc<Self>,
        generation: u64,
        state: GameState,
        reason: EndReason,
    ) -> JoinHandle<Result<SessionSnapshot, SessionError>> {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            let (report, source) =
                produce_report(&session.provider, &state, reason, &session.report).await;

            let mut inner = session.inner.lock().await;
            if inner.generation != generation {
                debug!(generation, current = inner.generation, "discarding stale report");
                return Err(SessionError::Superseded);
            }
            inner.install_report(report, source);
            Ok(session.publish(&inner))
        })
    }

    /// Wait for a spawned round-trip. A task that died without installing
    /// its result leaves the session recovered instead of loading.
    async fn join(
        &self,
        task: JoinHandle<Result<SessionSnapshot, SessionError>>,
        generation: u64,
    ) -> Result<SessionSnapshot, SessionError> {
        match task.await {
            Ok(result) => result,
            Err(join_error) => {
                error!(error = %join_error, generation, "provider round-trip task failed");
                self.recover(generation).await;
                Err(SessionError::Interrupted(join_error.to_string()))
            }
        }
    }

    /// Clear a loading fence whose round-trip will never complete.
    async fn recover(&self, generation: u64) {
        let mut inner = self.inner.lock().await;
        if inner.generation != generation || !inner.loading {
            return;
        }
        inner.loading = false;
        let phase = inner.phase;
        let has_step = inner.step.is_some();
        match phase {
            SessionPhase::Reporting => {
                let reason = inner.end_reason.unwrap_or(EndReason::SurvivalWindowElapsed);
                let report = fallback_report(&inner.state, reason);
                inner.install_report(report, ReportSource::Fallback);
            }
            _ if !has_step => {
                inner.phase = SessionPhase::Intro;
                inner.last_error = Some(START_FAILED_MESSAGE.to_owned());
            }
            _ => {
                inner.phase = SessionPhase::AwaitingStep;
                inner.timer.stop();
                inner.last_error = Some(NEXT_STEP_FAILED_MESSAGE.to_owned());
            }
        }
        self.publish(&inner);
    }

    /// Advance the decision timer by one second.
    ///
    /// When the countdown expires the timeout penalty is applied and the
    /// report is requested in a detached task, so the next tick is never
    /// held up by the provider.
    pub async fn tick_timer(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        match inner.timer.tick() {
            TickOutcome::Ignored => {}
            TickOutcome::Counting(remaining) => {
                debug!(remaining, "decision timer tick");
                let _ = self.events.send(SessionEvent::TimerTick {
                    session_id: inner.session_id,
                    timer: inner.timer.status(),
                });
            }
            TickOutcome::Expired => {
                let step_number = inner.step.as_ref().map_or(0, |step| step.step);
                let limit = inner.timer.limit();
                let penalized = rules::apply_timeout(&inner.state, step_number, limit);
                inner.state = penalized;
                warn!(step = step_number, limit_secs = limit, "decision timer expired");
                inner.end_run(EndReason::DecisionTimeout);
                let _ = self.events.send(SessionEvent::TimedOut {
                    session_id: inner.session_id,
                });
                let generation = inner.generation;
                let state = inner.state.clone();
                self.publish(&inner);
                drop(inner);

                let task = self.spawn_report(generation, state, EndReason::DecisionTimeout);
                let session = Arc::clone(self);
                tokio::spawn(async move {
                    if let Err(err) = session.join(task, generation).await {
                        debug!(error = %err, "timeout report not installed");
                    }
                });
            }
        }
    }

    /// Ask the advisor about the step on screen.
    ///
    /// Never fails on provider errors; those become fixed messages.
    pub async fn advise(&self) -> Result<String, SessionError> {
        let (step, state) = {
            let inner = self.inner.lock().await;
            let Some(step) = inner.step.clone() else {
                return Err(SessionError::WrongPhase { phase: inner.phase });
            };
            if inner.state.game_over {
                return Err(SessionError::WrongPhase { phase: inner.phase });
            }
            (step, inner.state.clone())
        };
        Ok(advice_or_fallback(self.provider.advise(&step, &state).await))
    }

    /// Abandon the current run and return to the intro screen.
    pub async fn restart(&self) -> SessionSnapshot {
        let mut inner = self.inner.lock().await;
        let mode = inner.state.mode;
        inner.reset(mode);
        info!(session_id = %inner.session_id, generation = inner.generation, "session restarted");
        self.publish(&inner)
    }
}

/// Drive the decision timer of `session` once per second until aborted.
///
/// The interval is re-phased each time a step is presented, so every step
/// gets its full decision window.
pub fn spawn_timer_driver<P: ContentProvider>(session: Arc<GameSession<P>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            tokio::select! {
                biased;
                () = session.presented.notified() => interval.reset(),
                _ = interval.tick() => session.tick_timer().await,
            }
        }
    })
}
