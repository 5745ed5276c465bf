use crate::chess::{Move, Ply, Position};
use crate::eval::{History, Score};
use crate::io::Process;
use crate::persist::Store;
use crate::runner::{Book, Level, Proposal, Propose, Uci, UciOptions};
use derive_more::{Display, Error, From};
use futures_util::{future::try_join, TryFutureExt};
use serde::{Deserialize, Serialize};
use std::io;
use std::str::FromStr;
use tracing::{debug, instrument, warn};

mod selector;

pub use selector::*;

const KEY_LEVEL: &str = "level";
const KEY_SCORE: &str = "score";
const KEY_SCORE_HISTORY: &str = "scoreHistory";

/// Where the backends are in their lifecycle.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq)]
pub enum EngineState {
    /// Backend initialization has not completed yet.
    #[display(fmt = "loading")]
    Loading,

    /// Both backends are initialized.
    #[display(fmt = "loaded")]
    Loaded,

    /// A request is being serviced.
    #[display(fmt = "thinking")]
    Thinking,

    /// The most recent request completed.
    #[display(fmt = "ready")]
    Ready,
}

/// A game lifecycle notification from the host.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum GameEvent {
    /// A persisted session was restored; the game is viewed at the given ply.
    Restored(Ply),

    /// The last move was taken back.
    MoveUndone,

    /// A new game begins.
    NewGame,

    /// The game was (re)initialized, optionally overriding the level.
    Initialized(Option<Level>),
}

/// The reason why [`Kibitzer`] failed to produce a move.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum KibitzerError<B, E> {
    /// The opening book failed.
    #[display(fmt = "the opening book failed")]
    Book(B),

    /// The search engine failed.
    #[display(fmt = "the search engine failed")]
    Engine(E),

    /// Neither runner found a move.
    #[display(fmt = "no move found for position `{}` with the {} runner", _0, _1)]
    NoMove(#[error(not(source))] Position, #[error(not(source))] RunnerId),
}

/// The mutable state of the player.
#[derive(Debug, Clone, Eq, PartialEq)]
struct PlayerState {
    history: History,
    level: Level,
    engine_state: EngineState,
    current: RunnerId,
}

/// A player that selects moves by consulting an opening book and a search
/// engine.
///
/// The kibitzer owns both runners and the selection between them. It records
/// the evaluation reported with every move, re-expressed from the hosting
/// player's perspective, and writes level and score changes through to the
/// session store as they happen.
#[derive(Debug)]
pub struct Kibitzer<B, E, S> {
    book: Option<B>,
    engine: E,
    store: S,
    state: PlayerState,
}

impl<B, E, S> Kibitzer<B, E, S>
where
    B: Propose + Send,
    E: Propose + Send,
    S: Store,
{
    /// Constructs [`Kibitzer`] from its parts.
    ///
    /// Without a book the engine services every request.
    pub fn new(book: Option<B>, engine: E, level: Level, store: S) -> Self {
        let current = match book {
            Some(_) => RunnerId::Opening,
            None => RunnerId::Engine,
        };

        Kibitzer {
            book,
            engine,
            store,
            state: PlayerState {
                history: History::default(),
                level,
                engine_state: EngineState::Loading,
                current,
            },
        }
    }

    /// The configured difficulty level.
    pub fn level(&self) -> Level {
        self.state.level
    }

    /// Adjusts the difficulty level.
    pub fn set_level(&mut self, level: Level) {
        self.state.level = level;
        self.persist_level();
    }

    /// The current evaluation, from the hosting player's perspective.
    pub fn score(&self) -> Option<Score> {
        self.state.history.current()
    }

    /// The recorded evaluation history.
    pub fn history(&self) -> &History {
        &self.state.history
    }

    /// Where the backends are in their lifecycle.
    pub fn engine_state(&self) -> EngineState {
        self.state.engine_state
    }

    /// The runner that services the next request.
    ///
    /// The selection sticks across requests until a lifecycle event resets it
    /// or the level policy overrides it.
    pub fn current_runner(&self) -> RunnerId {
        self.state.current
    }

    fn preferred(&self) -> RunnerId {
        match self.book {
            Some(_) => RunnerId::Opening,
            None => RunnerId::Engine,
        }
    }

    fn persist_level(&mut self) {
        let level = self.state.level.to_string();
        self.store.save_value(KEY_LEVEL, &level);
    }

    fn persist_scores(&mut self) {
        match ron::ser::to_string(&self.state.history.current()) {
            Ok(score) => self.store.save_value(KEY_SCORE, &score),
            Err(e) => warn!("failed to serialize the score, {}", e),
        }

        match ron::ser::to_string(self.state.history.scores()) {
            Ok(scores) => self.store.save_value(KEY_SCORE_HISTORY, &scores),
            Err(e) => warn!("failed to serialize the score history, {}", e),
        }
    }

    fn record(&mut self, ply: Ply, score: Score) {
        self.state.history.record(ply, score);
        self.persist_scores();
    }

    /// Reacts to a game lifecycle notification.
    #[instrument(level = "debug", skip(self))]
    pub fn notify(&mut self, event: GameEvent) {
        match event {
            GameEvent::Restored(ply) => self.restore(ply),

            // undoing moves may return the game to book coverage
            GameEvent::MoveUndone => self.state.current = self.preferred(),

            GameEvent::NewGame => {
                self.state.history.reset();
                self.persist_scores();
            }

            GameEvent::Initialized(level) => {
                if let Some(level) = level {
                    self.set_level(level);
                }

                self.state.current = self.preferred();
            }
        }
    }

    fn restore(&mut self, ply: Ply) {
        if let Some(value) = self.store.load_value(KEY_LEVEL) {
            match value.trim().parse() {
                Ok(level) => self.state.level = level,
                Err(e) => warn!("ignoring persisted level `{}`, {}", value, e),
            }
        }

        if let Some(value) = self.store.load_value(KEY_SCORE_HISTORY) {
            match ron::de::from_str(&value) {
                Ok(scores) => self.state.history.restore(scores, ply),
                Err(e) => warn!("ignoring persisted score history, {}", e),
            }
        }
    }

    async fn init(&mut self) -> Result<(), KibitzerError<B::Error, E::Error>> {
        if self.state.engine_state != EngineState::Loading {
            return Ok(());
        }

        match &mut self.book {
            Some(book) => {
                try_join(
                    book.init().map_err(KibitzerError::Book),
                    self.engine.init().map_err(KibitzerError::Engine),
                )
                .await?;
            }

            None => self.engine.init().await.map_err(KibitzerError::Engine)?,
        }

        self.state.engine_state = EngineState::Loaded;

        Ok(())
    }

    async fn consult(
        &mut self,
        runner: RunnerId,
        pos: &Position,
    ) -> Result<Option<Proposal>, KibitzerError<B::Error, E::Error>> {
        let level = self.state.level;

        match (runner, &mut self.book) {
            (RunnerId::Opening, Some(book)) => {
                book.propose(pos, level).await.map_err(KibitzerError::Book)
            }

            _ => self
                .engine
                .propose(pos, level)
                .await
                .map_err(KibitzerError::Engine),
        }
    }

    /// Produces a move for the given position.
    ///
    /// The move is delivered through `callback`, invoked exactly once on
    /// success and never on failure.
    #[instrument(level = "debug", skip(self, pos, callback), err, fields(%pos))]
    pub async fn advise<F>(
        &mut self,
        pos: &Position,
        callback: F,
    ) -> Result<(), KibitzerError<B::Error, E::Error>>
    where
        F: FnOnce(&Move),
    {
        self.init().await?;

        self.state.engine_state = EngineState::Thinking;
        self.state.current = select(self.state.current, self.state.level);

        let first = self.state.current;
        let proposal = match self.consult(first, pos).await? {
            Some(proposal) => proposal,
            None => match first.fallback() {
                None => return Err(KibitzerError::NoMove(pos.clone(), first)),
                Some(second) => {
                    debug!(runner = %first, "no move found, falling back");
                    self.state.current = second;

                    match self.consult(second, pos).await? {
                        Some(proposal) => proposal,
                        None => return Err(KibitzerError::NoMove(pos.clone(), second)),
                    }
                }
            },
        };

        match proposal.score {
            // runners score the side to move; the host wants its player's perspective
            Some(Score::Cp(cp)) => self.record(pos.ply(), Score::Cp(cp.saturating_neg())),
            Some(score) => self.record(pos.ply(), score),
            None => {
                self.state.history.clear_current();
                self.persist_scores();
            }
        }

        self.state.engine_state = EngineState::Ready;
        callback(&proposal.best);

        Ok(())
    }
}

/// The reason why parsing [`KibitzerConfig`] failed.
#[derive(Debug, Display, Eq, PartialEq, Error, From)]
#[display(fmt = "failed to parse kibitzer configuration")]
pub struct ParseConfigError(ron::de::SpannedError);

/// Runtime configuration for a [`Kibitzer`].
#[derive(Debug, Display, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(deny_unknown_fields)]
#[display(fmt = "{}", "ron::ser::to_string(self).unwrap()")]
pub struct KibitzerConfig {
    /// The path to the UCI engine executable.
    pub engine: String,

    /// The path to the opening book, if any.
    #[serde(default)]
    pub book: Option<String>,

    /// The difficulty level.
    #[serde(default)]
    pub level: Level,

    /// Engine options.
    #[serde(default)]
    pub options: UciOptions,
}

impl FromStr for KibitzerConfig {
    type Err = ParseConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ron::de::from_str(s)?)
    }
}

impl KibitzerConfig {
    /// Spawns the engine process and assembles the player.
    #[instrument(level = "trace", skip(store), err)]
    pub fn spawn<S: Store>(self, store: S) -> io::Result<Kibitzer<Book, Uci<Process>, S>> {
        let engine = Uci::new(Process::spawn(&self.engine)?, self.options);
        let book = self.book.map(Book::new);
        Ok(Kibitzer::new(book, engine, self.level, store))
    }
}
