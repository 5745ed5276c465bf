use crate::chess::Position;
use crate::eval::Score;
use crate::io::Io;
use crate::runner::{Level, Proposal, Propose};
use anyhow::{Context, Error as Anyhow};
use async_trait::async_trait;
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{io, time::Duration};
use tokio::{runtime, task::block_in_place};
use tracing::{debug, error, instrument};
use vampirc_uci::{self as uci, UciFen, UciInfoAttribute, UciMessage};

/// Runtime configuration for a [`Uci`] runner.
#[derive(Debug, Display, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(deny_unknown_fields)]
#[display(fmt = "{}", "ron::ser::to_string(self).unwrap()")]
pub struct UciOptions {
    /// How long the engine may think per move.
    #[serde(default = "UciOptions::default_movetime", with = "humantime_serde")]
    pub movetime: Duration,

    /// Whether to switch the engine's debug mode on.
    #[serde(default)]
    pub debug: bool,

    /// Extra options to set during the handshake.
    #[serde(default)]
    pub params: HashMap<String, Option<String>>,
}

impl UciOptions {
    fn default_movetime() -> Duration {
        Duration::from_millis(1000)
    }
}

impl Default for UciOptions {
    fn default() -> Self {
        UciOptions {
            movetime: UciOptions::default_movetime(),
            debug: false,
            params: HashMap::new(),
        }
    }
}

/// The reason why the engine failed to propose a move.
#[derive(Debug, Display, Error, From)]
#[display(fmt = "the UCI engine encountered an error")]
pub struct UciError(#[from(forward)] io::Error);

/// A Universal Chess Interface client for a search engine.
#[derive(Debug)]
pub struct Uci<T: Io> {
    io: T,
    options: UciOptions,
    initialized: bool,
}

impl<T: Io + Send> Uci<T> {
    /// Constructs [`Uci`] over an [`Io`] channel to the engine.
    ///
    /// The handshake is deferred until the first request.
    pub fn new(io: T, options: UciOptions) -> Self {
        Uci {
            io,
            options,
            initialized: false,
        }
    }
}

/// Gracefully stops and quits the engine.
impl<T: Io> Drop for Uci<T> {
    #[instrument(level = "trace", skip(self))]
    fn drop(&mut self) {
        let result: Result<(), Anyhow> = block_in_place(|| {
            runtime::Handle::try_current()?.block_on(async {
                self.io.send(&UciMessage::Stop.to_string()).await?;
                self.io.send(&UciMessage::Quit.to_string()).await?;
                self.io.flush().await?;
                Ok(())
            })
        });

        if let Err(e) = result.context("failed to gracefully shutdown the uci engine") {
            error!("{:?}", e);
        }
    }
}

#[async_trait]
impl<T: Io + Send> Propose for Uci<T> {
    type Error = UciError;

    #[instrument(level = "trace", skip(self), err)]
    async fn init(&mut self) -> Result<(), Self::Error> {
        if self.initialized {
            return Ok(());
        }

        self.io.send(&UciMessage::Uci.to_string()).await?;
        self.io.flush().await?;

        while !matches!(uci::parse_one(self.io.recv().await?.trim()), UciMessage::UciOk) {}

        if self.options.debug {
            self.io.send(&UciMessage::Debug(true).to_string()).await?;
        }

        for (name, value) in self.options.params.clone() {
            let set_option = UciMessage::SetOption { name, value };
            self.io.send(&set_option.to_string()).await?;
        }

        self.io.send(&UciMessage::UciNewGame.to_string()).await?;
        self.io.send(&UciMessage::IsReady.to_string()).await?;
        self.io.flush().await?;

        while !matches!(
            uci::parse_one(self.io.recv().await?.trim()),
            UciMessage::ReadyOk
        ) {}

        self.initialized = true;

        Ok(())
    }

    #[instrument(level = "debug", skip(self, pos), err, fields(%pos, %level))]
    async fn propose(
        &mut self,
        pos: &Position,
        level: Level,
    ) -> Result<Option<Proposal>, Self::Error> {
        self.init().await?;

        let skill = UciMessage::SetOption {
            name: "Skill Level".to_string(),
            value: Some(level.to_string()),
        };

        let position = UciMessage::Position {
            startpos: false,
            fen: Some(UciFen(pos.to_string())),
            moves: Vec::new(),
        };

        let go = UciMessage::go_movetime(
            uci::Duration::from_std(self.options.movetime)
                .unwrap_or_else(|_| uci::Duration::max_value()),
        );

        self.io.send(&skill.to_string()).await?;
        self.io.send(&position.to_string()).await?;
        self.io.send(&go.to_string()).await?;
        self.io.flush().await?;

        let mut score = None;

        loop {
            match uci::parse_one(self.io.recv().await?.trim()) {
                UciMessage::Info(attrs) => {
                    for attr in attrs {
                        if let UciInfoAttribute::Score { cp, mate, .. } = attr {
                            if let Some(moves) = mate {
                                score = Some(Score::Mate(moves));
                            } else if let Some(cp) = cp {
                                score = Some(Score::Cp(cp));
                            }
                        }
                    }
                }

                UciMessage::BestMove { best_move, .. } => {
                    // e.g. stalemated positions resolve to `bestmove (none)`
                    break match best_move.to_string().parse() {
                        Ok(best) => Ok(Some(Proposal::new(best, score))),
                        Err(_) => {
                            debug!("the engine declined to move");
                            Ok(None)
                        }
                    };
                }

                UciMessage::Unknown(msg, _) if msg.trim_start().starts_with("bestmove") => {
                    debug!("the engine declined to move");
                    break Ok(None);
                }

                _ => {}
            }
        }
    }
}
