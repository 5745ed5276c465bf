use anyhow::Error as Anyhow;
use clap::Parser;
use lib::chess::Position;
use lib::kibitzer::{GameEvent, KibitzerConfig};
use lib::persist::FileStore;
use tracing::{info, instrument};

/// Asks the configured backends for the best move in a position.
#[derive(Debug, Parser)]
#[clap(disable_help_flag = true, disable_version_flag = true)]
pub struct Advise {
    /// The player configuration.
    #[clap(short, long, default_value = "(engine: \"stockfish\")")]
    config: KibitzerConfig,

    /// Where the session state is kept.
    #[clap(short, long, default_value = "kibitzer.ron")]
    session: String,

    /// The position to advise on, in FEN notation.
    #[clap(default_value_t)]
    pos: Position,
}

impl Advise {
    #[instrument(level = "trace", skip(self), err)]
    pub async fn execute(self) -> Result<(), Anyhow> {
        let store = FileStore::open(&self.session)?;
        let mut kibitzer = self.config.spawn(store)?;

        kibitzer.notify(GameEvent::Restored(self.pos.ply()));

        let mut best = None;
        kibitzer.advise(&self.pos, |m| best = Some(*m)).await?;

        if let Some(best) = best {
            match kibitzer.score() {
                Some(score) => info!(%best, %score),
                None => info!(%best),
            }

            println!("{}", best);
        }

        Ok(())
    }
}
