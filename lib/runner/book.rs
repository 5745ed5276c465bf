use crate::chess::{Move, Position};
use crate::runner::{Level, Proposal, Propose};
use async_trait::async_trait;
use derive_more::{Display, Error, From};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use tracing::{debug, instrument};

/// A weighted book move.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct BookEntry {
    /// The recorded move.
    pub best: Move,

    /// How often it is to be played relative to its siblings.
    pub weight: u16,
}

/// The reason why the opening book could not be consulted.
#[derive(Debug, Display, Error, From)]
pub enum BookError {
    #[display(fmt = "failed to read the opening book")]
    Io(io::Error),

    #[display(fmt = "failed to parse the opening book")]
    Parse(ron::de::SpannedError),
}

/// An opening book of recorded moves for known positions.
///
/// The book is a RON file mapping positions, stripped of their move counters,
/// to weighted moves. It is read lazily, on the first request that consults
/// it.
#[derive(Debug)]
pub struct Book {
    path: String,
    entries: Option<HashMap<String, Vec<BookEntry>>>,
}

impl Book {
    /// Constructs [`Book`] backed by the RON file at `path`.
    pub fn new(path: String) -> Self {
        Book {
            path,
            entries: None,
        }
    }

    async fn load(&mut self) -> Result<&HashMap<String, Vec<BookEntry>>, BookError> {
        match &mut self.entries {
            Some(entries) => Ok(entries),
            entries => {
                let book = tokio::fs::read_to_string(&self.path).await?;
                Ok(entries.insert(ron::de::from_str(&book)?))
            }
        }
    }

    fn pick(entries: &[BookEntry]) -> Option<Move> {
        let total: u32 = entries.iter().map(|e| u32::from(e.weight)).sum();

        if total == 0 {
            return None;
        }

        let mut roll = rand::thread_rng().gen_range(0..total);

        for entry in entries {
            match roll.checked_sub(u32::from(entry.weight)) {
                Some(rest) => roll = rest,
                None => return Some(entry.best),
            }
        }

        None
    }
}

#[async_trait]
impl Propose for Book {
    type Error = BookError;

    #[instrument(level = "trace", skip(self), err)]
    async fn init(&mut self) -> Result<(), Self::Error> {
        self.load().await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, pos), err, fields(%pos, %level))]
    async fn propose(
        &mut self,
        pos: &Position,
        level: Level,
    ) -> Result<Option<Proposal>, Self::Error> {
        let entries = self.load().await?;

        let best = entries
            .get(&pos.key())
            .and_then(|entries| Self::pick(entries));

        if best.is_none() {
            debug!("the book does not cover this position");
        }

        Ok(best.map(|best| Proposal::new(best, None)))
    }
}
