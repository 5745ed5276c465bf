use async_trait::async_trait;
use lib::chess::{Ply, Position};
use lib::eval::Score;
use lib::kibitzer::{GameEvent, Kibitzer, KibitzerError, RunnerId};
use lib::persist::Store;
use lib::runner::{Book, Level, Proposal, Propose};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::path::PathBuf;
use std::rc::Rc;

/// A scripted stand-in for the search engine.
struct Stub(Vec<Option<Proposal>>);

#[async_trait]
impl Propose for Stub {
    type Error = Infallible;

    async fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn propose(&mut self, _: &Position, _: Level) -> Result<Option<Proposal>, Self::Error> {
        Ok(self.0.remove(0))
    }
}

/// A [`Store`] the test can inspect after handing it over.
#[derive(Debug, Default, Clone)]
struct SharedStore(Rc<RefCell<HashMap<String, String>>>);

impl Store for SharedStore {
    fn load_value(&self, key: &str) -> Option<String> {
        self.0.borrow().get(key).cloned()
    }

    fn save_value(&mut self, key: &str, value: &str) {
        self.0.borrow_mut().insert(key.to_string(), value.to_string());
    }
}

fn write_book(name: &str, entries: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("kibitzer-advise-{}.ron", name));

    let body = format!("{{\"{}\": {}}}", Position::default().key(), entries);
    std::fs::write(&path, body).unwrap();

    path
}

fn level(n: u8) -> Level {
    Level::new(n).unwrap()
}

#[tokio::test]
async fn opening_moves_come_from_the_book_and_the_engine_takes_over() {
    let book = write_book("takeover", "[(best: \"e2e4\", weight: 1)]");
    let book = Book::new(book.to_string_lossy().into_owned());

    let engine = Stub(vec![Some(Proposal::new(
        "g1f3".parse().unwrap(),
        Some(Score::Cp(35)),
    ))]);

    let store = SharedStore::default();
    let mut kibitzer = Kibitzer::new(Some(book), engine, level(10), store.clone());

    let mut best = None;
    kibitzer
        .advise(&Position::default(), |m| best = Some(*m))
        .await
        .unwrap();

    assert_eq!(best, Some("e2e4".parse().unwrap()));
    assert_eq!(kibitzer.score(), None);

    // out of book; the engine answers and its score is recorded for the host
    let pos: Position = "rnbqkbnr/pppppppp/8/8/8/7P/PPPPPPP1/RNBQKBNR b KQkq - 0 1"
        .parse()
        .unwrap();

    let mut best = None;
    kibitzer.advise(&pos, |m| best = Some(*m)).await.unwrap();

    assert_eq!(best, Some("g1f3".parse().unwrap()));
    assert_eq!(kibitzer.score(), Some(Score::Cp(-35)));

    let persisted = store.load_value("scoreHistory").unwrap();
    let persisted: BTreeMap<Ply, Score> = ron::de::from_str(&persisted).unwrap();
    assert_eq!(persisted, BTreeMap::from([(Ply::new(1), Score::Cp(-35))]));
}

#[tokio::test]
async fn the_request_fails_if_neither_runner_finds_a_move() {
    let book = write_book("dry", "[]");
    let book = Book::new(book.to_string_lossy().into_owned());

    let engine = Stub(vec![None]);
    let mut kibitzer = Kibitzer::new(Some(book), engine, level(10), SharedStore::default());

    let pos = Position::default();

    let mut called = false;
    let result = kibitzer.advise(&pos, |_| called = true).await;

    match result {
        Err(KibitzerError::NoMove(failed, runner)) => {
            assert_eq!(failed, pos);
            assert_eq!(runner, RunnerId::Engine);
        }

        other => panic!("expected a fatal no-move error, got {:?}", other),
    }

    assert!(!called);
}

#[tokio::test]
async fn a_restored_session_resumes_level_and_score() {
    let store = SharedStore::default();

    {
        let engine = Stub(vec![Some(Proposal::new(
            "e2e4".parse().unwrap(),
            Some(Score::Cp(-20)),
        ))]);

        let mut kibitzer = Kibitzer::new(None::<Book>, engine, level(4), store.clone());

        kibitzer.notify(GameEvent::Initialized(Some(level(7))));

        kibitzer
            .advise(&Position::default(), |_| ())
            .await
            .unwrap();

        assert_eq!(kibitzer.score(), Some(Score::Cp(20)));
    }

    let engine = Stub(vec![]);
    let mut kibitzer = Kibitzer::new(None::<Book>, engine, level(1), store.clone());

    kibitzer.notify(GameEvent::Restored(Ply::new(0)));

    assert_eq!(kibitzer.level(), level(7));
    assert_eq!(kibitzer.score(), Some(Score::Cp(20)));
}
