use async_trait::async_trait;
use std::io;

mod pipe;
mod process;

pub use pipe::*;
pub use process::*;

/// Trait for line-oriented message channels.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Io {
    /// Receives the next line.
    async fn recv(&mut self) -> io::Result<String>;

    /// Sends a line.
    async fn send(&mut self, msg: &str) -> io::Result<()>;

    /// Flushes the outbound buffer.
    async fn flush(&mut self) -> io::Result<()>;
}
