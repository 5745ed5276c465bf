use anyhow::Error as Anyhow;
use clap::Subcommand;
use derive_more::From;

mod advise;

#[derive(From, Subcommand)]
pub enum Applet {
    Advise(advise::Advise),
}

impl Applet {
    pub async fn execute(self) -> Result<(), Anyhow> {
        match self {
            Applet::Advise(a) => Ok(a.execute().await?),
        }
    }
}
