//! dnstally CLI entry point.

use dnstally_lib::cli::{self, Cli};
use dnstally_lib::core::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli::execute(cli).await
}
