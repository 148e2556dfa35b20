use clap::Parser;
use famcontracts_client::{Cli, run};

#[tokio::main]
async fn main() -> Result<(), famcontracts_client::AppError> {
    run(Cli::parse()).await
}
