use clap::Parser;
use gavel_core::models::Config;
use gavel_sqlite::db::{self, Database};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod gateway;

#[tokio::main]
async fn main() -> Result<(), db::Error> {
    // By convention, we leverage `tracing` to instrument and log the
    // bidding, scheduling, and settlement paths. Accordingly, we likely
    // want to subscribe to these events so we can write them to stdio
    // and possibly some durable location.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // We will need to collect whatever data is necessary to configure
    // the API server, the scheduler, and the record store. The `Args`
    // struct, defined after this function, does this job for us.
    let args = Args::import();

    match args {
        Ok(args) => {
            let database = Database::open(
                args.database.as_ref(),
                Some(&Config {
                    ending_soon_within: args.ending_soon.into(),
                    settlement_timeout: args.settlement_timeout.into(),
                }),
            )?;

            // Finally, we hand everything to the server module, which
            // runs the HTTP API, the lifecycle scheduler, and the
            // settlement worker until one of them gives out.
            gavel_server::start(
                args.api_port,
                database,
                gateway::LogSettlement,
                args.sweep_every.into(),
            )
            .await;
        }
        Err(e) => {
            let _ = e.print();
        }
    }

    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The port to listen on
    #[arg(long, default_value_t = 8080, env = "API_PORT")]
    pub api_port: u16,

    /// The location of the auction database (if omitted, use an in-memory db)
    #[arg(long, env = "DATABASE")]
    pub database: Option<std::path::PathBuf>,

    /// How often the lifecycle scheduler sweeps the store
    #[arg(long, default_value = "1s", env = "SWEEP_EVERY")]
    pub sweep_every: humantime::Duration,

    /// How close to its end a live auction is announced as ending soon
    #[arg(long, default_value = "5m", env = "ENDING_SOON")]
    pub ending_soon: humantime::Duration,

    /// How long to wait on the payment provider before recording a failure
    #[arg(long, default_value = "30s", env = "SETTLEMENT_TIMEOUT")]
    pub settlement_timeout: humantime::Duration,
}

impl Args {
    pub fn import() -> Result<Self, clap::Error> {
        // Attempt to load a .env file, but don't sweat it if one is not found.
        let _ = dotenvy::dotenv();
        Self::try_parse()
    }
}
