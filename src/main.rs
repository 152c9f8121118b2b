/// Channel monitoring daemon.
///
/// Loads `chanmon.toml` (or the path given as the first argument), runs the
/// simulation ticker against PostgreSQL when `DATABASE_URL` is set and an
/// in-memory store otherwise, and prints a JSON trend summary on shutdown.
///
/// With `simulation.max_ticks` unset the ticker runs until Enter is pressed,
/// or until a store fault halts it. Without a console (stdin at EOF) it runs
/// until the process is stopped.

use std::error::Error;
use std::io::BufReader;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use chanmon_service::analysis::{aggregate, Aggregate};
use chanmon_service::config;
use chanmon_service::logging::{self, Component};
use chanmon_service::setpoint::SetpointStore;
use chanmon_service::simulation::{SimulationDriver, Ticker, TickerOptions, TickerReport};
use chanmon_service::store::{self, pg, InMemoryStore, PgStore, TimeSeriesStore};
use chanmon_service::vision::VisionFeed;

/// How often the console wait checks for a halted ticker.
const CONSOLE_POLL: Duration = Duration::from_millis(200);

#[derive(Serialize)]
struct RunSummary {
    run: TickerReport,
    trend: Aggregate,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::error(Component::System, None, &e.to_string());
            eprintln!("chanmon: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn open_store() -> Result<Arc<dyn TimeSeriesStore>, Box<dyn Error>> {
    match pg::database_url() {
        Some(_) => {
            let store = PgStore::connect_from_env()?;
            logging::info(Component::Store, None, "Connected to PostgreSQL");
            Ok(Arc::new(store))
        }
        None => {
            logging::warn(
                Component::Store,
                None,
                "DATABASE_URL not set; samples are kept in memory only",
            );
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let config_path = config::resolve_config_path(std::env::args().nth(1));
    let config = config::load_config(&config_path)?;

    logging::init_logger(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.timestamps,
    );
    logging::info(
        Component::Config,
        Some(config_path.display().to_string().as_str()),
        &format!(
            "Channel b={} m={} i={} n={}",
            config.channel.bottom_width,
            config.channel.side_slope,
            config.channel.bed_slope,
            config.channel.roughness
        ),
    );

    let store = open_store()?;
    let setpoints = Arc::new(SetpointStore::new(config.setpoint.to_setpoint()));
    let vision = Arc::new(VisionFeed::new());

    let driver = SimulationDriver::new(config.channel, config.simulation.clone(), Arc::clone(&setpoints))
        .with_vision(Arc::clone(&vision));

    let ticker = Ticker::spawn(
        driver,
        Arc::clone(&store),
        TickerOptions::from_config(&config),
        |out| {
            logging::debug(
                Component::Simulation,
                Some(format!("tick {}", out.tick).as_str()),
                &format!(
                    "h={:.3} m v={:.3} m/s Q={:.3} m³/s Fr={:.3} {} / {} safety={} ({:?})",
                    out.sample.depth,
                    out.sample.velocity,
                    out.sample.flow_rate,
                    out.sample.froude,
                    out.sample.regime,
                    out.sample.uniformity,
                    out.safety.score,
                    out.safety.level
                ),
            );
        },
    );

    let report = if config.simulation.max_ticks.is_some() {
        ticker.join()?
    } else {
        logging::info(Component::System, None, "Running; press Enter to stop");
        ticker.wait_for_operator(BufReader::new(std::io::stdin()), CONSOLE_POLL)?
    };

    let history = store.query(Some(config.store.history_limit))?;
    let summary = RunSummary {
        run: report,
        trend: aggregate(&history),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(path) = &config.store.export_path {
        let rows = store::export_to_path(&*store, path)?;
        logging::info(
            Component::Store,
            None,
            &format!("Exported {} rows to {}", rows, path.display()),
        );
    }

    Ok(())
}
