//! `citymap` command line front end.
//!
//! # Responsibility
//! - Drive the dispatch layer from stdin for local sessions.
//! - Offer operator commands for seeding reference cities and one-off
//!   renders.

mod console;

use citymap_core::{
    default_log_level, flush_logs, init_logging, init_stderr_logging, open_db, AppConfig,
    AppContext, CallbackQuery, City, CityRepository, Dispatcher, MapService, MarkerColor,
    RenderOutcome, Requester, SqliteCityRepository, UserId,
};
use clap::{Parser, Subcommand};
use console::ConsoleSink;
use log::{error, info};
use std::error::Error;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "citymap", version, about = "Show saved cities on a map")]
struct Cli {
    /// TOML config file; defaults plus `CITYMAP_DB_PATH` when omitted.
    /// Logs go to `log_dir` from the config when set, stderr otherwise.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Reads commands from stdin. `@<data>` presses a button on the last
    /// selection list.
    Chat {
        #[arg(long)]
        user: UserId,
        /// Keeps a copy of every delivered map here.
        #[arg(long)]
        save_dir: Option<PathBuf>,
    },
    /// Inserts or updates one reference city.
    SeedCity {
        name: String,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    /// Renders the given cities straight to a PNG file.
    Render {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = MarkerColor::Red)]
        color: MarkerColor,
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("citymap: {err}");
            ExitCode::FAILURE
        }
    };
    flush_logs();
    code
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::from_env()?,
    };
    let level = resolve_log_level(cli.log_level.as_deref(), config.log_level.as_deref());
    match &config.log_dir {
        Some(dir) => init_logging(level, &dir.to_string_lossy())?,
        None => init_stderr_logging(level)?,
    }
    info!(
        "event=cli_start module=cli status=ok core_version={}",
        citymap_core::core_version()
    );

    match cli.command {
        CliCommand::SeedCity { name, lat, lng } => seed_city(&config, name, lat, lng),
        CliCommand::Render { out, color, names } => render(&config, out, color, &names),
        CliCommand::Chat { user, save_dir } => chat(&config, user, save_dir),
    }
}

/// `--log-level` beats the config file, which beats the build default.
fn resolve_log_level<'a>(flag: Option<&'a str>, configured: Option<&'a str>) -> &'a str {
    flag.or(configured).unwrap_or(default_log_level())
}

fn seed_city(config: &AppConfig, name: String, lat: f64, lng: f64) -> Result<(), Box<dyn Error>> {
    let conn = open_db(&config.database_path)?;
    let repo = SqliteCityRepository::try_new(&conn)?;
    let city = City::new(name.trim(), lat, lng);
    repo.insert_city(&city)?;
    info!(
        "event=city_seed module=cli status=ok city={:?} total={}",
        city.name,
        repo.count_cities()?
    );
    println!("seeded {} ({lat}, {lng})", city.name);
    Ok(())
}

fn render(
    config: &AppConfig,
    out: PathBuf,
    color: MarkerColor,
    names: &[String],
) -> Result<(), Box<dyn Error>> {
    let context = AppContext::from_config(config)?;
    let conn = context.open_connection()?;
    let maps = MapService::new(SqliteCityRepository::try_new(&conn)?, context.renderer());
    match maps.render(&out, names, color)? {
        RenderOutcome::Rendered {
            viewport,
            plotted,
            unresolved,
        } => {
            println!(
                "wrote {} with {} cities, lon [{:.2}, {:.2}] lat [{:.2}, {:.2}]",
                out.display(),
                plotted.len(),
                viewport.west,
                viewport.east,
                viewport.south,
                viewport.north
            );
            if !unresolved.is_empty() {
                println!("skipped unknown: {}", unresolved.join(", "));
            }
            Ok(())
        }
        RenderOutcome::NothingToRender { unresolved } => Err(format!(
            "none of the requested cities are known: {}",
            unresolved.join(", ")
        )
        .into()),
    }
}

fn chat(config: &AppConfig, user: UserId, save_dir: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let context = AppContext::from_config(config)?;
    let dispatcher = Dispatcher::new(&context);
    let from = Requester::private(user);
    let mut sink = ConsoleSink::new(std::io::stdout().lock(), save_dir);
    let mut next_callback_id = 0_u64;

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Handler failures are already reported to the user and logged.
        let _ = match line.strip_prefix('@') {
            Some(data) => {
                let Some(message_id) = sink.last_choices() else {
                    eprintln!("no selection list to press");
                    continue;
                };
                next_callback_id += 1;
                let query = CallbackQuery {
                    id: next_callback_id.to_string(),
                    from,
                    message_id,
                    data: data.to_string(),
                };
                dispatcher.handle_callback(&query, &mut sink)
            }
            None => dispatcher.handle_message(from, line, &mut sink),
        };
    }
    Ok(())
}
