//! Clinic Booking - command-line front end for the booking flow.
//!
//! - `window` / `slots`: inspect the availability of a date
//! - `month`: print the calendar grid of a month
//! - `offers`: list the bookable offers
//! - `book`: fill the booking form and send it

use std::path::PathBuf;

use anyhow::{bail, Context};
use booking_client::{submit_booking, SubmissionClient, SubmitOutcome};
use booking_core::calendar::MonthView;
use booking_core::{Availability, BookingConfig, BookingSession, ContactFields, TimeOfDay};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Args as ClapArgs, Parser, Subcommand};
use directories::ProjectDirs;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Clinic Booking - check availability and book an appointment
#[derive(Parser, Debug)]
#[command(name = "clinic-booking", version, about)]
struct Args {
    /// Path to the config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the bookable window of a date
    Window {
        /// Date as YYYY-MM-DD
        date: NaiveDate,
    },
    /// List every selectable time of a date
    Slots {
        /// Date as YYYY-MM-DD
        date: NaiveDate,
    },
    /// Print the calendar grid of a month
    Month {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(value_parser = parse_month)]
        month: Option<MonthView>,
    },
    /// List the bookable offers
    Offers,
    /// Fill the booking form and send it
    Book(BookArgs),
}

#[derive(ClapArgs, Debug)]
struct BookArgs {
    /// Appointment date as YYYY-MM-DD
    #[arg(long)]
    date: NaiveDate,

    /// Appointment time as HH:MM (moved into the open window if needed)
    #[arg(long, value_parser = parse_clock)]
    time: Option<(u8, u8)>,

    #[arg(long)]
    name: String,

    #[arg(long)]
    surname: String,

    #[arg(long)]
    phone: String,

    #[arg(long)]
    email: String,

    /// Offer title from the catalog
    #[arg(long)]
    offer: Option<String>,

    /// Accept to be contacted about this booking
    #[arg(long)]
    consent: bool,

    /// Page path reported with the booking
    #[arg(long)]
    page: Option<String>,

    /// Override the configured endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Print the payload instead of sending it
    #[arg(long)]
    dry_run: bool,
}

/// Parses `HH:MM` without range checks; the window clamps it later.
fn parse_clock(s: &str) -> Result<(u8, u8), String> {
    let (hour, minute) = s
        .split_once(':')
        .ok_or_else(|| format!("expected HH:MM, got {s:?}"))?;
    let hour = hour.parse().map_err(|_| format!("invalid hour in {s:?}"))?;
    let minute = minute.parse().map_err(|_| format!("invalid minute in {s:?}"))?;
    Ok((hour, minute))
}

fn parse_month(s: &str) -> Result<MonthView, String> {
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .map(MonthView::containing)
        .map_err(|_| format!("expected YYYY-MM, got {s:?}"))
}

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "clinic-booking", "ClinicBooking").map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging with file rotation.
///
/// Console output goes to stderr so it never mixes with command output.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "clinic_booking={0},booking_core={0},booking_client={0},warn",
            log_level
        ))
    });

    if let Some(log_dir) = logs_dir() {
        if std::fs::create_dir_all(&log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("clinic-booking")
                .filename_suffix("log")
                .build(&log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                if args.debug {
                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(std::io::stderr))
                        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                        .init();
                } else {
                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                        .init();
                }

                tracing::debug!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }
    }

    // Fallback: console logging only
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::warn!("File logging unavailable, using console only");
    None
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<BookingConfig> {
    match path {
        Some(path) => BookingConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => match BookingConfig::default_path() {
            Some(path) => BookingConfig::load_or_default(&path)
                .with_context(|| format!("failed to load config from {}", path.display())),
            None => Ok(BookingConfig::default()),
        },
    }
}

fn print_window(config: &BookingConfig, date: NaiveDate) {
    let day = date.format("%A");
    match config.schedule.resolve(date) {
        Availability::Closed => println!("{date} ({day}): closed"),
        Availability::Open { window, source } => {
            println!("{date} ({day}): open {window} [{source:?}]")
        }
    }
}

fn print_slots(config: &BookingConfig, date: NaiveDate) {
    let slots = config.schedule.slots(date);
    if slots.is_empty() {
        println!("{date}: closed");
        return;
    }
    for hour_slots in slots.chunk_by(|a, b| a.hour == b.hour) {
        let line: Vec<String> = hour_slots.iter().map(TimeOfDay::to_string).collect();
        println!("{}", line.join("  "));
    }
}

fn print_month(config: &BookingConfig, view: MonthView, today: NaiveDate) {
    println!("{}", view.label());
    println!(" Mo  Tu  We  Th  Fr  Sa  Su");
    let cells = view.cells(today, &config.schedule);
    for week in cells.chunks(7) {
        let row: Vec<String> = week
            .iter()
            .map(|cell| {
                if !cell.in_current_month {
                    return "  . ".to_string();
                }
                let mark = if cell.is_today {
                    '*'
                } else if cell.disabled {
                    'x'
                } else {
                    ' '
                };
                format!("{:>3}{}", cell.date.day(), mark)
            })
            .collect();
        println!("{}", row.concat().trim_end());
    }
    println!("(* today, x not bookable)");
}

fn print_offers(config: &BookingConfig) {
    for offer in config.offers.offers() {
        let mut line = offer.title.clone();
        if let Some(price) = &offer.price {
            line.push_str(&format!(" - {price}"));
        }
        if let Some(badge) = &offer.badge {
            line.push_str(&format!(" [{badge}]"));
        }
        if offer.featured {
            line.push_str(" *");
        }
        println!("{line}");
    }
}

/// The URL-encoded body `book` would post.
fn dry_run_payload(session: &mut BookingSession) -> anyhow::Result<String> {
    let request = session
        .prepare_submission()
        .context("form could not be submitted")?;
    Ok(request.encode()?)
}

async fn book(mut config: BookingConfig, args: BookArgs, today: NaiveDate) -> anyhow::Result<()> {
    if let Some(page) = args.page {
        config.client.page = page;
    }
    let mut session = BookingSession::from_config(&config);

    session.select_date(args.date, today)?;

    if let Some((hour, minute)) = args.time {
        session.set_time(hour, minute)?;
        let chosen = session.selector_state().time();
        if chosen.map(|t| (t.hour, t.minute)) != Some((hour, minute)) {
            tracing::warn!(
                requested = %format!("{hour:02}:{minute:02}"),
                chosen = ?chosen,
                "Requested time is not bookable, moved into the open window"
            );
        }
    }

    if let Some(offer) = &args.offer {
        session.choose_offer(offer)?;
    }

    session.form_mut().set_contact(ContactFields::new(
        args.name,
        args.surname,
        args.phone,
        args.email,
    ));
    session.form_mut().set_consent(args.consent);

    if !session.can_submit() {
        bail!("every contact field and --consent are required to book");
    }

    if args.dry_run {
        println!("{}", dry_run_payload(&mut session)?);
        return Ok(());
    }

    let endpoint = args.endpoint.unwrap_or(config.endpoint);
    let client = SubmissionClient::new(&endpoint)?;

    match submit_booking(&mut session, &client).await {
        SubmitOutcome::Sent(_) => {
            let confirmation = session.confirmation();
            println!("{}", confirmation.title());
            println!("{}", confirmation.message());
            Ok(())
        }
        SubmitOutcome::Disabled => bail!("form could not be submitted"),
        SubmitOutcome::Failed { alert } => bail!(alert),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = init_logging(&args);

    let config = load_config(args.config.as_ref())?;
    let today = Local::now().date_naive();

    match args.command {
        Command::Window { date } => print_window(&config, date),
        Command::Slots { date } => print_slots(&config, date),
        Command::Month { month } => {
            let view = month.unwrap_or_else(|| MonthView::containing(today));
            print_month(&config, view, today);
        }
        Command::Offers => print_offers(&config),
        Command::Book(book_args) => book(config, book_args, today).await?,
    }

    Ok(())
}
