use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rez::admin::AdminGate;
use rez::calendar::{MonthView, RangeSelection};
use rez::csv::{read_commands, write_reservations};
use rez::dashboard::{ReservationFilter, Stats, Tab};
use rez::model::calendar_date;
use rez::{
    Amount, Config, DynamicPrice, NewReservation, ReservationStatus, ReservationStore, persist,
};

#[derive(Parser)]
#[command(name = "rez")]
#[command(about = "Reservation store of the VoynHouse booking site", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a stay, start and end day included
    Quote {
        #[arg(value_parser = parse_date)]
        start: NaiveDate,
        #[arg(value_parser = parse_date)]
        end: NaiveDate,
        /// Apply the limited-time discount
        #[arg(long)]
        discount: bool,
    },

    /// Submit a reservation request (stays pending until approved)
    Reserve {
        #[arg(value_parser = parse_date)]
        start: NaiveDate,
        #[arg(value_parser = parse_date)]
        end: NaiveDate,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long, default_value_t = 1)]
        guests: u8,
        #[arg(long)]
        discount: bool,
    },

    /// List reservations
    List {
        #[arg(long, value_enum, default_value = "all")]
        tab: Tab,
        #[arg(long, value_parser = parse_date, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date, requires = "from")]
        to: Option<NaiveDate>,
    },

    /// Approve a pending reservation and block its days
    Approve {
        id: String,
        #[arg(long)]
        password: String,
    },

    /// Reject a pending reservation
    Reject {
        id: String,
        #[arg(long)]
        password: String,
    },

    /// Flip availability of one day
    Toggle {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long)]
        password: String,
    },

    /// Manage dynamic prices
    Price {
        #[command(subcommand)]
        subcommand: PriceCommands,
    },

    /// Show a month with availability and nightly prices
    Calendar { year: i32, month: u32 },

    /// Revenue of approved reservations
    Stats,

    /// Export reservations as csv to stdout
    Export {
        #[arg(long, value_enum, default_value = "all")]
        tab: Tab,
        #[arg(long, value_parser = parse_date, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date, requires = "from")]
        to: Option<NaiveDate>,
    },

    /// Apply a csv file of store commands
    Apply {
        path: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum PriceCommands {
    /// Override the nightly rate for a date range
    Add {
        #[arg(value_parser = parse_date)]
        start: NaiveDate,
        #[arg(value_parser = parse_date)]
        end: NaiveDate,
        price: f64,
        #[arg(long)]
        password: String,
    },
    /// Remove the rule at a position of `price list`
    Remove {
        index: usize,
        #[arg(long)]
        password: String,
    },
    /// Show dynamic price rules
    List,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    calendar_date::parse(raw)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &Config) -> Result<(), Box<dyn Error>> {
    let gate = AdminGate::new(config.admin_password.clone());
    let mut store = persist::load(&config.storage_path, config.store_settings());

    match command {
        Commands::Quote {
            start,
            end,
            discount,
        } => {
            let quote = store.quote(start, end, discount)?;
            println!("nights: {}", quote.nights);
            println!("subtotal: {}", quote.subtotal);
            if quote.is_discounted() {
                println!("discount: {}", quote.discount);
            }
            println!("total: {}", quote.total);
        }
        Commands::Reserve {
            start,
            end,
            name,
            email,
            phone,
            guests,
            discount,
        } => {
            let quote = store.quote(start, end, discount)?;
            let id = store.add_reservation(NewReservation {
                customer_name: name,
                customer_email: email,
                customer_phone: phone,
                start_date: start,
                end_date: end,
                guest_count: guests,
                total_price: quote.total,
                is_discounted: discount,
            })?;
            persist::save(&config.storage_path, &store)?;
            info!(id = %id, total = %quote.total, "reservation received");
            println!("{id}");
        }
        Commands::List { tab, from, to } => {
            let filter = ReservationFilter { from, to };
            for r in filter.apply(tab.reservations(&store)) {
                println!(
                    "{}\t{}..={}\t{}\t{}\t{}\t{}",
                    r.id,
                    r.start_date,
                    r.end_date,
                    r.status.as_str(),
                    r.total_price,
                    r.guest_count,
                    r.customer_name
                );
            }
        }
        Commands::Approve { id, password } => {
            gate.login(&password)?;
            store.update_reservation_status(&id, ReservationStatus::Approved)?;
            persist::save(&config.storage_path, &store)?;
        }
        Commands::Reject { id, password } => {
            gate.login(&password)?;
            store.update_reservation_status(&id, ReservationStatus::Rejected)?;
            persist::save(&config.storage_path, &store)?;
        }
        Commands::Toggle { date, password } => {
            gate.login(&password)?;
            let blocked = store.toggle_date_availability(date);
            persist::save(&config.storage_path, &store)?;
            println!("{date} {}", if blocked { "blocked" } else { "available" });
        }
        Commands::Price { subcommand } => run_price(subcommand, &gate, &mut store, config)?,
        Commands::Calendar { year, month } => {
            let today = Local::now().date_naive();
            let view = MonthView::build(year, month, &store, &RangeSelection::default(), today)
                .ok_or_else(|| format!("invalid month {year}-{month}"))?;
            print!("{view}");
        }
        Commands::Stats => {
            let stats = Stats::compute(store.reservations());
            println!("approved: {}", stats.approved_count);
            println!("revenue: {}", stats.total_revenue);
            println!("average: {}", stats.average_value);
        }
        Commands::Export { tab, from, to } => {
            let filter = ReservationFilter { from, to };
            let rows = filter.apply(tab.reservations(&store));
            write_reservations(io::stdout().lock(), rows)?;
        }
        Commands::Apply { path, password } => {
            gate.login(&password)?;
            if !path.ends_with(".csv") {
                warn!(path, "input file seems to not be a csv file");
            }
            apply_batch(&path, &mut store).await?;
            persist::save(&config.storage_path, &store)?;
        }
    }

    Ok(())
}

fn run_price(
    command: PriceCommands,
    gate: &AdminGate,
    store: &mut ReservationStore,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    match command {
        PriceCommands::Add {
            start,
            end,
            price,
            password,
        } => {
            gate.login(&password)?;
            let price = Amount::try_from_float(price).ok_or("price is out of range")?;
            store.add_dynamic_price(DynamicPrice::new(start, end, price))?;
            persist::save(&config.storage_path, store)?;
        }
        PriceCommands::Remove { index, password } => {
            gate.login(&password)?;
            let removed = store.remove_dynamic_price(index)?;
            persist::save(&config.storage_path, store)?;
            println!(
                "removed {}..={} {}",
                removed.start_date, removed.end_date, removed.price
            );
        }
        PriceCommands::List => {
            for (index, rule) in store.dynamic_prices().iter().enumerate() {
                println!(
                    "{index}\t{}..={}\t{}",
                    rule.start_date, rule.end_date, rule.price
                );
            }
        }
    }
    Ok(())
}

/// Stream commands parsed on a background task into the store.
async fn apply_batch(path: &str, store: &mut ReservationStore) -> Result<(), Box<dyn Error>> {
    // the reader task outlives this call, so it gets an owned path
    let commands = read_commands(PathBuf::from(path))?;
    let (tx_sender, tx_receiver) = tokio::sync::mpsc::channel(16);

    let reader = tokio::spawn(async move {
        for result in commands {
            match result {
                Ok(command) => {
                    if tx_sender.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    store.run(ReceiverStream::new(tx_receiver)).await;
    reader.await?;
    Ok(())
}
