//! Thali CLI
//!
//! Prices scripted orders from the fixture directory.
//!
//! - `thali quote <ORDER>` prints the receipt for `fixtures/orders/<ORDER>.yml`
//! - `thali quote <ORDER> --checkout` places the order and prints the checkout record as JSON
//! - `thali coupons` lists the coupon rules
//! - `thali distance --from LAT,LON --to LAT,LON` quotes delivery between two points

use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use jiff::Timestamp;
use tabled::{builder::Builder, settings::Style};
use thali::{
    fixtures::Fixture,
    geo::{DistanceSource, GeoPoint, GreatCircle},
    observability::{LoggingConfig, init_logging},
    pricing::display_amount,
    receipt::Receipt,
};
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "thali", about = "Food order pricing", long_about = None)]
struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(flatten)]
    fixtures: FixtureArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct FixtureArgs {
    /// Directory holding the pricing, coupons and orders fixtures
    #[arg(long, env = "THALI_FIXTURES", default_value = "./fixtures", global = true)]
    fixtures: PathBuf,

    /// Pricing fixture name; built-in rupee pricing when omitted
    #[arg(long, env = "THALI_PRICING", global = true)]
    pricing: Option<String>,

    /// Coupon fixture name; the standard coupons when omitted
    #[arg(long, env = "THALI_COUPONS", global = true)]
    coupons: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Price a scripted order
    Quote(QuoteArgs),

    /// List coupon rules
    Coupons,

    /// Quote delivery between two points
    Distance(DistanceArgs),
}

#[derive(Debug, Args)]
struct QuoteArgs {
    /// Order fixture name
    order: String,

    /// Place the order and print the checkout record
    #[arg(long)]
    checkout: bool,
}

#[derive(Debug, Args)]
struct DistanceArgs {
    /// Restaurant location as `LAT,LON`
    #[arg(long, allow_hyphen_values = true)]
    from: GeoPoint,

    /// Customer location as `LAT,LON`
    #[arg(long, allow_hyphen_values = true)]
    to: GeoPoint,
}

fn main() -> Result<()> {
    let _env = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logging(&cli.logging)?;

    debug!(command = ?cli.command, fixtures = %cli.fixtures.fixtures.display(), "starting");

    let fixture = load_fixture(&cli.fixtures)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Quote(args) => quote(&fixture, &args, &mut out),
        Commands::Coupons => coupons(&fixture, &mut out),
        Commands::Distance(args) => distance(&fixture, &args, &mut out),
    }
}

fn load_fixture(args: &FixtureArgs) -> Result<Fixture<'static>> {
    let mut fixture = Fixture::with_base_path(&args.fixtures);

    if let Some(name) = &args.pricing {
        fixture
            .load_pricing(name)
            .with_context(|| format!("loading pricing fixture {name:?}"))?;
    }

    if let Some(name) = &args.coupons {
        fixture
            .load_coupons(name)
            .with_context(|| format!("loading coupon fixture {name:?}"))?;
    }

    Ok(fixture)
}

fn quote(fixture: &Fixture<'static>, args: &QuoteArgs, out: &mut impl Write) -> Result<()> {
    let mut session = fixture
        .order_session(&args.order)
        .with_context(|| format!("loading order fixture {:?}", args.order))?;

    if args.checkout {
        let record = session.checkout(Timestamp::now(), &mut rand::thread_rng())?;

        serde_json::to_writer_pretty(&mut *out, &record)?;
        writeln!(out)?;
    } else {
        Receipt::from_session(&session)?.write_to(out)?;
    }

    Ok(())
}

fn coupons(fixture: &Fixture<'static>, out: &mut impl Write) -> Result<()> {
    let book = fixture.coupons();
    let mut builder = Builder::default();

    builder.push_record(["Code", "Minimum order", "Discount"]);

    for coupon in book.coupons() {
        let minimum = coupon.minimum_order();

        builder.push_record([
            coupon.code().to_string(),
            format!("{}{}", minimum.currency().symbol, display_amount(minimum)),
            coupon.discount().to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());

    writeln!(out, "{table}")?;

    Ok(())
}

fn distance(fixture: &Fixture<'static>, args: &DistanceArgs, out: &mut impl Write) -> Result<()> {
    let km = GreatCircle.distance_km(args.from, args.to)?;
    let fee = fixture.pricing().delivery.fee_for_distance(km)?;

    writeln!(out, "Distance:     {km:.2} km")?;
    writeln!(out, "Delivery fee: {fee}")?;

    Ok(())
}
