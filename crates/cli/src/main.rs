//! Bazaar CLI - database migrations and shop management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! bazaar-cli migrate
//!
//! # Load demo catalog, coupon definitions and a demo member
//! bazaar-cli seed
//!
//! # Create a coupon definition
//! bazaar-cli coupon create --name "Spring sale" --ratio 15
//! bazaar-cli coupon create --name "1000 off" --fixed 1000
//!
//! # Change the discount of an issued coupon
//! bazaar-cli coupon reprice --id 42 --fixed 500
//!
//! # Change a member's grade
//! bazaar-cli member grade -u demo -g vip
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use bazaar_core::MemberGrade;

mod commands;

#[derive(Parser)]
#[command(name = "bazaar-cli")]
#[command(author, version, about = "Bazaar shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with demo data
    Seed,
    /// Manage coupon definitions
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
    /// Manage members
    Member {
        #[command(subcommand)]
        action: MemberAction,
    },
}

#[derive(Subcommand)]
enum CouponAction {
    /// Create a coupon definition members can register
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Percentage off, 0-100
        #[arg(long, conflicts_with = "fixed")]
        ratio: Option<Decimal>,

        /// Flat amount off
        #[arg(long)]
        fixed: Option<i64>,
    },
    /// Change the discount of a coupon already issued to a member
    Reprice {
        /// Issued coupon id
        #[arg(long)]
        id: i32,

        /// Percentage off, 0-100
        #[arg(long, conflicts_with = "fixed")]
        ratio: Option<Decimal>,

        /// Flat amount off
        #[arg(long)]
        fixed: Option<i64>,
    },
}

#[derive(Subcommand)]
enum MemberAction {
    /// Set a member's loyalty grade
    Grade {
        /// Member username
        #[arg(short, long)]
        username: String,

        #[arg(short, long, value_enum)]
        grade: GradeArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GradeArg {
    Standard,
    Silver,
    Gold,
    Vip,
}

impl From<GradeArg> for MemberGrade {
    fn from(arg: GradeArg) -> Self {
        match arg {
            GradeArg::Standard => Self::Standard,
            GradeArg::Silver => Self::Silver,
            GradeArg::Gold => Self::Gold,
            GradeArg::Vip => Self::Vip,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Coupon { action } => match action {
            CouponAction::Create { name, ratio, fixed } => {
                commands::coupon::create(&name, ratio, fixed).await?;
            }
            CouponAction::Reprice { id, ratio, fixed } => {
                commands::coupon::reprice(id, ratio, fixed).await?;
            }
        },
        Commands::Member { action } => match action {
            MemberAction::Grade { username, grade } => {
                commands::member::set_grade(&username, grade.into()).await?;
            }
        },
    }
    Ok(())
}
