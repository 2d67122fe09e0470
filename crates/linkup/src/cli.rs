use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "linkup")]
#[command(about = "Rate-limited outreach campaigns for a professional-network platform")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// State directory override (campaigns, sessions, budgets)
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage campaigns
    Campaign {
        #[command(subcommand)]
        cmd: CampaignCommands,
    },

    /// Run a campaign (start a draft, or continue an interrupted run)
    Run {
        /// Campaign id (ULID)
        id: String,

        /// Stop after this many platform actions
        #[arg(long)]
        max_actions: Option<u32>,
    },

    /// Resume a paused campaign
    Resume {
        /// Campaign id (ULID)
        id: String,

        /// Acknowledge the manual-review flag after a detection pause
        #[arg(long)]
        acknowledge_review: bool,

        /// Stop after this many platform actions
        #[arg(long)]
        max_actions: Option<u32>,
    },

    /// Compile targeting criteria and print the canonical query
    Query {
        /// Search keywords
        #[arg(long)]
        keywords: String,

        /// Location name or geo urn code
        #[arg(long)]
        location: Option<String>,

        /// Industry name or id (repeatable)
        #[arg(long)]
        industry: Vec<String>,

        /// Company id (repeatable)
        #[arg(long)]
        company: Vec<String>,

        /// School id (repeatable)
        #[arg(long)]
        school: Vec<String>,

        /// Network degree: first, second, third (repeatable)
        #[arg(long)]
        network: Vec<String>,
    },

    /// List known location and industry codes
    Codes {
        #[command(subcommand)]
        cmd: CodesCommands,
    },

    /// Manage account sessions
    Session {
        #[command(subcommand)]
        cmd: SessionCommands,
    },
}

#[derive(Subcommand)]
pub enum CampaignCommands {
    /// Create a draft campaign
    New {
        /// Campaign name
        #[arg(long)]
        name: String,

        /// Account the campaign dispatches from
        #[arg(long)]
        account: String,

        /// Search keywords
        #[arg(long)]
        keywords: String,

        /// Location name or geo urn code
        #[arg(long)]
        location: Option<String>,

        /// Industry name or id (repeatable)
        #[arg(long)]
        industry: Vec<String>,

        /// Company id (repeatable)
        #[arg(long)]
        company: Vec<String>,

        /// School id (repeatable)
        #[arg(long)]
        school: Vec<String>,

        /// Network degree: first, second, third (repeatable)
        #[arg(long)]
        network: Vec<String>,

        /// Per-window connection ceiling (defaults from config)
        #[arg(long)]
        daily_limit: Option<u32>,

        /// Note template; {name} expands to the candidate's first name
        #[arg(long)]
        note: Option<String>,
    },

    /// List campaigns
    List,

    /// Show one campaign with its attempt tally
    Show {
        /// Campaign id (ULID)
        id: String,
    },
}

#[derive(Subcommand)]
pub enum CodesCommands {
    /// Known location codes
    Locations,
    /// Known industry codes
    Industries,
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Import an authentication blob for an account (reads the file raw)
    Import {
        account: String,

        /// File holding the opaque auth blob
        #[arg(long)]
        file: PathBuf,
    },

    /// Show session freshness for an account
    Status { account: String },

    /// Drop the persisted session for an account
    Clear { account: String },
}
