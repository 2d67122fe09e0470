use anyhow::Result;
use clap::Parser;

mod campaign_cmds;
mod cli;
mod criteria;
mod http_client;
mod query_cmd;
mod run_cmd;
mod session_cmds;

use cli::{CampaignCommands, Cli, CodesCommands, Commands, SessionCommands};
use lnk_config::Settings;
use lnk_runner::RunOptions;
use lnk_session::SessionStore;
use lnk_storage::FileStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs to stderr; stdout is reserved for command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let state_root = match &cli.state_dir {
        Some(dir) => dir.clone(),
        None => lnk_session::default_state_root()?,
    };
    let storage = FileStore::new(&state_root);
    let sessions = SessionStore::with_root(&state_root, settings.session.expiry_hours);

    match cli.command {
        Commands::Campaign { cmd } => match cmd {
            CampaignCommands::New {
                name,
                account,
                keywords,
                location,
                industry,
                company,
                school,
                network,
                daily_limit,
                note,
            } => {
                let criteria = criteria::build_criteria(
                    &keywords,
                    location.as_deref(),
                    &industry,
                    &company,
                    &school,
                    &network,
                )?;
                campaign_cmds::new_campaign(
                    &storage,
                    &settings,
                    &name,
                    &account,
                    criteria,
                    daily_limit,
                    note,
                )?;
            }
            CampaignCommands::List => campaign_cmds::list(&storage)?,
            CampaignCommands::Show { id } => campaign_cmds::show(&storage, &id)?,
        },

        Commands::Run { id, max_actions } => {
            let opts = RunOptions {
                max_actions,
                ..Default::default()
            };
            run_cmd::run(&storage, &sessions, &settings, &state_root, &id, opts).await?;
        }

        Commands::Resume {
            id,
            acknowledge_review,
            max_actions,
        } => {
            let opts = RunOptions {
                acknowledge_review,
                max_actions,
            };
            run_cmd::resume(&storage, &sessions, &settings, &state_root, &id, opts).await?;
        }

        Commands::Query {
            keywords,
            location,
            industry,
            company,
            school,
            network,
        } => {
            let criteria = criteria::build_criteria(
                &keywords,
                location.as_deref(),
                &industry,
                &company,
                &school,
                &network,
            )?;
            query_cmd::compile(&criteria)?;
        }

        Commands::Codes { cmd } => match cmd {
            CodesCommands::Locations => query_cmd::locations(),
            CodesCommands::Industries => query_cmd::industries(),
        },

        Commands::Session { cmd } => match cmd {
            SessionCommands::Import { account, file } => {
                session_cmds::import(&sessions, &account, &file)?
            }
            SessionCommands::Status { account } => {
                session_cmds::status(&sessions, &settings, &account)?
            }
            SessionCommands::Clear { account } => session_cmds::clear(&sessions, &account)?,
        },
    }

    Ok(())
}
