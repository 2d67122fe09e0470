use anyhow::Result;
use lnk_config::Settings;
use lnk_core::{AttemptOutcome, TargetingCriteria};
use lnk_query::mappings;
use lnk_storage::Storage;

pub fn new_campaign(
    storage: &dyn Storage,
    settings: &Settings,
    name: &str,
    account: &str,
    criteria: TargetingCriteria,
    daily_limit: Option<u32>,
    note: Option<String>,
) -> Result<()> {
    // Reject bad criteria now, not at first run.
    lnk_query::compile(&criteria)?;

    let limit = daily_limit.unwrap_or(settings.automation.daily_limit);
    let mut campaign = lnk_core::Campaign::new(name, account, criteria, limit);
    campaign.message_template = note;
    storage.save_campaign(&campaign)?;

    println!("Created campaign {} ({})", campaign.id, campaign.name);
    Ok(())
}

pub fn list(storage: &dyn Storage) -> Result<()> {
    let campaigns = storage.list_campaigns()?;
    if campaigns.is_empty() {
        println!("No campaigns.");
        return Ok(());
    }
    for c in campaigns {
        println!(
            "{}  {:<9}  {:<20}  account={}  limit={}",
            c.id, c.status, c.name, c.account, c.daily_limit
        );
    }
    Ok(())
}

pub fn show(storage: &dyn Storage, id: &str) -> Result<()> {
    let c = storage.load_campaign(id)?;
    println!("Campaign:  {} ({})", c.id, c.name);
    println!("Account:   {}", c.account);
    println!("Status:    {}", c.status);
    if let Some(reason) = c.pause_reason {
        println!("Paused:    {reason:?}");
        if c.needs_review() {
            println!("           manual review required before resume");
        }
    }
    println!("Limit:     {} per day", c.daily_limit);
    if let Some(template) = &c.message_template {
        println!("Note:      {template}");
    }

    print_criteria(&c.criteria);

    let attempts = storage.load_attempts(id)?;
    let count = |o: AttemptOutcome| attempts.iter().filter(|a| a.outcome == o).count();
    println!(
        "Attempts:  {} total ({} sent, {} already connected, {} failed, {} blocked)",
        attempts.len(),
        count(AttemptOutcome::Sent),
        count(AttemptOutcome::AlreadyConnected),
        count(AttemptOutcome::Failed),
        count(AttemptOutcome::Blocked),
    );
    if let Some(cursor) = storage.load_cursor(id)? {
        println!("Cursor:    page {}", cursor.page);
    }
    Ok(())
}

fn print_criteria(criteria: &TargetingCriteria) {
    if let Some(keywords) = &criteria.keywords {
        println!("Keywords:  {keywords}");
    }
    if let Some(urn) = &criteria.geo_urn {
        match mappings::location_name(urn) {
            Some(name) => println!("Location:  {name} ({urn})"),
            None => println!("Location:  {urn}"),
        }
    }
    for id in &criteria.industry_ids {
        match mappings::industry_name(id) {
            Some(name) => println!("Industry:  {name} ({id})"),
            None => println!("Industry:  {id}"),
        }
    }
    for id in &criteria.company_ids {
        println!("Company:   {id}");
    }
    for id in &criteria.school_ids {
        println!("School:    {id}");
    }
    if !criteria.network.is_empty() {
        println!("Network:   {}", mappings::network_label(&criteria.network));
    }
}
