use anyhow::Result;
use lnk_core::TargetingCriteria;
use lnk_query::mappings;

pub fn compile(criteria: &TargetingCriteria) -> Result<()> {
    let query = lnk_query::compile(criteria)?;
    for (key, value) in query.params() {
        println!("{key} = {value}");
    }
    println!();
    println!("{}", query.render());
    Ok(())
}

pub fn locations() {
    for (name, urn) in mappings::LOCATIONS {
        println!("{urn:>10}  {name}");
    }
}

pub fn industries() {
    for (name, id) in mappings::INDUSTRIES {
        println!("{id:>4}  {name}");
    }
}
