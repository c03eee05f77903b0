//! Rendering of nft batch statements.

use ferrous_nftset_domain::{SetDescriptor, SetElement, Table};
use std::fmt::Write;

pub fn add_table(table: &Table) -> String {
    format!("add table {} {}", table.family, table.name)
}

pub fn add_set(set: &SetDescriptor) -> String {
    let mut statement = format!(
        "add set {} {} {} {{ type {};",
        set.table.family,
        set.table.name,
        set.name,
        set.key_type.as_str()
    );

    let mut flags = Vec::new();
    if set.flags.timeout {
        flags.push("timeout");
    }
    if set.flags.interval {
        flags.push("interval");
    }
    if !flags.is_empty() {
        let _ = write!(statement, " flags {};", flags.join(","));
    }

    statement.push_str(" }");
    statement
}

/// `None` when there is nothing to add.
pub fn add_elements(set: &SetDescriptor, elements: &[SetElement]) -> Option<String> {
    if elements.is_empty() {
        return None;
    }

    let rendered: Vec<String> = elements
        .iter()
        .map(|element| match element.timeout {
            Some(timeout) => format!("{} timeout {}s", element.address, timeout.as_secs().max(1)),
            None => element.address.to_string(),
        })
        .collect();

    Some(format!(
        "add element {} {} {} {{ {} }}",
        set.table.family,
        set.table.name,
        set.name,
        rendered.join(", ")
    ))
}

/// Join statements into one atomic `nft -f` batch.
pub fn batch(statements: &[String]) -> String {
    let mut script = statements.join("\n");
    script.push('\n');
    script
}
