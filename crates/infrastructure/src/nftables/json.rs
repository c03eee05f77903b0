//! Parsing of `nft -j` listings.
//!
//! The top level is `{"nftables": [ {<kind>: {...}}, ... ]}` where each entry
//! is an object keyed by its kind (`metainfo`, `table`, `set`, `chain`, ...).
//! Only tables and sets are of interest here; everything else is skipped.

use ferrous_nftset_domain::{
    DomainError, SetDescriptor, SetFlags, SetKeyType, Table, TableFamily,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    nftables: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct TableEntry {
    family: String,
    name: String,
    #[serde(default)]
    handle: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SetEntry {
    family: String,
    name: String,
    table: String,
    #[serde(rename = "type")]
    key_type: Value,
    #[serde(default)]
    flags: Option<OneOrMany>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn contains(&self, flag: &str) -> bool {
        match self {
            OneOrMany::One(f) => f == flag,
            OneOrMany::Many(flags) => flags.iter().any(|f| f == flag),
        }
    }
}

fn parse_listing(output: &str) -> Result<Listing, DomainError> {
    if output.trim().is_empty() {
        return Ok(Listing {
            nftables: Vec::new(),
        });
    }
    serde_json::from_str(output)
        .map_err(|e| DomainError::InvalidEngineResponse(format!("Invalid nft JSON: {}", e)))
}

fn entries<'a, T: serde::de::DeserializeOwned>(
    listing: &'a Listing,
    kind: &'a str,
) -> impl Iterator<Item = Result<T, DomainError>> + 'a {
    listing
        .nftables
        .iter()
        .filter_map(move |entry| entry.get(kind))
        .map(move |value| {
            T::deserialize(value).map_err(|e| {
                DomainError::InvalidEngineResponse(format!("Invalid nft {} entry: {}", kind, e))
            })
        })
}

/// Tables of `family` in a `nft -j list tables` listing.
pub fn parse_tables(output: &str, family: TableFamily) -> Result<Vec<Table>, DomainError> {
    let listing = parse_listing(output)?;
    let mut tables = Vec::new();

    for entry in entries::<TableEntry>(&listing, "table") {
        let entry = entry?;
        let entry_family: TableFamily = entry.family.parse()?;
        if entry_family != family {
            continue;
        }
        tables.push(Table {
            family: entry_family,
            name: entry.name,
            handle: entry.handle,
        });
    }

    Ok(tables)
}

/// Address sets of `table` in a `nft -j list table` listing.
///
/// Sets keyed by anything other than a plain ipv4/ipv6 address (concatenations,
/// ether_addr, ...) cannot receive resolved addresses and are left out.
pub fn parse_sets(output: &str, table: &Table) -> Result<Vec<SetDescriptor>, DomainError> {
    let listing = parse_listing(output)?;
    let mut sets = Vec::new();

    for entry in entries::<SetEntry>(&listing, "set") {
        let entry = entry?;
        if entry.table != table.name || entry.family != table.family.as_str() {
            continue;
        }

        let Some(key_type) = entry.key_type.as_str().and_then(SetKeyType::parse) else {
            debug!(table = %table, set = %entry.name, key_type = %entry.key_type, "Skipping non-address set");
            continue;
        };

        let flags = entry.flags.as_ref().map_or_else(SetFlags::default, |flags| SetFlags {
            timeout: flags.contains("timeout"),
            interval: flags.contains("interval"),
        });

        sets.push(SetDescriptor {
            table: table.clone(),
            name: entry.name,
            key_type,
            flags,
        });
    }

    Ok(sets)
}
