use crate::ports::FirewallSession;
use ferrous_nftset_domain::{DomainError, SetDescriptor, Table, TableFamily};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Cached reference to a remote table and the sets known inside it.
#[derive(Debug, Clone)]
pub struct TableHandle {
    pub table: Table,
    sets: HashMap<String, SetDescriptor>,
    sets_listed: bool,
    created: bool,
}

impl TableHandle {
    fn listed(table: Table) -> Self {
        Self {
            table,
            sets: HashMap::new(),
            sets_listed: false,
            created: false,
        }
    }

    fn created(table: Table) -> Self {
        Self {
            table,
            sets: HashMap::new(),
            sets_listed: false,
            created: true,
        }
    }

    pub fn set(&self, name: &str) -> Option<&SetDescriptor> {
        self.sets.get(name)
    }

    pub fn insert_set(&mut self, set: SetDescriptor) -> &SetDescriptor {
        match self.sets.entry(set.name.clone()) {
            Entry::Occupied(mut e) => {
                e.insert(set);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(set),
        }
    }

    /// True once the remote set list has been merged in (or there is
    /// nothing remote to list).
    pub fn sets_listed(&self) -> bool {
        self.sets_listed
    }

    pub fn mark_sets_listed(&mut self) {
        self.sets_listed = true;
    }

    /// Added by this session rather than discovered through a listing.
    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn set_count(&self) -> usize {
        self.sets.len()
    }
}

/// Per-connection cache of remote tables, keyed by family and name.
///
/// Populated lazily and never invalidated; it dies with its connection.
#[derive(Debug, Default)]
pub struct MetadataCache {
    tables: HashMap<TableFamily, HashMap<String, TableHandle>>,
    listed_families: HashSet<TableFamily>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the handle for `(family, name)`, listing the family once and
    /// creating the table when the listing does not contain it.
    ///
    /// The listing is attempted once per family even when it fails; a table
    /// it would have reported is then added, which nft treats as a no-op.
    pub async fn resolve_table(
        &mut self,
        session: &mut dyn FirewallSession,
        family: TableFamily,
        name: &str,
    ) -> Result<&mut TableHandle, DomainError> {
        if self.listed_families.insert(family) {
            match session.list_tables(family).await {
                Ok(tables) => {
                    debug!(family = %family, count = tables.len(), "Nftables table(s) found");
                    let known = self.tables.entry(family).or_default();
                    for table in tables {
                        debug!(family = %family, table = %table.name, "Nftables table listed");
                        known
                            .entry(table.name.clone())
                            .or_insert_with(|| TableHandle::listed(table));
                    }
                }
                Err(e) => {
                    warn!(family = %family, error = %e, "Nftables list tables failed");
                }
            }
        }

        match self.tables.entry(family).or_default().entry(name.to_string()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                debug!(family = %family, table = name, "Nftables try to create table");
                let table = session.add_table(Table::new(family, name)).await?;
                Ok(e.insert(TableHandle::created(table)))
            }
        }
    }

    pub fn table(&self, family: TableFamily, name: &str) -> Option<&TableHandle> {
        self.tables.get(&family).and_then(|tables| tables.get(name))
    }

    pub fn is_family_listed(&self, family: TableFamily) -> bool {
        self.listed_families.contains(&family)
    }

    pub fn table_count(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }
}
