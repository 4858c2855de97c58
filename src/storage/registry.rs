//! Table Registry
//!
//! Maps table names to shared [`Table`] instances, creating and starting a
//! table the first time its name is asked for. A registry is an ordinary
//! value: create one per process (or per test) and pass it around.

use super::expiry::TableConfig;
use super::table::{Table, TableError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// A get-or-create store of named tables.
///
/// Every table created through the registry uses the registry's
/// [`TableConfig`]. Dropping the registry stops all of its tables.
///
/// # Example
///
/// ```
/// use tablecache::Registry;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), tablecache::TableError> {
/// let registry: Registry<String, String> = Registry::new();
///
/// let users = registry.table("users")?;
/// users.add_with_ttl("bobby".into(), "tables".into(), Duration::from_secs(5))?;
///
/// // Same name, same table
/// let again = registry.table("users")?;
/// assert!(again.exists(&"bobby".to_string()));
/// # Ok(())
/// # }
/// ```
pub struct Registry<K, V> {
    config: TableConfig,
    tables: DashMap<String, Arc<Table<K, V>>>,
}

impl<K, V> std::fmt::Debug for Registry<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("tables", &self.tables.len())
            .finish()
    }
}

impl<K, V> Registry<K, V> {
    /// Stops every table and forgets them.
    pub fn stop_all(&self) {
        for table in self.tables.iter() {
            table.value().stop();
        }
        self.tables.clear();
    }
}

impl<K, V> Drop for Registry<K, V> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

impl<K, V> Default for Registry<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Registry<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty registry with the default table configuration.
    pub fn new() -> Self {
        Self::with_config(TableConfig::default())
    }

    /// Creates an empty registry whose tables use `config`.
    pub fn with_config(config: TableConfig) -> Self {
        Self {
            config,
            tables: DashMap::new(),
        }
    }

    /// Returns the table called `name`, creating and starting it if needed.
    ///
    /// Only the first caller for a given name triggers [`Table::init`];
    /// concurrent callers all get the same instance.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::NoRuntime`] when a new table has to be created
    /// outside a Tokio runtime. Nothing is registered in that case.
    pub fn table(&self, name: &str) -> Result<Arc<Table<K, V>>, TableError> {
        if let Some(table) = self.tables.get(name) {
            return Ok(Arc::clone(table.value()));
        }

        match self.tables.entry(name.to_owned()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let table = Arc::new(Table::with_config(name, self.config.clone()));
                table.init()?;
                entry.insert(Arc::clone(&table));
                debug!(table = name, "Table created");
                Ok(table)
            }
        }
    }

    /// Returns the table called `name` without creating it.
    pub fn get(&self, name: &str) -> Option<Arc<Table<K, V>>> {
        self.tables.get(name).map(|table| Arc::clone(table.value()))
    }

    /// Detaches the table called `name` and stops it.
    ///
    /// Callers still holding the table keep a stopped instance; the next
    /// [`table`](Self::table) call for that name creates a fresh one.
    pub fn remove(&self, name: &str) -> Option<Arc<Table<K, V>>> {
        let (_, table) = self.tables.remove(name)?;
        table.stop();
        Some(table)
    }

    /// Returns the names of all registered tables, in no particular order.
    pub fn names(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns the configuration applied to new tables.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }
}
