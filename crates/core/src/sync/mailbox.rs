//! Configuration-backed mailbox mapping

use std::collections::BTreeMap;

use super::ports::UserMailboxMap;

/// Fixed user → mailbox table, usually taken from `Config::mailboxes`.
#[derive(Debug, Clone, Default)]
pub struct StaticMailboxMap {
    entries: BTreeMap<String, String>,
}

impl StaticMailboxMap {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for StaticMailboxMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl UserMailboxMap for StaticMailboxMap {
    fn mailbox_for(&self, user_key: &str) -> Option<String> {
        self.entries.get(user_key).cloned()
    }

    fn users(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
