//! Access to configuration values used by `config` arguments and parameterized identifiers. The
//! actual configuration source is provided by the embedding application.

use fxhash::FxHashMap;
#[cfg(test)]
use mockall::automock;

pub type ConfigProviderPtr = Box<dyn ConfigProvider + Send + Sync>;

/// Source of configuration values.
#[cfg_attr(test, automock)]
pub trait ConfigProvider {
    /// Returns the value for given key, if present.
    fn value(&self, key: &str) -> Option<String>;

    /// Returns the value for given key or the default.
    fn value_or(&self, key: &str, default: Option<String>) -> Option<String> {
        self.value(key).or(default)
    }
}

/// Simple in-memory configuration.
#[derive(Clone, Default, Debug)]
pub struct MapConfigProvider {
    values: FxHashMap<String, String>,
}

impl MapConfigProvider {
    pub fn with_value<K: ToString, V: ToString>(mut self, key: K, value: V) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl ConfigProvider for MapConfigProvider {
    #[inline]
    fn value(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl<K: ToString, V: ToString> FromIterator<(K, V)> for MapConfigProvider {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}
