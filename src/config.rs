// ⚙️ Analyzer Configuration
// Membership lists + matching policies, loaded from JSON (rules as data)

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::classifier::Classifier;
use crate::error::{AnalyzerError, Result};

/// How an account name is compared against the membership lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Exact, case-sensitive string equality
    #[default]
    Exact,
    /// Equality after lowercasing both sides
    IgnoreCase,
    /// Lowercased name contains a lowercased list entry
    Contains,
}

/// Which list wins when a name matches both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
    #[default]
    MerchantFirst,
    FriendFirst,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    pub merchants: BTreeSet<String>,
    pub friends: BTreeSet<String>,
    pub match_mode: MatchMode,
    pub precedence: Precedence,

    /// Display only; amounts are never converted
    pub currency_symbol: String,

    /// Upper bound on concurrently held upload sessions
    pub max_sessions: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            merchants: to_set(&[
                "Swiggy",
                "Zomato",
                "Amazon",
                "IRCTC",
                "Flipkart",
                "BigBasket",
                "Reliance",
                "Myntra",
            ]),
            friends: to_set(&["Rahul", "Neha", "Arjun", "Sneha", "Vikram"]),
            match_mode: MatchMode::default(),
            precedence: Precedence::default(),
            currency_symbol: "₹".to_string(),
            max_sessions: 64,
        }
    }
}

fn to_set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl AnalyzerConfig {
    /// Load configuration from a JSON file. Missing fields fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AnalyzerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            merchants = config.merchants.len(),
            friends = config.friends.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: AnalyzerConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Use `path` when given, built-in defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_sessions == 0 {
            return Err(AnalyzerError::Config(
                "max_sessions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Names listed as both merchant and friend (resolved by `precedence`)
    pub fn overlapping_names(&self) -> Vec<&str> {
        self.merchants
            .intersection(&self.friends)
            .map(String::as_str)
            .collect()
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::from_config(self)
    }
}
