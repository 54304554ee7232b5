// 🏷️ Classifier - Membership lookup
// Maps a counterparty name to Merchant / Friend / Stranger

use std::collections::BTreeSet;

use crate::config::{AnalyzerConfig, MatchMode, Precedence};
use crate::transaction::{Category, ClassifiedTransaction, Transaction};

// ============================================================================
// PURE CLASSIFICATION
// ============================================================================

/// Exact-match classification. Merchant wins when a name is in both sets;
/// any other name (including the empty string) is a Stranger.
pub fn classify(
    account_name: &str,
    merchants: &BTreeSet<String>,
    friends: &BTreeSet<String>,
) -> Category {
    if merchants.contains(account_name) {
        Category::Merchant
    } else if friends.contains(account_name) {
        Category::Friend
    } else {
        Category::Stranger
    }
}

// ============================================================================
// MEMBERSHIP LIST
// ============================================================================

/// One membership list, pre-normalized for its match mode.
#[derive(Debug, Clone)]
struct MembershipList {
    names: BTreeSet<String>,
    mode: MatchMode,
}

impl MembershipList {
    fn new(names: &BTreeSet<String>, mode: MatchMode) -> Self {
        let names = match mode {
            MatchMode::Exact => names.clone(),
            MatchMode::IgnoreCase => names.iter().map(|n| n.to_lowercase()).collect(),
            // An empty pattern would match every name
            MatchMode::Contains => names
                .iter()
                .filter(|n| !n.is_empty())
                .map(|n| n.to_lowercase())
                .collect(),
        };
        MembershipList { names, mode }
    }

    fn matches(&self, account_name: &str) -> bool {
        match self.mode {
            MatchMode::Exact => self.names.contains(account_name),
            MatchMode::IgnoreCase => self.names.contains(&account_name.to_lowercase()),
            MatchMode::Contains => {
                let lowered = account_name.to_lowercase();
                self.names.iter().any(|n| lowered.contains(n.as_str()))
            }
        }
    }
}

// ============================================================================
// CONFIGURED CLASSIFIER
// ============================================================================

/// Classifier built from an [`AnalyzerConfig`]. Immutable once built; a config
/// change means building a new one and re-running classification.
#[derive(Debug, Clone)]
pub struct Classifier {
    merchants: MembershipList,
    friends: MembershipList,
    precedence: Precedence,
}

impl Classifier {
    pub fn new(
        merchants: &BTreeSet<String>,
        friends: &BTreeSet<String>,
        mode: MatchMode,
        precedence: Precedence,
    ) -> Self {
        Classifier {
            merchants: MembershipList::new(merchants, mode),
            friends: MembershipList::new(friends, mode),
            precedence,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(
            &config.merchants,
            &config.friends,
            config.match_mode,
            config.precedence,
        )
    }

    pub fn classify(&self, account_name: &str) -> Category {
        let (first, first_cat, second, second_cat) = match self.precedence {
            Precedence::MerchantFirst => {
                (&self.merchants, Category::Merchant, &self.friends, Category::Friend)
            }
            Precedence::FriendFirst => {
                (&self.friends, Category::Friend, &self.merchants, Category::Merchant)
            }
        };

        if first.matches(account_name) {
            first_cat
        } else if second.matches(account_name) {
            second_cat
        } else {
            Category::Stranger
        }
    }

    /// Attach a category to every transaction, keeping input order.
    pub fn classify_all(&self, transactions: Vec<Transaction>) -> Vec<ClassifiedTransaction> {
        transactions
            .into_iter()
            .map(|transaction| {
                let category = self.classify(&transaction.account_name);
                ClassifiedTransaction {
                    transaction,
                    category,
                }
            })
            .collect()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::from_config(&AnalyzerConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
