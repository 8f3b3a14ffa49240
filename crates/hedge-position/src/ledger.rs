//! Ledger of open hedge pairs.
//!
//! Each `(symbol, account)` leg points at one pair record. Records live in an
//! arena keyed by [`PairId`]; every participant of a pair maps to the same id.
//!
//! Invariants:
//! - An entry exists iff that account holds a tracked open leg in that symbol.
//! - A pair's participant set equals the set of entries pointing at it.
//! - Registering a pair that touches existing pairs merges all of them into a
//!   single record.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use hedge_core::AccountId;
use hedge_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PositionError, PositionResult};

/// Arena handle of a pair record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairId(u64);

/// Accounts holding offsetting legs in one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HedgePair {
    symbol: String,
    participants: BTreeSet<AccountId>,
}

impl HedgePair {
    pub fn new(symbol: impl Into<String>, participants: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            symbol: symbol.into(),
            participants: participants.into_iter().collect(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Participants in ascending id order.
    pub fn participants(&self) -> impl Iterator<Item = &AccountId> {
        self.participants.iter()
    }

    pub fn contains(&self, account: &AccountId) -> bool {
        self.participants.contains(account)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn key(&self) -> PairKey {
        PairKey {
            symbol: self.symbol.clone(),
            participants: self.participants.iter().cloned().collect(),
        }
    }
}

/// Value identity of a pair: symbol plus sorted participants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    symbol: String,
    participants: Vec<AccountId>,
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.symbol)?;
        for (i, account) in self.participants.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{account}")?;
        }
        write!(f, "]")
    }
}

#[derive(Debug, Default)]
pub struct PairLedger {
    /// symbol -> account -> pair.
    entries: HashMap<String, HashMap<AccountId, PairId>>,
    pairs: HashMap<PairId, HedgePair>,
    next_id: u64,
}

impl PairLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `pair`, merging it with every existing pair that shares a leg.
    ///
    /// # Errors
    /// `EmptyPair` when `pair` has no participants.
    pub fn register(&mut self, pair: HedgePair) -> PositionResult<PairId> {
        if pair.is_empty() {
            return Err(PositionError::EmptyPair(pair.symbol));
        }
        let HedgePair {
            symbol,
            mut participants,
        } = pair;

        let reachable: BTreeSet<PairId> = match self.entries.get(&symbol) {
            Some(legs) => participants
                .iter()
                .filter_map(|account| legs.get(account).copied())
                .collect(),
            None => BTreeSet::new(),
        };
        for id in &reachable {
            if let Some(superseded) = self.pairs.remove(id) {
                participants.extend(superseded.participants);
            }
        }

        let id = PairId(self.next_id);
        self.next_id += 1;

        let legs = self.entries.entry(symbol.clone()).or_default();
        for account in &participants {
            legs.insert(account.clone(), id);
        }
        debug!(
            symbol = %symbol,
            participants = participants.len(),
            merged = reachable.len(),
            "Registered hedge pair"
        );
        self.pairs.insert(
            id,
            HedgePair {
                symbol,
                participants,
            },
        );
        Metrics::open_pairs(self.pairs.len());
        Ok(id)
    }

    /// Pair holding `account`'s leg in `symbol`.
    pub fn lookup(&self, symbol: &str, account: &AccountId) -> Option<&HedgePair> {
        let id = self.entries.get(symbol)?.get(account)?;
        self.pairs.get(id)
    }

    /// Stop tracking every participant of `pair`.
    pub fn remove(&mut self, pair: &HedgePair) {
        for account in pair.participants() {
            self.remove_leg(pair.symbol(), account);
        }
    }

    /// Stop tracking one leg. The pair record shrinks and is dropped once empty.
    ///
    /// Returns `false` if the leg was not tracked.
    pub fn remove_leg(&mut self, symbol: &str, account: &AccountId) -> bool {
        let Some(legs) = self.entries.get_mut(symbol) else {
            return false;
        };
        let Some(id) = legs.remove(account) else {
            return false;
        };
        if legs.is_empty() {
            self.entries.remove(symbol);
        }

        if let Some(pair) = self.pairs.get_mut(&id) {
            pair.participants.remove(account);
            if pair.participants.is_empty() {
                self.pairs.remove(&id);
            }
        }
        Metrics::open_pairs(self.pairs.len());
        true
    }

    /// Number of pair records.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = &HedgePair> {
        self.pairs.values()
    }
}
