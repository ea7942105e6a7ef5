//! Rebalancing history.
//!
//! One record per migration that actually moved the selection. Records made
//! by the keeper carry the yields on either side of the move; records rebuilt
//! from `Rebalanced` logs do not, since the event only carries pools and
//! amount.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use yield_optimizer_contracts::events::Rebalanced;
use yield_optimizer_contracts::{decode_events, MinedLog, Migration, Protocol, ProtocolRates};

use crate::error::Result;
use crate::units::rate_to_percent;

/// Number of records shown by default, newest first.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// A completed rebalance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceRecord {
    /// Sequential id, starting at 1.
    pub id: u64,
    pub old_pool: Protocol,
    pub new_pool: Protocol,
    /// Amount moved, in token base units.
    pub amount: U256,
    /// Rate of the old pool at the time of the move, in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_before: Option<Decimal>,
    /// Rate of the new pool at the time of the move, in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_after: Option<Decimal>,
    pub block_number: u64,
    pub timestamp: u64,
}

/// Ordered list of rebalance records, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceHistory {
    records: Vec<RebalanceRecord>,
}

impl RebalanceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the history from mined logs. Yields are left empty.
    pub fn from_logs(logs: &[MinedLog]) -> Self {
        let mut history = Self::new();
        for mined in logs {
            let Some(event) = decode_events::<Rebalanced>(std::slice::from_ref(&mined.log))
                .into_iter()
                .next()
            else {
                continue;
            };
            let (Some(old_pool), Some(new_pool)) = (
                Protocol::from_u8(event.from_protocol),
                Protocol::from_u8(event.to_protocol),
            ) else {
                continue;
            };
            history.push(
                old_pool,
                new_pool,
                event.amount,
                None,
                mined.block_number,
                mined.timestamp,
            );
        }
        history
    }

    /// Record `migration`, mined at `block_number`/`timestamp`, with the
    /// yields taken from `rates` as read just before the move.
    pub fn record(
        &mut self,
        migration: &Migration,
        rates: &ProtocolRates,
        block_number: u64,
        timestamp: u64,
    ) -> Result<&RebalanceRecord> {
        let yields = (
            rate_to_percent(rates.rate_of(migration.from))?,
            rate_to_percent(rates.rate_of(migration.to))?,
        );
        Ok(self.push(
            migration.from,
            migration.to,
            migration.amount,
            Some(yields),
            block_number,
            timestamp,
        ))
    }

    fn push(
        &mut self,
        old_pool: Protocol,
        new_pool: Protocol,
        amount: U256,
        yields: Option<(Decimal, Decimal)>,
        block_number: u64,
        timestamp: u64,
    ) -> &RebalanceRecord {
        let id = self.records.len() as u64 + 1;
        self.records.push(RebalanceRecord {
            id,
            old_pool,
            new_pool,
            amount,
            yield_before: yields.map(|(before, _)| before),
            yield_after: yields.map(|(_, after)| after),
            block_number,
            timestamp,
        });
        &self.records[self.records.len() - 1]
    }

    /// The `limit` most recent records, newest first.
    pub fn latest(&self, limit: usize) -> Vec<&RebalanceRecord> {
        self.records.iter().rev().take(limit).collect()
    }

    pub fn records(&self) -> &[RebalanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total amount moved across all records.
    pub fn total_moved(&self) -> U256 {
        self.records
            .iter()
            .fold(U256::ZERO, |acc, r| acc.saturating_add(r.amount))
    }
}
