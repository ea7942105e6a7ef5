//! Event definitions and the per-transaction event log.
//!
//! Events are declared with their Solidity signatures so emitted logs carry
//! the same topics and ABI-encoded data a real chain would record.

use alloy_primitives::{Address, Log};
use alloy_sol_types::{sol, SolEvent};

sol! {
    /// Tokens moved between accounts. Mints use the zero address as `from`.
    #[derive(Debug, PartialEq, Eq)]
    event Transfer(address indexed from, address indexed to, uint256 value);

    /// An allowance was set.
    #[derive(Debug, PartialEq, Eq)]
    event Approval(address indexed owner, address indexed spender, uint256 value);

    /// A deposit was routed into `protocol`.
    #[derive(Debug, PartialEq, Eq)]
    event Deposited(address indexed user, uint256 amount, uint8 protocol);

    /// The owner withdrew `amount` of the pooled balance.
    #[derive(Debug, PartialEq, Eq)]
    event Withdrawn(address indexed user, uint256 amount);

    /// The pooled balance migrated between protocols.
    #[derive(Debug, PartialEq, Eq)]
    event Rebalanced(uint8 from_protocol, uint8 to_protocol, uint256 amount);

    #[derive(Debug, PartialEq, Eq)]
    event OwnershipTransferred(address indexed previous_owner, address indexed new_owner);
}

/// Logs emitted during a single call, in emission order.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    logs: Vec<Log>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `event` as emitted by the contract at `address`.
    pub fn emit<E: SolEvent>(&mut self, address: Address, event: &E) {
        self.logs.push(Log {
            address,
            data: event.encode_log_data(),
        });
    }

    /// The recorded logs.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Number of recorded logs.
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    /// Whether nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Consume the log, returning the raw entries.
    pub fn into_logs(self) -> Vec<Log> {
        self.logs
    }
}

/// Decode every log of event type `E`, skipping other events.
pub fn decode_events<E: SolEvent>(logs: &[Log]) -> Vec<E> {
    logs.iter()
        .filter(|log| log.data.topics().first() == Some(&E::SIGNATURE_HASH))
        .filter_map(|log| E::decode_log_data(&log.data).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn test_emit_and_decode() {
        let emitter = Address::repeat_byte(0xaa);
        let mut log = EventLog::new();
        log.emit(
            emitter,
            &Rebalanced {
                from_protocol: 2,
                to_protocol: 1,
                amount: U256::from(10_000u64),
            },
        );
        log.emit(
            emitter,
            &Withdrawn {
                user: Address::repeat_byte(0x01),
                amount: U256::from(5u64),
            },
        );

        assert_eq!(log.len(), 2);
        assert_eq!(log.logs()[0].address, emitter);

        let rebalances = decode_events::<Rebalanced>(log.logs());
        assert_eq!(rebalances.len(), 1);
        assert_eq!(rebalances[0].from_protocol, 2);
        assert_eq!(rebalances[0].to_protocol, 1);
        assert_eq!(rebalances[0].amount, U256::from(10_000u64));

        let withdrawals = decode_events::<Withdrawn>(log.logs());
        assert_eq!(withdrawals.len(), 1);
        assert!(decode_events::<Deposited>(log.logs()).is_empty());
    }

    #[test]
    fn test_indexed_fields_become_topics() {
        let from = Address::repeat_byte(0x01);
        let to = Address::repeat_byte(0x02);
        let mut log = EventLog::new();
        log.emit(
            Address::ZERO,
            &Transfer {
                from,
                to,
                value: U256::from(1u64),
            },
        );

        let topics = log.logs()[0].data.topics();
        assert_eq!(topics.len(), 3);
        assert_eq!(topics[0], Transfer::SIGNATURE_HASH);
        assert_eq!(topics[1], from.into_word());
        assert_eq!(topics[2], to.into_word());
    }
}
