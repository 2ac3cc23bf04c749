//! Wire and storage types for sealdraw.

pub mod execution;
pub mod lottery;

pub use execution::{
    transaction_namespace, Account, Event, Instruction, Key, Output, Transaction, Value,
    NAMESPACE,
};
