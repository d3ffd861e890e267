//! In-memory adapters.
//!
//! - `InMemoryLedger` - All three store ports behind one lock, used by tests
//!   and by `TOKEN_LEDGER__DATABASE__URL=memory://` development runs

mod ledger;

pub use ledger::InMemoryLedger;
