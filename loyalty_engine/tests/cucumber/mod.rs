mod steps;

pub use ledger_world::LedgerWorld;
