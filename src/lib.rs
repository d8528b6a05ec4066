//! filekeeper - a storage-tree organization and integrity utility
//!
//! This library scans a folder tree, classifies files by extension into
//! category folders, deletes junk, keeps a durable one-shot undo ledger
//! for every organize/clean batch, and reports content-hash changes
//! between runs.

pub mod category;
pub mod cli;
pub mod config;
pub mod executor;
pub mod hasher;
pub mod integrity;
pub mod ledger;
pub mod output;
pub mod planner;
pub mod scanner;
pub mod undo;

pub use category::{CategoryTable, Selection};
pub use config::{CompiledRules, ConfigError, OrganizerConfig};
pub use executor::{ExecutionReport, MoveExecutor};
pub use integrity::DiffReport;
pub use ledger::{LedgerError, UndoLedger};
pub use planner::PlannedMove;
pub use scanner::ScanEntry;
pub use undo::{UndoManager, UndoReport};

pub use cli::{Command, run};
