//! Shared types for media plan and budget reconciliation.

pub mod error;
pub mod exception;
pub mod ledger;
pub mod lookup;
pub mod record;
pub mod reference;
pub mod value;

pub use error::{ModelError, Result};
pub use exception::{EXCEPTION_COLUMNS, ExceptionEvent, IssueType, Owner, Priority};
pub use ledger::ExceptionLedger;
pub use lookup::ColumnIndex;
pub use record::{Provenance, Record};
pub use reference::{ReferenceRow, ReferenceTable};
pub use value::Value;
