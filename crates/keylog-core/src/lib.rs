//! Award eligibility and progress engine for a CW operators' club.
//!
//! Given a snapshot of logged contacts, the engine computes progress toward
//! every club award: membership tiers with endorsements, band-scored QRP
//! points, miles-per-watt contacts, regional coverage levels, key-type
//! diversity, conversation time, prefix points and DX entities. Evaluation is a pure function of the snapshot and the rule
//! tables.
//!
//! ```
//! use keylog_core::{evaluate_all, AwardId, ContactRecord, Mode, RuleTables};
//!
//! let contacts = vec![ContactRecord::new("W1AW").with_mode(Mode::Cw).with_membership("1234C")];
//! let report = evaluate_all(&contacts, &RuleTables::default());
//! assert_eq!(report.get(AwardId::Centurion).unwrap().current_value, 1.0);
//! ```

pub mod awards;
pub mod error;
pub mod identifier;
pub mod models;
pub mod source;

pub use awards::{evaluate_all, AwardEngine, AwardReport, RuleTables};
pub use error::{IdentifierError, RuleTableError};
pub use identifier::{LevelCode, ParsedIdentifier};
pub use models::*;
pub use source::{ContactQuery, ContactSource};
