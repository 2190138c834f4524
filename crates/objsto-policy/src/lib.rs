//! Canonicalization of S3 bucket policy documents.
//!
//! Object storage services rarely hand back a bucket policy byte-for-byte the
//! way it was written: keys get reordered, `ID` becomes `Id`, a single action
//! comes back as an array, `"*"` principals get expanded. This crate reduces a
//! policy document to a canonical JSON string so that a configured document
//! and a remotely observed one can be compared with plain string equality.
//!
//! ```text
//!   raw JSON ──decode──▶ PolicyDocument ──normalize──▶ PolicyDocument ──encode──▶ canonical JSON
//!                        (Action::Single | Many,                          (keys sorted
//!                         Principal::Wildcard | ...)                       recursively)
//! ```
//!
//! # Examples
//!
//! ```
//! use objsto_policy::normalize_policy_document;
//!
//! let canonical = normalize_policy_document(r#"{"ID":"PublicRead"}"#).unwrap();
//! assert_eq!(canonical, r#"{"Id":"PublicRead"}"#);
//! ```

mod compare;
mod document;
mod error;
mod normalize;

pub use compare::{ensure_consistent, equivalent, normalize_pair};
pub use document::{Action, ActionItem, PolicyDocument, Principal, Statement, StatementEntry, Statements};
pub use error::{PolicyError, PolicyResult};
pub use normalize::normalize_policy_document;
