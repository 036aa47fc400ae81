//! Shared types for turning Wiktionary extractions into a headword dictionary.
//!
//! Three layers live here:
//! - [`record`]: the raw, one-object-per-sense schema as it arrives on the wire
//!   (`serde`-deserialized, unknown fields ignored).
//! - [`entry`]: the canonical [`HeadwordEntry`] keyed by `(headword, pos)` and
//!   its merge rules.
//! - [`script`]: the [`Alphabet`] description and the normalizer that derives
//!   sort keys and first-letter classifications from it.
//!
//! ```rust
//! use lexis_types::{Alphabet, case_variants};
//!
//! let greek = Alphabet::greek();
//! assert_eq!(greek.sort_key("Άγιος"), "αγιοσ");
//! assert_eq!(greek.classify("Ώρα"), Some('ω'));
//! assert!(case_variants("γράφω").contains(&"Γράφω".to_string()));
//! ```

pub mod entry;
pub mod record;
pub mod script;

pub use entry::{EntryKey, HeadwordEntry, PLACEHOLDER_DEFINITION};
pub use record::{Form, FormOf, RawRecord, RelatedWord, Sense, Template};
pub use script::{Alphabet, case_variants, key_order};
