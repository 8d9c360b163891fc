//! Shared primitive types used across the whole pipeline.

/// A user identifier, in its textual form. Numeric identifiers are
/// rendered without a fractional part when they are whole numbers.
pub type UserId = String;

/// A column name as it appears in a dataset header.
pub type ColumnName = String;

/// The canonical identifier of one persisted evaluation run.
pub type RunId = String;
