/// Ingestion of well level logger exports.
///
/// - `levels_csv`: delimited text exports: column lookup, timestamp and
///   level parsing, sort + de-duplication into a `Series`.
/// - `fixtures` (test only): representative exports and synthetic series.
///
/// New logger formats get their own file here rather than growing
/// `levels_csv`.

pub mod levels_csv;

#[cfg(test)]
pub(crate) mod fixtures;
