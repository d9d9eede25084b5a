use crate::prelude::*;

/// Length of generated challenge codes.
const CODE_LEN: usize = 8;

/// Random human-readable challenge code, e.g. `3F9A01BC`.
/// Uniqueness is checked against the database by the caller.
pub fn short_code() -> String {
  Uuid::new_v4().simple().to_string()[..CODE_LEN].to_uppercase()
}
