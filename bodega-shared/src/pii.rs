use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for customer-identifying values (mobile numbers, addresses) that
/// masks them in Debug/Display output while serializing the real value.
///
/// Log macros see `******63`; API responses see the full value. Keeping the
/// last two characters lets support staff correlate log lines with a
/// customer without the full number ever reaching the log sink.
#[derive(Clone, Deserialize)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> Masked<T> {
    fn masked_repr(&self) -> String {
        let full = self.0.to_string();
        let skip = full.chars().count().saturating_sub(2);
        let tail: String = full.chars().skip(skip).collect();
        format!("******{tail}")
    }
}

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked_repr())
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked_repr())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}
