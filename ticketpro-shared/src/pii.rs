use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps passenger data (passport numbers, phone numbers) so it never leaks
/// through `Debug`/`Display`, e.g. `tracing::info!("{:?}", form)`.
///
/// Serialization still writes the real value: API responses and backups need it.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
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
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Masked<String> {
    /// Last `n` characters with the rest starred out, for printed confirmations.
    pub fn tail(&self, n: usize) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let keep = n.min(chars.len());
        let hidden = chars.len() - keep;
        let mut out = "*".repeat(hidden);
        out.extend(&chars[hidden..]);
        out
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}
