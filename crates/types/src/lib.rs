//! Validated text types shared across the mediastore crates.
//!
//! Each type checks its invariant once, at construction, so holders never need to
//! re-validate.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The input was not a lowercase hexadecimal SHA-1 digest
    #[error("Invalid SHA-1 digest: '{0}'")]
    InvalidSha1(String),

    /// The input is not an already-sanitised file name
    #[error("Invalid file name: '{0}'")]
    InvalidFileName(String),
}

/// A sanitised file name.
///
/// Only `a-z`, `0-9`, `-`, `_` and `.` survive, the name never starts or ends with `-`,
/// and it is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileName(String);

impl FileName {
    /// Normalises an arbitrary name.
    ///
    /// Surrounding whitespace is trimmed, every character outside `[0-9a-zA-Z-_.]` becomes
    /// `-`, leading and trailing `-` are trimmed and the result is lowercased.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] when nothing is left after normalisation.
    pub fn sanitize(input: impl AsRef<str>) -> Result<Self, TextError> {
        let replaced: String = input
            .as_ref()
            .trim()
            .chars()
            .map(|c| if Self::is_allowed(c) { c } else { '-' })
            .collect();

        let name = replaced.trim_matches('-').to_ascii_lowercase();
        if name.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(name))
    }

    /// Accepts a name that is already in sanitised form, without rewriting it.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for an empty input and [`TextError::InvalidFileName`]
    /// when the input would be changed by [`FileName::sanitize`].
    pub fn parse(input: &str) -> Result<Self, TextError> {
        if input.is_empty() {
            return Err(TextError::Empty);
        }
        let is_clean = input
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | '_' | '.'))
            && !input.starts_with('-')
            && !input.ends_with('-');
        if !is_clean {
            return Err(TextError::InvalidFileName(input.to_owned()));
        }
        Ok(Self(input.to_owned()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_allowed(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
    }
}

impl std::fmt::Display for FileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for FileName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for FileName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FileName::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Hexadecimal SHA-1 digest (40 lowercase hex characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sha1Hash(String);

impl Sha1Hash {
    /// Length of the hex form.
    pub const HEX_LEN: usize = 40;

    /// Builds the hex form of a raw 20-byte digest.
    pub fn from_bytes(bytes: &[u8; 20]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Validates a hex digest string.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::InvalidSha1`] unless `input` is exactly 40 lowercase hex
    /// characters.
    pub fn parse(input: &str) -> Result<Self, TextError> {
        let valid = input.len() == Self::HEX_LEN
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !valid {
            return Err(TextError::InvalidSha1(input.to_owned()));
        }
        Ok(Self(input.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sha1Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Sha1Hash {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for Sha1Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Sha1Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Sha1Hash::parse(&s).map_err(serde::de::Error::custom)
    }
}
