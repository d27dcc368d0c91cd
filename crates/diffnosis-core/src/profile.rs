//! The user-entered profile the relay attaches to every symptom prompt.
//!
//! Fields are free text even where they look numeric; nothing here validates
//! them. The front-end owns the editable copy and hands the session a snapshot.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Some(Sex::Male),
            "female" | "f" => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn all() -> Vec<Sex> {
        vec![Sex::Male, Sex::Female]
    }

    /// The other option, for two-state pickers.
    pub fn toggled(&self) -> Self {
        match self {
            Sex::Male => Sex::Female,
            Sex::Female => Sex::Male,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: String,
    pub email: String,
    /// Centimetres.
    pub height: String,
    /// Kilograms.
    pub weight: String,
    pub sex: Sex,
    #[serde(skip)]
    pub photo: Option<Vec<u8>>,
}

impl UserProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_photo(mut self, bytes: Vec<u8>) -> Self {
        self.photo = Some(bytes);
        self
    }

    /// Read the photo from disk and attach it to the profile.
    pub fn with_photo_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Could not read photo {}", path.display()))?;
        Ok(self.with_photo(bytes))
    }

    /// The photo, if one is attached and it has any bytes in it.
    pub fn usable_photo(&self) -> Option<&[u8]> {
        self.photo.as_deref().filter(|bytes| !bytes.is_empty())
    }
}
