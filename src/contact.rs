//! The contact record behind a business card.
//!
//! A [`ContactRecord`] starts out with the organization defaults filled in and
//! the personal fields empty. Every field may be edited on its own; the only
//! coupling is [`ContactRecord::select_location`], which replaces the address
//! with the fixed mailing address of one of the three sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_COMPANY: &str = "Reha-Zentrum Bad Pyrmont";
pub const DEFAULT_WEBSITE: &str = "www.rehazentrum-badpyrmont.de";
pub const DEFAULT_ADDRESS: &str = "Schulstraße 2, 31812 Bad Pyrmont, Germany";

/// Job-role labels offered by the position picker.
pub const POSITIONS: &[&str] = &[
    "Stationsarzt",
    "Physiotherapeut",
    "Ergotherapeut",
    "Pflegekraft",
    "Sozialarbeiter",
    "Psychologe",
    "Verwaltung",
    "Rezeption",
    "Ernährungsberater",
];

/// One of the three sites a card holder can work at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    #[serde(rename = "Klinik Weser")]
    KlinikWeser,
    #[serde(rename = "Brunswiek")]
    Brunswiek,
    #[serde(rename = "Friedrichshöhe")]
    Friedrichshoehe,
}

impl Location {
    pub const ALL: [Location; 3] = [
        Location::KlinikWeser,
        Location::Brunswiek,
        Location::Friedrichshoehe,
    ];

    /// Display label, as shown in the site picker
    pub fn label(self) -> &'static str {
        match self {
            Location::KlinikWeser => "Klinik Weser",
            Location::Brunswiek => "Brunswiek",
            Location::Friedrichshoehe => "Friedrichshöhe",
        }
    }

    /// Fixed mailing address of the site
    pub fn address(self) -> &'static str {
        match self {
            Location::KlinikWeser => "Schulstraße 2, 31812 Bad Pyrmont",
            Location::Brunswiek => "Auf der Schanze 5, 31812 Bad Pyrmont",
            Location::Friedrichshoehe => "Forstweg 2, 31812 Bad Pyrmont",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::ALL
            .into_iter()
            .find(|loc| loc.label() == s.trim())
            .ok_or_else(|| format!("unknown location '{}'", s))
    }
}

/// Structured contact details printed on the card and encoded into the vCard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactRecord {
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub company: String,
    pub phone: String,
    pub fax: String,
    pub email: String,
    pub website: String,
    pub address: String,
    /// Selected site, for display only. Never updates `company`.
    pub location: Option<Location>,
}

impl Default for ContactRecord {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            position: String::new(),
            company: DEFAULT_COMPANY.to_string(),
            phone: String::new(),
            fax: String::new(),
            email: String::new(),
            website: DEFAULT_WEBSITE.to_string(),
            address: DEFAULT_ADDRESS.to_string(),
            location: None,
        }
    }
}

impl ContactRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a site selection by its label.
    ///
    /// A known label overwrites `address` with that site's fixed address,
    /// whatever the address held before. Anything else (including the empty
    /// string) clears both the address and the location.
    pub fn select_location(&mut self, label: &str) {
        match label.parse::<Location>() {
            Ok(loc) => self.set_location(Some(loc)),
            Err(_) => self.set_location(None),
        }
    }

    /// Typed variant of [`ContactRecord::select_location`]
    pub fn set_location(&mut self, location: Option<Location>) {
        self.address = location.map(|l| l.address().to_string()).unwrap_or_default();
        self.location = location;
    }

    /// `"<first> <last>"`, trimmed when one half is missing
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// A front face can only be shown once a name has been entered.
    pub fn has_name(&self) -> bool {
        !self.first_name.is_empty() || !self.last_name.is_empty()
    }

    /// Whether `position` is one of the predefined role labels
    pub fn has_known_position(&self) -> bool {
        POSITIONS.contains(&self.position.as_str())
    }
}
