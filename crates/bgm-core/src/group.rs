//! Materialized tab groups and the tabs inside them

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ColorParseError;
use crate::token::GroupToken;

/// The colors a tab group can carry, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TabGroupColor {
    #[default]
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
}

impl TabGroupColor {
    /// Every color, indexed by its wire value
    pub const ALL: [TabGroupColor; 9] = [
        Self::Grey,
        Self::Blue,
        Self::Red,
        Self::Yellow,
        Self::Green,
        Self::Pink,
        Self::Purple,
        Self::Cyan,
        Self::Orange,
    ];

    /// Map a wire value to a color; anything out of range is grey
    pub fn from_wire(value: u32) -> Self {
        Self::ALL
            .get(value as usize)
            .copied()
            .unwrap_or(Self::Grey)
    }

    /// The value written to the log for this color
    pub fn wire_value(self) -> u32 {
        self as u32
    }

    /// Lowercase color name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grey => "grey",
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Pink => "pink",
            Self::Purple => "purple",
            Self::Cyan => "cyan",
            Self::Orange => "orange",
        }
    }
}

impl Display for TabGroupColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TabGroupColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        // "gray" is accepted as an alias
        if wanted == "gray" {
            return Ok(Self::Grey);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|color| color.as_str() == wanted)
            .ok_or_else(|| ColorParseError(s.to_string()))
    }
}

/// A tab as reconstructed from the session log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    /// Session id of the tab
    pub id: u32,
    pub url: String,
    pub title: String,
    /// Position within its window
    pub index: u32,
}

/// A named, colored group of tabs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabGroup {
    pub token: GroupToken,
    pub name: String,
    pub color: TabGroupColor,
    /// Member tabs ordered by index
    pub tabs: Vec<Tab>,
}

impl TabGroup {
    /// Whether the name looks like an auto-synced phone group ("3 tabs")
    pub fn is_phone_sync_junk(&self) -> bool {
        is_phone_sync_name(&self.name)
    }
}

/// A tab to be written into a new group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInput {
    pub url: String,
    pub title: String,
}

impl TabInput {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// Matches `<digits> tab` or `<digits> tabs`, ignoring case and outer whitespace
pub fn is_phone_sync_name(name: &str) -> bool {
    let trimmed = name.trim();
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    let rest = &trimmed[digits..];
    let word = rest.trim_start();
    if word.len() == rest.len() {
        // no separating whitespace
        return false;
    }
    word.eq_ignore_ascii_case("tab") || word.eq_ignore_ascii_case("tabs")
}

/// Case-insensitive lookup of a group by display name
pub fn find_group_by_name<'a>(groups: &'a [TabGroup], name: &str) -> Option<&'a TabGroup> {
    let wanted = name.to_lowercase();
    groups.iter().find(|g| g.name.to_lowercase() == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str) -> TabGroup {
        TabGroup {
            token: GroupToken::new(1, 2),
            name: name.to_string(),
            color: TabGroupColor::Blue,
            tabs: Vec::new(),
        }
    }

    #[test]
    fn test_color_from_wire() {
        assert_eq!(TabGroupColor::from_wire(0), TabGroupColor::Grey);
        assert_eq!(TabGroupColor::from_wire(1), TabGroupColor::Blue);
        assert_eq!(TabGroupColor::from_wire(8), TabGroupColor::Orange);
        assert_eq!(TabGroupColor::from_wire(99), TabGroupColor::Grey);
        assert_eq!(TabGroupColor::from_wire(u32::MAX), TabGroupColor::Grey);
    }

    #[test]
    fn test_color_wire_value_matches_table() {
        for (i, color) in TabGroupColor::ALL.iter().enumerate() {
            assert_eq!(color.wire_value(), i as u32);
            assert_eq!(TabGroupColor::from_wire(i as u32), *color);
        }
    }

    #[test]
    fn test_color_parse() {
        assert_eq!("Cyan".parse::<TabGroupColor>().unwrap(), TabGroupColor::Cyan);
        assert_eq!("gray".parse::<TabGroupColor>().unwrap(), TabGroupColor::Grey);
        assert!("mauve".parse::<TabGroupColor>().is_err());
    }

    #[test]
    fn test_color_serde_lowercase() {
        let json = serde_json::to_string(&TabGroupColor::Purple).unwrap();
        assert_eq!(json, "\"purple\"");
    }

    #[test]
    fn test_phone_sync_names() {
        assert!(is_phone_sync_name("1 tab"));
        assert!(is_phone_sync_name("12 Tabs"));
        assert!(is_phone_sync_name("  3 tabs "));
        assert!(!is_phone_sync_name("tabs"));
        assert!(!is_phone_sync_name("3tabs"));
        assert!(!is_phone_sync_name("3 tabs of news"));
        assert!(!is_phone_sync_name("Work"));
        assert!(group("2 tabs").is_phone_sync_junk());
    }

    #[test]
    fn test_find_group_by_name_ignores_case() {
        let groups = vec![group("Work"), group("Reading")];
        assert_eq!(find_group_by_name(&groups, "work").unwrap().name, "Work");
        assert!(find_group_by_name(&groups, "play").is_none());
    }
}
