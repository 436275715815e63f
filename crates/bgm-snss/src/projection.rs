//! Projection engine: replays commands into the current tab groups
//!
//! One forward fold builds four last-write-wins tables:
//!
//! - tab -> index (set_tab_index_in_window)
//! - tab -> url/title (update_tab_navigation)
//! - tab -> current token (set_tab_group)
//! - token -> name/color (set_tab_group_metadata)
//!
//! Groups are then read off the metadata table. Nothing is cached; every
//! call replays the whole history.

use std::collections::HashMap;

use tracing::debug;

use bgm_core::{GroupToken, Tab, TabGroup, TabGroupColor};

use crate::command::SessionCommand;

/// Title given to tabs whose navigation never recorded one
pub const UNKNOWN_TAB_TITLE: &str = "Unknown";

#[derive(Debug, Clone)]
struct Navigation {
    url: String,
    title: String,
}

#[derive(Debug, Clone)]
struct GroupMeta {
    /// Position of the token's first appearance
    first_seen: usize,
    name: String,
    color: TabGroupColor,
}

/// Lookup tables produced by replaying a command sequence
#[derive(Debug, Clone, Default)]
pub struct ReplayTables {
    tab_index: HashMap<u32, u32>,
    navigation: HashMap<u32, Navigation>,
    tab_token: HashMap<u32, GroupToken>,
    /// Tabs in the order they were first assigned to any group
    assigned_tabs: Vec<u32>,
    metadata: HashMap<GroupToken, GroupMeta>,
}

impl ReplayTables {
    /// Fold a command sequence into tables
    pub fn replay<'a, I>(commands: I) -> Self
    where
        I: IntoIterator<Item = &'a SessionCommand>,
    {
        commands.into_iter().fold(Self::default(), Self::apply)
    }

    /// Apply one command, returning the updated tables
    pub fn apply(mut self, command: &SessionCommand) -> Self {
        match command {
            SessionCommand::SetTabIndexInWindow { tab_id, index } => {
                self.tab_index.insert(*tab_id, *index);
            }
            SessionCommand::UpdateTabNavigation {
                tab_id, url, title, ..
            } => {
                self.navigation.insert(
                    *tab_id,
                    Navigation {
                        url: url.clone(),
                        title: title.clone(),
                    },
                );
            }
            SessionCommand::SetTabGroup { tab_id, token } => {
                if self.tab_token.insert(*tab_id, *token).is_none() {
                    self.assigned_tabs.push(*tab_id);
                }
            }
            SessionCommand::SetTabGroupMetadata {
                token,
                title,
                color,
            } => {
                let first_seen = self
                    .metadata
                    .get(token)
                    .map_or(self.metadata.len(), |meta| meta.first_seen);
                self.metadata.insert(
                    *token,
                    GroupMeta {
                        first_seen,
                        name: title.clone(),
                        color: *color,
                    },
                );
            }
            _ => {}
        }
        self
    }

    /// Number of distinct group tokens with metadata
    pub fn group_count(&self) -> usize {
        self.metadata.len()
    }

    /// Current token of a tab, if it was ever assigned
    pub fn token_of(&self, tab_id: u32) -> Option<GroupToken> {
        self.tab_token.get(&tab_id).copied()
    }

    fn resolve_tab(&self, tab_id: u32) -> Tab {
        let index = self.tab_index.get(&tab_id).copied().unwrap_or(0);
        let (url, title) = match self.navigation.get(&tab_id) {
            Some(nav) => (nav.url.clone(), nav.title.clone()),
            None => (String::new(), String::new()),
        };
        Tab {
            id: tab_id,
            url,
            title: if title.is_empty() {
                UNKNOWN_TAB_TITLE.to_string()
            } else {
                title
            },
            index,
        }
    }

    /// Materialize the tab groups.
    ///
    /// Tabs without a URL are dropped; they never finished loading or were
    /// already closed. Tabs sort by index, groups by name and then by first
    /// appearance of their token.
    pub fn tab_groups(&self) -> Vec<TabGroup> {
        let mut metas: Vec<(&GroupToken, &GroupMeta)> = self.metadata.iter().collect();
        metas.sort_by(|a, b| {
            a.1.name
                .cmp(&b.1.name)
                .then(a.1.first_seen.cmp(&b.1.first_seen))
        });

        metas
            .into_iter()
            .map(|(token, meta)| {
                let mut tabs: Vec<Tab> = self
                    .assigned_tabs
                    .iter()
                    .filter(|tab_id| self.tab_token.get(*tab_id) == Some(token))
                    .map(|tab_id| self.resolve_tab(*tab_id))
                    .filter(|tab| !tab.url.is_empty())
                    .collect();
                tabs.sort_by_key(|tab| tab.index);

                TabGroup {
                    token: *token,
                    name: meta.name.clone(),
                    color: meta.color,
                    tabs,
                }
            })
            .collect()
    }
}

/// Replay commands and return the current tab groups.
///
/// An empty result is normal: groups only reach the log once the browser
/// has persisted them.
pub fn project<'a, I>(commands: I) -> Vec<TabGroup>
where
    I: IntoIterator<Item = &'a SessionCommand>,
{
    let tables = ReplayTables::replay(commands);
    let groups = tables.tab_groups();
    debug!(groups = groups.len(), "Projected tab groups");
    groups
}
