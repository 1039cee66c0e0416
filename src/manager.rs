//! The tab manager: groups of tabs, which one is showing, and the page of
//! tab labels in view.

use tracing::{debug, info, trace};

use crate::error::{Result, TabError};
use crate::group::TabGroup;
use crate::host::{Notifier, ScreenHost};
use crate::store::TabStore;
use crate::tab::{Tab, TabSettings, check_field};
use crate::text;

/// Tab labels shown at once.
pub const TABS_PER_PAGE: usize = 5;

/// Outgoing messages are cut to this many characters.
pub const MAX_OUTGOING_LEN: usize = 100;

/// Owns every tab group. All operations keep these invariants: there is at
/// least one group, no group is empty, the active group index is in range,
/// and the active tab (when set) names a tab of the active group.
pub struct TabManager<H, N> {
    groups: Vec<TabGroup>,
    active_group: usize,
    active_tab: Option<String>,
    tab_offset: usize,
    store: TabStore,
    host: H,
    notifier: N,
}

impl<H: ScreenHost, N: Notifier> TabManager<H, N> {
    /// Loads the saved layout, falling back to a single `General` tab.
    pub fn new(store: TabStore, host: H, notifier: N) -> Self {
        let groups = store.load();
        Self::with_groups(store, groups, host, notifier)
    }

    pub fn with_groups(store: TabStore, mut groups: Vec<TabGroup>, host: H, notifier: N) -> Self {
        if groups.is_empty() {
            debug!("no saved tabs, starting with the default group");
            groups.push(TabGroup::with_default_tab());
        }
        for group in groups.iter_mut().filter(|group| group.is_empty()) {
            group.insert(Tab::general());
        }

        let mut manager = Self {
            groups,
            active_group: 0,
            active_tab: None,
            tab_offset: 0,
            store,
            host,
            notifier,
        };
        manager.reset_selected_tab();
        manager
    }

    /// Classifies `raw` against every tab of every group. Returns how many
    /// tabs accepted it.
    pub fn deliver(&mut self, raw: &str) -> usize {
        let plain = text::plain_text(raw);
        let mut accepted = 0;

        for (index, group) in self.groups.iter_mut().enumerate() {
            let is_active_group = index == self.active_group;
            for tab in group.iter_mut() {
                if !tab.accepts_message(&plain) {
                    continue;
                }

                accepted += 1;
                let showing = is_active_group && self.active_tab.as_deref() == Some(tab.name());
                if !showing {
                    tab.mark_unread();
                }
                self.host.show_line(index, tab, raw);
                if tab.notifies() {
                    self.notifier.notify(tab);
                }
            }
        }

        trace!(accepted, "delivered message");
        accepted
    }

    /// Adds a tab at the end of the active group. Name clashes are the
    /// editor's to prevent; a clashing tab is replaced where it stands.
    pub fn create_tab(&mut self, name: &str, settings: &TabSettings) -> Result<()> {
        let tab = Tab::new(name, settings)?;
        info!(group = self.active_group, tab = name, "created tab");
        self.active_group_mut().insert(tab);
        Ok(())
    }

    pub fn edit_tab(&mut self, name: &str, settings: &TabSettings) -> Result<()> {
        self.edit_tab_in(self.active_group, name, settings)
    }

    pub fn edit_tab_in(&mut self, group: usize, name: &str, settings: &TabSettings) -> Result<()> {
        check_field("prefix", &settings.prefix)?;
        let tab = self
            .groups
            .get_mut(group)
            .and_then(|tabs| tabs.get_mut(name))
            .ok_or_else(|| TabError::UnknownTab(name.to_owned()))?;

        tab.update_pattern(
            &settings.pattern,
            settings.literal,
            settings.whitelist,
            settings.notify,
        )?;
        tab.set_prefix(settings.prefix.clone())?;
        info!(group, tab = name, "edited tab");
        Ok(())
    }

    /// Removes a tab from the active group. An emptied group gets a fresh
    /// `General` tab.
    pub fn delete_tab(&mut self, name: &str) {
        let index = self.active_group;
        let group = &mut self.groups[index];
        if group.remove(name).is_none() {
            debug!(tab = name, "delete ignored, no such tab");
            return;
        }
        if group.is_empty() {
            group.insert(Tab::general());
        }

        info!(group = index, tab = name, "deleted tab");
        self.host.tab_removed(index, name);

        let still_active = self
            .active_tab
            .as_deref()
            .is_some_and(|active| active != name && self.active_tab_group().contains(active));
        if still_active {
            self.clamp_offset();
        } else {
            self.reset_selected_tab();
        }
    }

    /// Ignored unless `name` is in the active group.
    pub fn make_tab_active(&mut self, name: &str) {
        if let Some(tab) = self.active_group_mut().get_mut(name) {
            tab.mark_read();
            self.active_tab = Some(name.to_owned());
        }
    }

    /// Activates the tab after the active one, wrapping around, and scrolls
    /// the page so it is in view.
    pub fn next_tab(&mut self) {
        let group = self.active_tab_group();
        let next = self
            .active_tab
            .as_deref()
            .and_then(|active| group.position(active))
            .map_or(0, |position| (position + 1) % group.len());

        if let Some(name) = group.at(next).map(|tab| tab.name().to_owned()) {
            self.make_tab_active(&name);
            self.tab_offset = next - next % TABS_PER_PAGE;
        }
    }

    pub fn previous_tab_page(&mut self) {
        self.tab_offset = self.tab_offset.saturating_sub(TABS_PER_PAGE);
    }

    pub fn next_tab_page(&mut self) {
        if self.tab_offset + TABS_PER_PAGE < self.active_tab_group().len() {
            self.tab_offset += TABS_PER_PAGE;
        }
    }

    /// Moves to the next group. Past the last group this wraps to the first
    /// when the last one is still an untouched default, and otherwise opens a
    /// new default group.
    pub fn cycle_tab_group(&mut self) {
        if self.active_group + 1 < self.groups.len() {
            self.active_group += 1;
        } else if is_placeholder(&self.groups[self.active_group]) {
            self.active_group = 0;
        } else {
            self.groups.push(TabGroup::with_default_tab());
            self.active_group = self.groups.len() - 1;
            info!(group = self.active_group, "opened new tab group");
        }
        self.reset_selected_tab();
    }

    /// Jumps to an existing group. Returns false when `index` is out of range.
    pub fn select_group(&mut self, index: usize) -> bool {
        if index >= self.groups.len() {
            return false;
        }
        self.active_group = index;
        self.reset_selected_tab();
        true
    }

    /// Persists every group. Failures are logged by the store.
    pub fn save_state(&self) {
        self.store.save(&self.groups);
    }

    /// Prepends the active tab's prefix to a chat message. Commands (leading
    /// `/`) pass through unchanged.
    pub fn compose_outgoing(&self, message: &str) -> String {
        if message.starts_with('/') {
            return message.to_owned();
        }

        let composed = format!("{}{}", self.active_prefix(), message);
        if composed.chars().count() > MAX_OUTGOING_LEN {
            composed.chars().take(MAX_OUTGOING_LEN).collect()
        } else {
            composed
        }
    }

    pub fn groups(&self) -> &[TabGroup] {
        &self.groups
    }

    pub fn active_group_index(&self) -> usize {
        self.active_group
    }

    pub fn active_tab_group(&self) -> &TabGroup {
        &self.groups[self.active_group]
    }

    /// The page of the active group currently in view.
    pub fn visible_tabs(&self) -> impl Iterator<Item = &Tab> {
        self.active_tab_group()
            .iter()
            .skip(self.tab_offset)
            .take(TABS_PER_PAGE)
    }

    pub fn tab_offset(&self) -> usize {
        self.tab_offset
    }

    pub fn active_chat(&self) -> Option<&Tab> {
        self.active_tab
            .as_deref()
            .and_then(|name| self.active_tab_group().get(name))
    }

    pub fn active_prefix(&self) -> &str {
        self.active_chat().map_or("", Tab::prefix)
    }

    pub fn is_tab_active(&self, name: &str) -> bool {
        self.active_tab.as_deref() == Some(name)
    }

    pub fn does_tab_exist_in_active_group(&self, name: &str) -> bool {
        self.active_tab_group().contains(name)
    }

    pub fn store(&self) -> &TabStore {
        &self.store
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    fn active_group_mut(&mut self) -> &mut TabGroup {
        &mut self.groups[self.active_group]
    }

    fn reset_selected_tab(&mut self) {
        let first = self.active_tab_group().first().map(|tab| tab.name().to_owned());
        self.tab_offset = 0;
        self.active_tab = None;
        if let Some(name) = first {
            self.make_tab_active(&name);
        }
    }

    /// Keeps the offset on a page that still has tabs after a removal.
    fn clamp_offset(&mut self) {
        let len = self.active_tab_group().len();
        if self.tab_offset >= len {
            let last = len.saturating_sub(1);
            self.tab_offset = last - last % TABS_PER_PAGE;
        }
    }
}

fn is_placeholder(group: &TabGroup) -> bool {
    group.len() == 1 && group.first().is_some_and(Tab::is_untouched_default)
}
