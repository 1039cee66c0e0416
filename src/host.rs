//! Capabilities the tab core needs from whoever embeds it.

use crate::tab::Tab;

/// Displays accepted messages.
pub trait ScreenHost {
    /// `line` was accepted by `tab` in group `group`. It is passed on exactly
    /// as received, formatting included.
    fn show_line(&mut self, group: usize, tab: &Tab, line: &str);

    /// The tab was deleted; anything kept for it can be dropped.
    fn tab_removed(&mut self, _group: usize, _name: &str) {}
}

/// Side effect for tabs configured to notify.
pub trait Notifier {
    fn notify(&mut self, tab: &Tab);
}

/// A screen that shows nothing, for one-shot commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullScreen;

impl ScreenHost for NullScreen {
    fn show_line(&mut self, _group: usize, _tab: &Tab, _line: &str) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Notifier for Silent {
    fn notify(&mut self, _tab: &Tab) {}
}
