use crate::tab::Tab;

/// Tabs in insertion order, addressed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabGroup {
    tabs: Vec<Tab>,
}

impl TabGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// A group holding only the stock `General` tab.
    pub fn with_default_tab() -> Self {
        Self {
            tabs: vec![Tab::general()],
        }
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|tab| tab.name() == name)
    }

    pub fn first(&self) -> Option<&Tab> {
        self.tabs.first()
    }

    pub fn at(&self, index: usize) -> Option<&Tab> {
        self.tabs.get(index)
    }

    /// Appends `tab`, or replaces a same-named tab where it stands.
    pub fn insert(&mut self, tab: Tab) {
        match self.position(tab.name()) {
            Some(index) => self.tabs[index] = tab,
            None => self.tabs.push(tab),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Tab> {
        let index = self.position(name)?;
        Some(self.tabs.remove(index))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tab> {
        self.tabs.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Tab> {
        self.tabs.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tabs.iter().map(Tab::name)
    }
}

impl<'a> IntoIterator for &'a TabGroup {
    type Item = &'a Tab;
    type IntoIter = std::slice::Iter<'a, Tab>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
