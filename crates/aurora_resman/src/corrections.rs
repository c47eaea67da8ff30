//! Explicit exceptions for assets known to declare the wrong data.
//!
//! Some shipped assets carry a wrong value that the game worked around for exactly that one
//! asset. Such workarounds live in a [`CorrectionTable`] keyed by container and entry name,
//! never as a general rule.
//!
//! | Container         | Entry          | Correction                      |
//! |-------------------|----------------|---------------------------------|
//! | `options_adv_vid` | `CreatureWind` | the widget is built as a slider |

use std::collections::HashMap;

/// A table of values replacing what single known-bad assets declare
///
/// Keys are `(container, entry)` pairs. Tables made with [`CorrectionTable::new`] compare them
/// ignoring ASCII case, the way resource names are compared. Tables made with
/// [`CorrectionTable::case_sensitive`] compare them exactly.
#[derive(Debug, Clone)]
pub struct CorrectionTable<T> {
    ignore_case: bool,
    entries: HashMap<(Box<str>, Box<str>), T>,
}

impl<T> Default for CorrectionTable<T> {
    fn default() -> Self {
        Self {
            ignore_case: true,
            entries: HashMap::new(),
        }
    }
}

impl<T> CorrectionTable<T> {
    /// An empty table comparing keys ignoring ASCII case
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty table comparing keys exactly
    pub fn case_sensitive() -> Self {
        Self {
            ignore_case: false,
            ..Self::default()
        }
    }

    fn key(&self, container: &str, entry: &str) -> (Box<str>, Box<str>) {
        if self.ignore_case {
            (
                container.to_ascii_lowercase().into_boxed_str(),
                entry.to_ascii_lowercase().into_boxed_str(),
            )
        } else {
            (container.into(), entry.into())
        }
    }

    /// Add a correction, returning the one it replaces
    pub fn insert(&mut self, container: &str, entry: &str, value: T) -> Option<T> {
        let key = self.key(container, entry);
        self.entries.insert(key, value)
    }

    /// The correction for an entry of a container, if there is one
    pub fn lookup(&self, container: &str, entry: &str) -> Option<&T> {
        if self.entries.is_empty() {
            return None;
        }
        self.entries.get(&self.key(container, entry))
    }

    /// Number of corrections
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no corrections
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a, T> FromIterator<(&'a str, &'a str, T)> for CorrectionTable<T> {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str, T)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (container, entry, value) in iter {
            table.insert(container, entry, value);
        }
        table
    }
}

/// Kinds of widgets a GUI description can declare
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Decorative frame
    Frame,
    /// Button closing its GUI
    CloseButton,
    /// Toggle with a check mark
    CheckBox,
    /// Container of other widgets
    Panel,
    /// Static text
    Label,
    /// Slider over a range of values
    Slider,
    /// Text input
    EditBox,
    /// Push button
    Button,
}

/// Widget kinds the GUI builder has to force for known-bad GUI descriptions
///
/// The container is the name of the GUI description, the entry is the widget tag and the
/// value is the widget kind to build instead of the declared one. Both are matched exactly,
/// with case.
pub fn gui_widget_corrections() -> CorrectionTable<WidgetKind> {
    let mut table = CorrectionTable::case_sensitive();
    table.insert("options_adv_vid", "CreatureWind", WidgetKind::Slider);
    table
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{gui_widget_corrections, CorrectionTable, WidgetKind};

    #[test]
    fn lookup_ignores_case() {
        let mut table = CorrectionTable::new();
        assert_eq!(table.insert("Module.MOD", "Entry", 1), None);
        assert_eq!(table.insert("module.mod", "entry", 2), Some(1));

        assert_eq!(table.lookup("MODULE.mod", "ENTRY"), Some(&2));
        assert_eq!(table.lookup("module.mod", "other"), None);
        assert_eq!(table.lookup("other.mod", "entry"), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn case_sensitive_lookup() {
        let mut table = CorrectionTable::case_sensitive();
        table.insert("Gui", "Tag", 1);
        assert_eq!(table.lookup("Gui", "Tag"), Some(&1));
        assert_eq!(table.lookup("gui", "tag"), None);
    }

    #[test]
    fn known_widget_correction() {
        let table = gui_widget_corrections();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.lookup("options_adv_vid", "CreatureWind"),
            Some(&WidgetKind::Slider)
        );
        assert_eq!(table.lookup("options_adv_vid", "creaturewind"), None);
        assert_eq!(table.lookup("Options_Adv_Vid", "CreatureWind"), None);
        assert_eq!(table.lookup("options_adv_vid", "CreatureRain"), None);
        assert_eq!(table.lookup("options_vid", "CreatureWind"), None);
    }
}
