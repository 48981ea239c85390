//! Attractor selection and the pending-reset flag.

use crate::attractor::AttractorVariant;
use crate::error::SelectionError;

/// The fixed attractor catalog and the user's current selection.
///
/// Selecting a new entry only raises a pending reset; the frame scheduler
/// picks it up at the start of its next frame via [`take_pending`].
/// Multiple selections between frames collapse to the last one.
///
/// [`take_pending`]: AttractorCatalog::take_pending
#[derive(Debug, Clone)]
pub struct AttractorCatalog {
    selected: usize,
    active: usize,
    pending_reset: bool,
}

impl AttractorCatalog {
    /// Start with `initial` both selected and active.
    pub fn new(initial: AttractorVariant) -> Self {
        Self {
            selected: initial.index(),
            active: initial.index(),
            pending_reset: false,
        }
    }

    /// Every variant in catalog order.
    pub fn variants(&self) -> &'static [AttractorVariant] {
        &AttractorVariant::ALL
    }

    /// Variant the user most recently selected.
    pub fn selected(&self) -> AttractorVariant {
        AttractorVariant::ALL[self.selected]
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Variant the running trajectory belongs to.
    pub fn active(&self) -> AttractorVariant {
        AttractorVariant::ALL[self.active]
    }

    pub fn has_pending_reset(&self) -> bool {
        self.pending_reset
    }

    /// Select the variant at `index`.
    ///
    /// Returns `Ok(true)` when a reset was scheduled and `Ok(false)` when
    /// the selection was already current. Out-of-range indices are rejected
    /// and leave the catalog untouched.
    pub fn select(&mut self, index: usize) -> Result<bool, SelectionError> {
        if index >= AttractorVariant::COUNT {
            return Err(SelectionError::UnknownVariant(index));
        }
        if index == self.selected {
            return Ok(false);
        }
        self.selected = index;
        self.pending_reset = true;
        Ok(true)
    }

    /// Select a variant by name.
    pub fn select_by_name(&mut self, name: &str) -> Result<bool, SelectionError> {
        let variant = AttractorVariant::from_name(name)
            .ok_or_else(|| SelectionError::UnknownName(name.to_string()))?;
        self.select(variant.index())
    }

    /// Consume the pending reset, activating the selected variant.
    pub fn take_pending(&mut self) -> Option<AttractorVariant> {
        if !self.pending_reset {
            return None;
        }
        self.pending_reset = false;
        self.active = self.selected;
        Some(self.active())
    }
}

impl Default for AttractorCatalog {
    fn default() -> Self {
        Self::new(AttractorVariant::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_same_is_noop() {
        let mut catalog = AttractorCatalog::default();
        assert_eq!(catalog.select(0), Ok(false));
        assert!(!catalog.has_pending_reset());
        assert_eq!(catalog.take_pending(), None);
    }

    #[test]
    fn test_select_other_sets_pending() {
        let mut catalog = AttractorCatalog::default();
        assert_eq!(catalog.select(3), Ok(true));
        assert!(catalog.has_pending_reset());
        assert_eq!(catalog.active(), AttractorVariant::Lorenz);
        assert_eq!(catalog.take_pending(), Some(AttractorVariant::LuChen));
        assert_eq!(catalog.active(), AttractorVariant::LuChen);
        assert_eq!(catalog.take_pending(), None);
    }

    #[test]
    fn test_last_selection_wins() {
        let mut catalog = AttractorCatalog::default();
        catalog.select(1).unwrap();
        catalog.select(5).unwrap();
        catalog.select(2).unwrap();
        assert_eq!(catalog.take_pending(), Some(AttractorVariant::Halvorsen));
        assert_eq!(catalog.take_pending(), None);
    }

    #[test]
    fn test_switching_back_still_resets_once() {
        let mut catalog = AttractorCatalog::default();
        catalog.select(4).unwrap();
        assert_eq!(catalog.select(0), Ok(true));
        assert_eq!(catalog.take_pending(), Some(AttractorVariant::Lorenz));
        assert_eq!(catalog.take_pending(), None);
    }

    #[test]
    fn test_unknown_index_rejected() {
        let mut catalog = AttractorCatalog::new(AttractorVariant::Rossler);
        assert_eq!(catalog.select(7), Err(SelectionError::UnknownVariant(7)));
        assert_eq!(catalog.selected(), AttractorVariant::Rossler);
        assert!(!catalog.has_pending_reset());
    }

    #[test]
    fn test_select_by_name() {
        let mut catalog = AttractorCatalog::default();
        assert_eq!(catalog.select_by_name("hadley"), Ok(true));
        assert_eq!(
            catalog.select_by_name("thomas"),
            Err(SelectionError::UnknownName("thomas".to_string()))
        );
        assert_eq!(catalog.selected(), AttractorVariant::Hadley);
    }
}
