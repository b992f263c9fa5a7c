bitflags::bitflags! {
    /// Registration-time tags attached to an entry.
    ///
    /// The store never interprets these; they are read back through
    /// [`EventStore::snapshot`](crate::EventStore::snapshot) by collaborators
    /// such as a persistence writer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StoreFlags: u32 {
        /// The entry should be written out by a persistence stage.
        const PERSIST = 1 << 0;
        /// The entry feeds the jet vertex extraction step.
        const JET_EXTRACT_VERTEX = 1 << 1;
    }
}

impl StoreFlags {
    /// Returns the set flag names joined with `|`, or `-` when no flag is set.
    pub fn label(&self) -> String {
        if self.is_empty() {
            return "-".to_string();
        }
        self.iter_names()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join("|")
    }
}
