use crate::config::EncoderConfig;
use crate::types::ChangeEvent;

/// Result of evaluating an event against the session filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Emit,
    /// Suppressed by `only-local`: the change was replicated from another node.
    ForeignOrigin,
    /// Suppressed by the `tables` allow-list.
    TableNotListed,
}

impl FilterOutcome {
    pub fn is_emit(self) -> bool {
        matches!(self, FilterOutcome::Emit)
    }
}

/// Evaluate the origin and table filters for an event.
pub fn evaluate(event: &ChangeEvent, config: &EncoderConfig) -> FilterOutcome {
    if config.only_local && !event.origin.is_local() {
        return FilterOutcome::ForeignOrigin;
    }

    if !config.admits_table(&event.table.name) {
        return FilterOutcome::TableNotListed;
    }

    FilterOutcome::Emit
}

/// Whether an event should be rendered at all.
pub fn should_emit(event: &ChangeEvent, config: &EncoderConfig) -> bool {
    evaluate(event, config).is_emit()
}
