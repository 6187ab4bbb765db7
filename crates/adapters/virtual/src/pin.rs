//! State of one simulated pin.

use iopanel_domain::entity::Level;

/// Last values written to a configured output pin.
///
/// A pin driven digitally keeps its duty untouched and the other way round,
/// the same way a real board keeps both registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinState {
    pub level: Level,
    pub duty: u16,
}
