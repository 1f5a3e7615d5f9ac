//! Key event routing result shared by the widgets.

/// Whether a widget handled a key event.
///
/// Key events go through a chain of handlers; the first one that returns
/// `Consumed` stops the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Consumed,
    NotConsumed,
}

impl EventStatus {
    pub fn is_consumed(self) -> bool {
        self == EventStatus::Consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_consumed() {
        assert!(EventStatus::Consumed.is_consumed());
        assert!(!EventStatus::NotConsumed.is_consumed());
    }
}
