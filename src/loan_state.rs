use chrono::{DateTime, Utc};

/// Whether a book is on the shelf or lent out
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum LoanState {
    /// Book is on the shelf and may be borrowed
    #[default]
    Available,
    /// Book is lent out
    Borrowed {
        /// Member ID of the borrower
        by: String,
        /// When the loan started
        since: DateTime<Utc>,
    },
}

impl LoanState {
    /// Returns `true` for [`LoanState::Available`]
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }

    /// Get a human-readable description of the current state
    #[must_use]
    pub fn get_description(&self) -> String {
        match self {
            Self::Available => "Available".to_string(),
            Self::Borrowed { by, .. } => format!("Borrowed by {by}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::LoanState;

    #[test]
    fn test_default_is_available() {
        assert!(LoanState::default().is_available());
    }

    #[test]
    fn test_description_names_borrower() {
        let state = LoanState::Borrowed { by: "M1".to_string(), since: Utc::now() };
        assert!(!state.is_available());
        assert_eq!(state.get_description(), "Borrowed by M1");
        assert_eq!(LoanState::Available.get_description(), "Available");
    }
}
