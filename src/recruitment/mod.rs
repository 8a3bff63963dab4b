//! Recruitment rules: stack resolution, slot ledger, roster reconciliation and
//! the application state machine.
//!
//! Nothing in here touches the database; the service layer feeds these functions
//! rows read inside its transaction and writes back what they decide.

pub mod application;
pub mod ledger;
pub mod reconcile;
pub mod stacks;

use crate::errors::AppError;

/// Cover image replacement: either nothing changes or exactly one image is swapped.
///
/// Returns the new image when one is supplied.
pub fn cover_image_change<'a>(
    added: &'a [String],
    deleted: &[String],
) -> Result<Option<&'a String>, AppError> {
    match (added.len(), deleted.len()) {
        (0, 0) => Ok(None),
        (1, 1) => Ok(added.first()),
        (added, deleted) => Err(AppError::CoverImageMismatch { added, deleted }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_image_swap_rules() {
        let one = vec!["covers/a.png".to_string()];
        let two = vec!["covers/a.png".to_string(), "covers/b.png".to_string()];

        assert_eq!(cover_image_change(&[], &[]).unwrap(), None);
        assert_eq!(
            cover_image_change(&one, &one).unwrap().map(String::as_str),
            Some("covers/a.png")
        );
        assert!(matches!(
            cover_image_change(&one, &[]),
            Err(AppError::CoverImageMismatch { added: 1, deleted: 0 })
        ));
        assert!(cover_image_change(&[], &one).is_err());
        assert!(cover_image_change(&two, &two).is_err());
    }
}
