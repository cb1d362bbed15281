use crate::error::{Error, Result};
use crate::ledger::record::{Direction, LoanDraft, LoanInput, LoanPatch, DEFAULT_IMAGE_REF};
use crate::types::amount::Amount;

/// Validates a creation payload and returns the normalized input.
///
/// Reports only the first failing field, in the family's declared field
/// order: names (primary role first), counterpart email, then amounts.
pub fn validate_loan_input(direction: Direction, draft: &LoanDraft) -> Result<LoanInput> {
    let (first_field, first, second_field, second) = name_order(direction, draft);
    let first_name = require_name(first_field, first)?;
    let second_name = require_name(second_field, second)?;
    let counterpart_email = require_email(
        direction.counterpart_email_field(),
        draft.counterpart_email.as_deref(),
    )?;
    let initial_amount = require_amount("initialAmount", draft.initial_amount)?;
    check_positive("initialAmount", initial_amount)?;
    let remaining_amount = require_amount("remainingAmount", draft.remaining_amount)?;
    check_non_negative("remainingAmount", remaining_amount)?;

    let (lender, borrower) = match direction {
        Direction::Lend => (first_name, second_name),
        Direction::Borrow => (second_name, first_name),
    };

    Ok(LoanInput {
        lender,
        borrower,
        counterpart_email,
        counterpart_image: draft
            .counterpart_image
            .clone()
            .filter(|image| !image.is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_REF.to_string()),
        initial_amount,
        remaining_amount,
        description: draft.description.clone().unwrap_or_default(),
    })
}

/// Validates a partial-update payload: every field optional, but any
/// field that is present must satisfy the creation rules.
pub fn validate_loan_patch(direction: Direction, draft: &LoanDraft) -> Result<LoanPatch> {
    let (first_field, first, second_field, second) = name_order(direction, draft);
    if let Some(value) = first {
        check_name(first_field, value)?;
    }
    if let Some(value) = second {
        check_name(second_field, value)?;
    }
    if let Some(value) = draft.counterpart_email.as_deref() {
        check_email(direction.counterpart_email_field(), value)?;
    }
    if let Some(amount) = draft.initial_amount {
        check_positive("initialAmount", amount)?;
    }
    if let Some(amount) = draft.remaining_amount {
        check_non_negative("remainingAmount", amount)?;
    }

    Ok(LoanPatch {
        lender: draft.lender.clone(),
        borrower: draft.borrower.clone(),
        counterpart_email: draft.counterpart_email.clone(),
        counterpart_image: draft.counterpart_image.clone(),
        initial_amount: draft.initial_amount,
        remaining_amount: draft.remaining_amount,
        description: draft.description.clone(),
    })
}

/// Field checking order mirrors each family's schema: the owning role's
/// name first.
fn name_order<'a>(
    direction: Direction,
    draft: &'a LoanDraft,
) -> (&'static str, Option<&'a str>, &'static str, Option<&'a str>) {
    match direction {
        Direction::Lend => (
            "lender",
            draft.lender.as_deref(),
            "borrower",
            draft.borrower.as_deref(),
        ),
        Direction::Borrow => (
            "borrower",
            draft.borrower.as_deref(),
            "lender",
            draft.lender.as_deref(),
        ),
    }
}

fn require_name(field: &'static str, value: Option<&str>) -> Result<String> {
    match value {
        None => Err(Error::validation(field, format!("\"{field}\" is required"))),
        Some(value) => {
            check_name(field, value)?;
            Ok(value.to_string())
        }
    }
}

fn check_name(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(
            field,
            format!("\"{field}\" is not allowed to be empty"),
        ));
    }
    Ok(())
}

fn require_email(field: &'static str, value: Option<&str>) -> Result<String> {
    match value {
        None => Err(Error::validation(field, format!("\"{field}\" is required"))),
        Some(value) => {
            check_email(field, value)?;
            Ok(value.to_string())
        }
    }
}

fn check_email(field: &'static str, value: &str) -> Result<()> {
    if !is_email(value) {
        return Err(Error::validation(
            field,
            format!("\"{field}\" must be a valid email"),
        ));
    }
    Ok(())
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
        && !domain.contains('@')
}

fn require_amount(field: &'static str, value: Option<Amount>) -> Result<Amount> {
    value.ok_or_else(|| Error::validation(field, format!("\"{field}\" is required")))
}

fn check_positive(field: &'static str, amount: Amount) -> Result<()> {
    if !amount.is_positive() {
        return Err(Error::validation(
            field,
            format!("\"{field}\" must be greater than 0"),
        ));
    }
    Ok(())
}

fn check_non_negative(field: &'static str, amount: Amount) -> Result<()> {
    if amount < Amount::zero() {
        return Err(Error::validation(
            field,
            format!("\"{field}\" must be greater than or equal to 0"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_draft() -> LoanDraft {
        LoanDraft {
            lender: Some("Alice".to_string()),
            borrower: Some("Bob".to_string()),
            counterpart_email: Some("bob@x.com".to_string()),
            counterpart_image: None,
            initial_amount: Some(Amount::from_i64(1000)),
            remaining_amount: Some(Amount::from_i64(1000)),
            description: None,
        }
    }

    fn failing_field(err: crate::error::Error) -> &'static str {
        match err {
            Error::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_a_complete_draft_and_normalizes_defaults() {
        let input = validate_loan_input(Direction::Lend, &full_draft()).unwrap();
        assert_eq!(input.counterpart_image, DEFAULT_IMAGE_REF);
        assert_eq!(input.description, "");
    }

    #[test]
    fn reports_first_missing_field_in_family_order() {
        let err = validate_loan_input(Direction::Lend, &LoanDraft::default()).unwrap_err();
        assert_eq!(failing_field(err), "lender");

        let err = validate_loan_input(Direction::Borrow, &LoanDraft::default()).unwrap_err();
        assert_eq!(failing_field(err), "borrower");
    }

    #[test]
    fn email_field_name_follows_direction() {
        let mut draft = full_draft();
        draft.counterpart_email = Some("not-an-email".to_string());
        let err = validate_loan_input(Direction::Lend, &draft).unwrap_err();
        assert_eq!(failing_field(err), "borrowerEmail");

        let mut draft = full_draft();
        draft.counterpart_email = Some("not-an-email".to_string());
        let err = validate_loan_input(Direction::Borrow, &draft).unwrap_err();
        assert_eq!(failing_field(err), "lenderEmail");
    }

    #[test]
    fn rejects_non_positive_initial_amount() {
        let mut draft = full_draft();
        draft.initial_amount = Some(Amount::zero());
        let err = validate_loan_input(Direction::Lend, &draft).unwrap_err();
        assert_eq!(failing_field(err), "initialAmount");
    }

    #[test]
    fn rejects_negative_remaining_amount() {
        let mut draft = full_draft();
        draft.remaining_amount = Some(Amount::from_i64(-1));
        let err = validate_loan_input(Direction::Lend, &draft).unwrap_err();
        assert_eq!(failing_field(err), "remainingAmount");
    }

    #[test]
    fn remaining_above_initial_is_permitted() {
        let mut draft = full_draft();
        draft.remaining_amount = Some(Amount::from_i64(5000));
        assert!(validate_loan_input(Direction::Lend, &draft).is_ok());
    }

    #[test]
    fn patch_accepts_remaining_amount_alone() {
        let draft = LoanDraft {
            remaining_amount: Some(Amount::zero()),
            ..LoanDraft::default()
        };
        let patch = validate_loan_patch(Direction::Lend, &draft).unwrap();
        assert_eq!(patch.remaining_amount, Some(Amount::zero()));
        assert!(patch.lender.is_none());
    }

    #[test]
    fn patch_still_rejects_invalid_present_fields() {
        let draft = LoanDraft {
            initial_amount: Some(Amount::zero()),
            ..LoanDraft::default()
        };
        let err = validate_loan_patch(Direction::Lend, &draft).unwrap_err();
        assert_eq!(failing_field(err), "initialAmount");

        let draft = LoanDraft {
            counterpart_email: Some("nope".to_string()),
            ..LoanDraft::default()
        };
        let err = validate_loan_patch(Direction::Borrow, &draft).unwrap_err();
        assert_eq!(failing_field(err), "lenderEmail");

        let draft = LoanDraft {
            lender: Some("  ".to_string()),
            ..LoanDraft::default()
        };
        assert!(validate_loan_patch(Direction::Lend, &draft).is_err());
    }

    #[test]
    fn email_shapes() {
        assert!(is_email("a@b.co"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@b.co"));
        assert!(!is_email("a b@c.co"));
        assert!(!is_email("a@b@c.co"));
    }
}
