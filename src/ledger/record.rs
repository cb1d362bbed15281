use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::types::amount::Amount;
use crate::types::ids::{LoanId, UserId};

/// Image reference stored when the caller uploads nothing.
pub const DEFAULT_IMAGE_REF: &str = "default-profile.png";

/// Which record family an operation targets. `Lend` means the caller is
/// the lender and owns a lent record; `Borrow` the inverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Lend,
    Borrow,
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Lend => Direction::Borrow,
            Direction::Borrow => Direction::Lend,
        }
    }

    pub fn record_label(&self) -> &'static str {
        match self {
            Direction::Lend => "Lent money record",
            Direction::Borrow => "Borrowed money record",
        }
    }

    /// Wire name of the counterpart email field in this family.
    pub fn counterpart_email_field(&self) -> &'static str {
        match self {
            Direction::Lend => "borrowerEmail",
            Direction::Borrow => "lenderEmail",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Unpaid,
    Cleared,
}

impl LoanStatus {
    pub fn from_remaining(remaining: Amount) -> Self {
        if remaining.is_positive() {
            LoanStatus::Unpaid
        } else {
            LoanStatus::Cleared
        }
    }
}

/// Present in the stored document for compatibility with existing data;
/// the engine does not consult these when deciding whether to notify.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFlags {
    pub initial_notification_sent: bool,
    pub cleared_notification_sent: bool,
    pub last_notification_at: Option<DateTime<Utc>>,
}

/// A ledger entry in either family, role-neutral: `counterpart_email` is
/// the borrower's email on a lent record and the lender's on a borrowed
/// one. The wire layer maps it back to the family's field names.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    pub id: LoanId,
    pub owner_id: UserId,
    pub lender: String,
    pub borrower: String,
    pub counterpart_email: String,
    pub counterpart_image: String,
    pub initial_amount: Amount,
    pub remaining_amount: Amount,
    pub repaid_amount: Amount,
    pub status: LoanStatus,
    pub description: String,
    #[serde(default)]
    pub notification_flags: NotificationFlags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoanRecord {
    pub fn new(owner_id: UserId, input: &LoanInput) -> Self {
        let now = Utc::now();
        let repaid = input.initial_amount - input.remaining_amount;
        LoanRecord {
            id: LoanId::new(),
            owner_id,
            lender: input.lender.clone(),
            borrower: input.borrower.clone(),
            counterpart_email: input.counterpart_email.clone(),
            counterpart_image: input.counterpart_image.clone(),
            initial_amount: input.initial_amount,
            remaining_amount: input.remaining_amount,
            repaid_amount: repaid,
            status: LoanStatus::from_remaining(input.remaining_amount),
            description: input.description.clone(),
            notification_flags: NotificationFlags::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds the counterpart record for the opposite family: same names,
    /// amounts and status, owned by the counterpart account, with the
    /// caller's email as its own counterpart reference.
    pub fn mirror_for(&self, owner_id: UserId, caller_email: &str) -> LoanRecord {
        let now = Utc::now();
        LoanRecord {
            id: LoanId::new(),
            owner_id,
            lender: self.lender.clone(),
            borrower: self.borrower.clone(),
            counterpart_email: caller_email.to_string(),
            counterpart_image: DEFAULT_IMAGE_REF.to_string(),
            initial_amount: self.initial_amount,
            remaining_amount: self.remaining_amount,
            repaid_amount: self.repaid_amount,
            status: self.status,
            description: self.description.clone(),
            notification_flags: NotificationFlags::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            lender: self.lender.clone(),
            borrower: self.borrower.clone(),
            counterpart_email: self.counterpart_email.clone(),
            initial_amount: self.initial_amount,
            description: self.description.clone(),
        }
    }

    pub fn counterpart_key(&self) -> CounterpartKey {
        CounterpartKey {
            lender: self.lender.clone(),
            borrower: self.borrower.clone(),
            initial_amount: self.initial_amount,
        }
    }

    /// Applies a validated patch to this record. Name, email and
    /// description fields only replace existing values when non-empty;
    /// derived fields are recomputed by the caller afterwards.
    pub fn apply_patch(&mut self, patch: &LoanPatch) {
        if let Some(lender) = non_empty(&patch.lender) {
            self.lender = lender;
        }
        if let Some(borrower) = non_empty(&patch.borrower) {
            self.borrower = borrower;
        }
        if let Some(email) = non_empty(&patch.counterpart_email) {
            self.counterpart_email = email;
        }
        if let Some(image) = non_empty(&patch.counterpart_image) {
            self.counterpart_image = image;
        }
        if let Some(amount) = patch.initial_amount {
            self.initial_amount = amount;
        }
        if let Some(amount) = patch.remaining_amount {
            self.remaining_amount = amount;
        }
        if let Some(description) = non_empty(&patch.description) {
            self.description = description;
        }
    }

    /// Mirror-side patch application: names, amounts and description
    /// follow the primary; the mirror's own counterpart email and image
    /// reference the other party and stay untouched.
    pub fn apply_mirror_patch(&mut self, patch: &LoanPatch) {
        if let Some(lender) = non_empty(&patch.lender) {
            self.lender = lender;
        }
        if let Some(borrower) = non_empty(&patch.borrower) {
            self.borrower = borrower;
        }
        if let Some(amount) = patch.initial_amount {
            self.initial_amount = amount;
        }
        if let Some(amount) = patch.remaining_amount {
            self.remaining_amount = amount;
        }
        if let Some(description) = non_empty(&patch.description) {
            self.description = description;
        }
    }

    pub fn recompute_derived(&mut self) {
        self.repaid_amount = self.initial_amount - self.remaining_amount;
        self.status = LoanStatus::from_remaining(self.remaining_amount);
        self.updated_at = Utc::now();
    }

    pub fn to_body(&self, direction: Direction) -> LoanRecordBody {
        let (borrower_email, borrower_image, lender_email, lender_image) = match direction {
            Direction::Lend => (
                Some(self.counterpart_email.clone()),
                Some(self.counterpart_image.clone()),
                None,
                None,
            ),
            Direction::Borrow => (
                None,
                None,
                Some(self.counterpart_email.clone()),
                Some(self.counterpart_image.clone()),
            ),
        };
        LoanRecordBody {
            id: self.id,
            owner_id: self.owner_id,
            lender: self.lender.clone(),
            borrower: self.borrower.clone(),
            borrower_email,
            borrower_image,
            lender_email,
            lender_image,
            initial_amount: self.initial_amount,
            remaining_amount: self.remaining_amount,
            repaid_amount: self.repaid_amount,
            status: self.status,
            description: self.description.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

/// Raw request payload, before validation. Every field optional so the
/// validator owns all required-field reporting.
#[derive(Clone, Debug, Default)]
pub struct LoanDraft {
    pub lender: Option<String>,
    pub borrower: Option<String>,
    pub counterpart_email: Option<String>,
    pub counterpart_image: Option<String>,
    pub initial_amount: Option<Amount>,
    pub remaining_amount: Option<Amount>,
    pub description: Option<String>,
}

/// Validated, normalized creation input.
#[derive(Clone, Debug)]
pub struct LoanInput {
    pub lender: String,
    pub borrower: String,
    pub counterpart_email: String,
    pub counterpart_image: String,
    pub initial_amount: Amount,
    pub remaining_amount: Amount,
    pub description: String,
}

impl LoanInput {
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            lender: self.lender.clone(),
            borrower: self.borrower.clone(),
            counterpart_email: self.counterpart_email.clone(),
            initial_amount: self.initial_amount,
            description: self.description.clone(),
        }
    }
}

/// Validated partial-update input; absent fields stay unchanged.
#[derive(Clone, Debug, Default)]
pub struct LoanPatch {
    pub lender: Option<String>,
    pub borrower: Option<String>,
    pub counterpart_email: Option<String>,
    pub counterpart_image: Option<String>,
    pub initial_amount: Option<Amount>,
    pub remaining_amount: Option<Amount>,
    pub description: Option<String>,
}

/// Full natural key: duplicate detection at creation time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NaturalKey {
    pub lender: String,
    pub borrower: String,
    pub counterpart_email: String,
    pub initial_amount: Amount,
    pub description: String,
}

/// Reduced natural key: counterpart lookup on update, which predates the
/// email field matching and so only uses names and the initial amount.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterpartKey {
    pub lender: String,
    pub borrower: String,
    pub initial_amount: Amount,
}

/// Wire shape, with the family's role-specific field names.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecordBody {
    pub id: LoanId,
    pub owner_id: UserId,
    pub lender: String,
    pub borrower: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrower_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrower_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lender_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lender_image: Option<String>,
    pub initial_amount: Amount,
    pub remaining_amount: Amount,
    pub repaid_amount: Amount,
    pub status: LoanStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> LoanInput {
        LoanInput {
            lender: "Alice".to_string(),
            borrower: "Bob".to_string(),
            counterpart_email: "bob@x.com".to_string(),
            counterpart_image: DEFAULT_IMAGE_REF.to_string(),
            initial_amount: Amount::from_i64(1000),
            remaining_amount: Amount::from_i64(400),
            description: "trip".to_string(),
        }
    }

    #[test]
    fn new_record_derives_repaid_and_status() {
        let record = LoanRecord::new(UserId::new(), &input());
        assert_eq!(record.repaid_amount, Amount::from_i64(600));
        assert_eq!(record.status, LoanStatus::Unpaid);
    }

    #[test]
    fn zero_remaining_is_cleared() {
        let mut i = input();
        i.remaining_amount = Amount::zero();
        let record = LoanRecord::new(UserId::new(), &i);
        assert_eq!(record.status, LoanStatus::Cleared);
    }

    #[test]
    fn mirror_swaps_counterpart_reference() {
        let record = LoanRecord::new(UserId::new(), &input());
        let counterpart_owner = UserId::new();
        let mirror = record.mirror_for(counterpart_owner, "alice@x.com");
        assert_eq!(mirror.owner_id, counterpart_owner);
        assert_eq!(mirror.counterpart_email, "alice@x.com");
        assert_eq!(mirror.counterpart_image, DEFAULT_IMAGE_REF);
        assert_eq!(mirror.initial_amount, record.initial_amount);
        assert_eq!(mirror.status, record.status);
        assert_ne!(mirror.id, record.id);
    }

    #[test]
    fn patch_skips_empty_strings() {
        let mut record = LoanRecord::new(UserId::new(), &input());
        record.apply_patch(&LoanPatch {
            lender: Some(String::new()),
            description: Some(String::new()),
            remaining_amount: Some(Amount::zero()),
            ..LoanPatch::default()
        });
        record.recompute_derived();
        assert_eq!(record.lender, "Alice");
        assert_eq!(record.description, "trip");
        assert_eq!(record.repaid_amount, Amount::from_i64(1000));
        assert_eq!(record.status, LoanStatus::Cleared);
    }

    #[test]
    fn mirror_patch_never_touches_counterpart_email() {
        let record = LoanRecord::new(UserId::new(), &input());
        let mut mirror = record.mirror_for(UserId::new(), "alice@x.com");
        mirror.apply_mirror_patch(&LoanPatch {
            counterpart_email: Some("new@x.com".to_string()),
            lender: Some("Alicia".to_string()),
            ..LoanPatch::default()
        });
        assert_eq!(mirror.counterpart_email, "alice@x.com");
        assert_eq!(mirror.lender, "Alicia");
    }

    #[test]
    fn body_uses_family_field_names() {
        let record = LoanRecord::new(UserId::new(), &input());
        let lent = record.to_body(Direction::Lend);
        assert_eq!(lent.borrower_email.as_deref(), Some("bob@x.com"));
        assert!(lent.lender_email.is_none());
        let borrowed = record.to_body(Direction::Borrow);
        assert_eq!(borrowed.lender_email.as_deref(), Some("bob@x.com"));
        assert!(borrowed.borrower_email.is_none());
    }
}
