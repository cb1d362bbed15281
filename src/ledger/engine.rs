use std::sync::Arc;
use crate::error::{Error, Result};
use crate::interfaces::identity::IdentityResolver;
use crate::interfaces::loan_store::LoanStore;
use crate::interfaces::notifier::{EmailMessage, Notifier};
use crate::ledger::record::{Direction, LoanDraft, LoanRecord};
use crate::ledger::templates::{self, RenderedEmail};
use crate::ledger::validate;
use crate::observability::metrics;
use crate::types::amount::Amount;
use crate::types::ids::{LoanId, UserId};

/// The authenticated user performing a ledger operation.
#[derive(Clone, Debug)]
pub struct Caller {
    pub user_id: UserId,
    pub email: String,
}

/// Orchestrates the dual-record loan ledger: every operation works on the
/// caller's primary record and keeps the counterpart's mirrored record in
/// step when one exists. Mirror writes and notifications are best-effort;
/// only validation, duplicate detection and the primary write can fail
/// the operation.
pub struct ReconciliationEngine {
    store: Arc<dyn LoanStore>,
    identities: Arc<dyn IdentityResolver>,
    notifier: Arc<dyn Notifier>,
    frontend_url: String,
}

impl ReconciliationEngine {
    pub fn new(
        store: Arc<dyn LoanStore>,
        identities: Arc<dyn IdentityResolver>,
        notifier: Arc<dyn Notifier>,
        frontend_url: String,
    ) -> Self {
        ReconciliationEngine {
            store,
            identities,
            notifier,
            frontend_url,
        }
    }

    pub async fn create_entry(
        &self,
        direction: Direction,
        draft: LoanDraft,
        caller: &Caller,
    ) -> Result<LoanRecord> {
        let input = validate::validate_loan_input(direction, &draft)?;

        // Reject a second active entry for the same natural key; cleared
        // entries do not block re-creation.
        if self
            .store
            .find_active_by_key(direction, &input.natural_key())
            .await?
            .is_some()
        {
            return Err(Error::DuplicateActiveEntry);
        }

        let record = LoanRecord::new(caller.user_id, &input);
        let saved = self.store.insert(direction, record).await?;
        metrics::ENTRIES_CREATED.inc();
        tracing::info!(
            loan_id = %saved.id,
            direction = ?direction,
            "ledger entry created"
        );

        match self.identities.find_by_email(&saved.counterpart_email).await? {
            Some(account) => {
                let mirror = saved.mirror_for(account.user_id, &caller.email);
                match self.store.insert(direction.opposite(), mirror).await {
                    Ok(_) => metrics::ENTRIES_MIRRORED.inc(),
                    Err(err) => {
                        metrics::MIRROR_WRITE_FAILURES.inc();
                        tracing::warn!(
                            loan_id = %saved.id,
                            error = %err,
                            "counterpart record write failed; entry left unmirrored"
                        );
                    }
                }
            }
            None => {
                let email = self.creation_notice(direction, &saved);
                self.dispatch(&saved.counterpart_email, email).await;
            }
        }

        Ok(saved)
    }

    pub async fn update_entry(
        &self,
        direction: Direction,
        id: LoanId,
        draft: LoanDraft,
        caller: &Caller,
    ) -> Result<LoanRecord> {
        let patch = validate::validate_loan_patch(direction, &draft)?;

        let mut record = self
            .store
            .find_by_id_and_owner(direction, id, caller.user_id)
            .await?
            .ok_or(Error::NotFound {
                what: direction.record_label(),
            })?;

        // Locate the mirror with pre-update values; edits to the names or
        // amount would otherwise break the natural-key match.
        let counterpart = self
            .store
            .find_counterpart(direction.opposite(), &record.counterpart_key())
            .await?;

        record.apply_patch(&patch);
        record.recompute_derived();
        let saved = self.store.update(direction, record).await?;

        if let Some(mut mirror) = counterpart {
            mirror.apply_mirror_patch(&patch);
            mirror.recompute_derived();
            if let Err(err) = self.store.update(direction.opposite(), mirror).await {
                metrics::MIRROR_WRITE_FAILURES.inc();
                tracing::warn!(
                    loan_id = %saved.id,
                    error = %err,
                    "counterpart record update failed; ledger may have drifted"
                );
            }
        }

        self.update_notice(direction, &saved).await?;

        Ok(saved)
    }

    pub async fn list_entries(
        &self,
        direction: Direction,
        caller: &Caller,
    ) -> Result<(Vec<LoanRecord>, Amount)> {
        let records = self.store.list_by_owner(direction, caller.user_id).await?;
        let total = records
            .iter()
            .fold(Amount::zero(), |sum, record| sum + record.initial_amount);
        Ok((records, total))
    }

    pub async fn delete_entry(
        &self,
        direction: Direction,
        id: LoanId,
        caller: &Caller,
    ) -> Result<()> {
        let record = self
            .store
            .find_by_id_and_owner(direction, id, caller.user_id)
            .await?
            .ok_or(Error::NotFound {
                what: direction.record_label(),
            })?;

        self.store.delete(direction, id).await?;
        // The counterpart record, if any, stays in place.
        tracing::debug!(
            loan_id = %record.id,
            direction = ?direction,
            "ledger entry deleted; counterpart record not cascaded"
        );
        Ok(())
    }

    /// Creation-time notice, sent only when the counterpart has no
    /// account. The lend side invites the borrower to register; the
    /// borrow side acknowledges the debt to the lender.
    fn creation_notice(&self, direction: Direction, record: &LoanRecord) -> RenderedEmail {
        match direction {
            Direction::Lend => templates::owner_to_counterpart(
                &record.borrower,
                &record.lender,
                record.initial_amount,
                &record.description,
                false,
                false,
                &format!("{}/", self.frontend_url),
            ),
            Direction::Borrow => templates::counterpart_to_owner(
                &record.lender,
                &record.borrower,
                record.initial_amount,
                &record.description,
                false,
            ),
        }
    }

    /// Update-time notice. Lend entries notify on clearance or while the
    /// borrower is unregistered; borrow entries notify on clearance only.
    async fn update_notice(&self, direction: Direction, record: &LoanRecord) -> Result<()> {
        let cleared = record.status == crate::ledger::record::LoanStatus::Cleared;
        match direction {
            Direction::Lend => {
                let registered = self
                    .identities
                    .find_by_email(&record.counterpart_email)
                    .await?
                    .is_some();
                if cleared || !registered {
                    let email = templates::owner_to_counterpart(
                        &record.borrower,
                        &record.lender,
                        record.initial_amount,
                        &record.description,
                        cleared,
                        registered,
                        &format!("{}/register", self.frontend_url),
                    );
                    self.dispatch(&record.counterpart_email, email).await;
                }
            }
            Direction::Borrow => {
                if cleared {
                    let email = templates::counterpart_to_owner(
                        &record.lender,
                        &record.borrower,
                        record.initial_amount,
                        &record.description,
                        true,
                    );
                    self.dispatch(&record.counterpart_email, email).await;
                }
            }
        }
        Ok(())
    }

    async fn dispatch(&self, to: &str, email: RenderedEmail) {
        let message = EmailMessage {
            to: to.to_string(),
            subject: email.subject,
            html: email.html,
        };
        match self.notifier.send(&message).await {
            Ok(()) => {
                metrics::NOTIFICATIONS_SENT.inc();
                tracing::info!(recipient = %message.to, subject = %message.subject, "notification sent");
            }
            Err(err) => {
                metrics::NOTIFICATIONS_FAILED.inc();
                tracing::warn!(recipient = %message.to, error = %err, "notification delivery failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::identity::{MockIdentityResolver, UserAccount};
    use crate::interfaces::notifier::MockNotifier;
    use crate::ledger::record::LoanStatus;
    use crate::store::memory::InMemoryStore;

    fn draft(initial: i64, remaining: i64) -> LoanDraft {
        LoanDraft {
            lender: Some("Alice".to_string()),
            borrower: Some("Bob".to_string()),
            counterpart_email: Some("bob@x.com".to_string()),
            counterpart_image: None,
            initial_amount: Some(Amount::from_i64(initial)),
            remaining_amount: Some(Amount::from_i64(remaining)),
            description: Some("trip".to_string()),
        }
    }

    fn alice() -> Caller {
        Caller {
            user_id: UserId::new(),
            email: "alice@x.com".to_string(),
        }
    }

    fn bob_account() -> UserAccount {
        UserAccount {
            user_id: UserId::new(),
            email: "bob@x.com".to_string(),
            display_name: "Bob".to_string(),
        }
    }

    fn unregistered() -> MockIdentityResolver {
        let mut identities = MockIdentityResolver::new();
        identities.expect_find_by_email().returning(|_| Ok(None));
        identities
    }

    fn registered(account: UserAccount) -> MockIdentityResolver {
        let mut identities = MockIdentityResolver::new();
        identities
            .expect_find_by_email()
            .returning(move |_| Ok(Some(account.clone())));
        identities
    }

    fn silent_notifier() -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_send().times(0);
        notifier
    }

    fn accepting_notifier() -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_send().returning(|_| Ok(()));
        notifier
    }

    fn engine(
        identities: MockIdentityResolver,
        notifier: MockNotifier,
    ) -> (ReconciliationEngine, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let engine = ReconciliationEngine::new(
            store.clone(),
            Arc::new(identities),
            Arc::new(notifier),
            "http://localhost:5173".to_string(),
        );
        (engine, store)
    }

    #[tokio::test]
    async fn create_derives_repaid_amount_and_status() {
        let (engine, _) = engine(unregistered(), accepting_notifier());
        let record = engine
            .create_entry(Direction::Lend, draft(1000, 400), &alice())
            .await
            .unwrap();
        assert_eq!(record.repaid_amount, Amount::from_i64(600));
        assert_eq!(record.status, LoanStatus::Unpaid);
    }

    #[tokio::test]
    async fn create_rejects_second_active_entry_with_same_key() {
        let (engine, _) = engine(unregistered(), accepting_notifier());
        let caller = alice();
        engine
            .create_entry(Direction::Lend, draft(1000, 1000), &caller)
            .await
            .unwrap();
        let err = engine
            .create_entry(Direction::Lend, draft(1000, 1000), &caller)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateActiveEntry));
    }

    #[tokio::test]
    async fn create_allows_same_key_after_clearance() {
        let (engine, _) = engine(unregistered(), accepting_notifier());
        let caller = alice();
        // First entry is already cleared, so it does not block a new one.
        engine
            .create_entry(Direction::Lend, draft(1000, 0), &caller)
            .await
            .unwrap();
        engine
            .create_entry(Direction::Lend, draft(1000, 1000), &caller)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_mirrors_for_registered_counterpart() {
        let bob = bob_account();
        let bob_id = bob.user_id;
        let (engine, store) = engine(registered(bob), silent_notifier());
        let caller = alice();

        let primary = engine
            .create_entry(Direction::Lend, draft(1000, 400), &caller)
            .await
            .unwrap();

        let mirrors = store.list_by_owner(Direction::Borrow, bob_id).await.unwrap();
        assert_eq!(mirrors.len(), 1);
        let mirror = &mirrors[0];
        assert_eq!(mirror.owner_id, bob_id);
        assert_eq!(mirror.lender, "Alice");
        assert_eq!(mirror.borrower, "Bob");
        assert_eq!(mirror.counterpart_email, "alice@x.com");
        assert_eq!(mirror.initial_amount, primary.initial_amount);
        assert_eq!(mirror.remaining_amount, primary.remaining_amount);
        assert_eq!(mirror.repaid_amount, primary.repaid_amount);
        assert_eq!(mirror.status, primary.status);
        assert_eq!(mirror.description, primary.description);
    }

    #[tokio::test]
    async fn borrow_create_mirrors_into_lent_family() {
        let lender = UserAccount {
            user_id: UserId::new(),
            email: "alice@x.com".to_string(),
            display_name: "Alice".to_string(),
        };
        let lender_id = lender.user_id;
        let (engine, store) = engine(registered(lender), silent_notifier());
        let bob = Caller {
            user_id: UserId::new(),
            email: "bob@x.com".to_string(),
        };

        let body = LoanDraft {
            counterpart_email: Some("alice@x.com".to_string()),
            ..draft(500, 500)
        };
        engine
            .create_entry(Direction::Borrow, body, &bob)
            .await
            .unwrap();

        let mirrors = store.list_by_owner(Direction::Lend, lender_id).await.unwrap();
        assert_eq!(mirrors.len(), 1);
        assert_eq!(mirrors[0].counterpart_email, "bob@x.com");
    }

    #[tokio::test]
    async fn unregistered_counterpart_gets_invitation_not_mirror() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .times(1)
            .withf(|message: &EmailMessage| {
                message.to == "bob@x.com"
                    && message.subject.contains("Reminder")
                    && message.html.contains("Complete Registration")
            })
            .returning(|_| Ok(()));
        let (engine, store) = engine(unregistered(), notifier);
        let caller = alice();

        let primary = engine
            .create_entry(Direction::Lend, draft(1000, 1000), &caller)
            .await
            .unwrap();

        let counterpart = store
            .find_counterpart(Direction::Borrow, &primary.counterpart_key())
            .await
            .unwrap();
        assert!(counterpart.is_none());
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_creation() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .returning(|_| Err(Error::NotificationDelivery("smtp down".to_string())));
        let (engine, _) = engine(unregistered(), notifier);

        let record = engine
            .create_entry(Direction::Lend, draft(1000, 1000), &alice())
            .await
            .unwrap();
        assert_eq!(record.status, LoanStatus::Unpaid);
    }

    #[tokio::test]
    async fn update_recomputes_both_records() {
        let bob = bob_account();
        let bob_id = bob.user_id;
        let (engine, store) = engine(registered(bob), accepting_notifier());
        let caller = alice();

        let primary = engine
            .create_entry(Direction::Lend, draft(1000, 1000), &caller)
            .await
            .unwrap();

        let updated = engine
            .update_entry(
                Direction::Lend,
                primary.id,
                LoanDraft {
                    remaining_amount: Some(Amount::from_i64(250)),
                    ..LoanDraft::default()
                },
                &caller,
            )
            .await
            .unwrap();
        assert_eq!(updated.repaid_amount, Amount::from_i64(750));
        assert_eq!(updated.status, LoanStatus::Unpaid);

        let mirror = &store.list_by_owner(Direction::Borrow, bob_id).await.unwrap()[0];
        assert_eq!(mirror.remaining_amount, Amount::from_i64(250));
        assert_eq!(mirror.repaid_amount, Amount::from_i64(750));
    }

    #[tokio::test]
    async fn clearance_notifies_even_when_counterpart_registered() {
        let bob = bob_account();
        let bob_id = bob.user_id;
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .times(1)
            .withf(|message: &EmailMessage| {
                message.subject.contains("Cleared")
                    && !message.html.contains("Complete Registration")
            })
            .returning(|_| Ok(()));
        let (engine, store) = engine(registered(bob), notifier);
        let caller = alice();

        let primary = engine
            .create_entry(Direction::Lend, draft(1000, 1000), &caller)
            .await
            .unwrap();
        let updated = engine
            .update_entry(
                Direction::Lend,
                primary.id,
                LoanDraft {
                    remaining_amount: Some(Amount::zero()),
                    ..LoanDraft::default()
                },
                &caller,
            )
            .await
            .unwrap();

        assert_eq!(updated.status, LoanStatus::Cleared);
        let mirror = &store.list_by_owner(Direction::Borrow, bob_id).await.unwrap()[0];
        assert_eq!(mirror.status, LoanStatus::Cleared);
    }

    #[tokio::test]
    async fn borrow_update_notifies_only_on_clearance() {
        let mut notifier = MockNotifier::new();
        // One creation notice, then exactly one clearance notice; the
        // intermediate partial repayment stays silent.
        notifier
            .expect_send()
            .times(2)
            .returning(|_| Ok(()));
        let (engine, _) = engine(unregistered(), notifier);
        let bob = Caller {
            user_id: UserId::new(),
            email: "bob@x.com".to_string(),
        };

        let primary = engine
            .create_entry(Direction::Borrow, draft(1000, 1000), &bob)
            .await
            .unwrap();
        engine
            .update_entry(
                Direction::Borrow,
                primary.id,
                LoanDraft {
                    remaining_amount: Some(Amount::from_i64(500)),
                    ..LoanDraft::default()
                },
                &bob,
            )
            .await
            .unwrap();
        engine
            .update_entry(
                Direction::Borrow,
                primary.id,
                LoanDraft {
                    remaining_amount: Some(Amount::zero()),
                    ..LoanDraft::default()
                },
                &bob,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_and_delete_reject_non_owner() {
        let (engine, _) = engine(unregistered(), accepting_notifier());
        let caller = alice();
        let primary = engine
            .create_entry(Direction::Lend, draft(1000, 1000), &caller)
            .await
            .unwrap();

        let mallory = Caller {
            user_id: UserId::new(),
            email: "mallory@x.com".to_string(),
        };
        let err = engine
            .update_entry(
                Direction::Lend,
                primary.id,
                LoanDraft::default(),
                &mallory,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        let err = engine
            .delete_entry(Direction::Lend, primary.id, &mallory)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_leaves_counterpart_in_place() {
        let bob = bob_account();
        let bob_id = bob.user_id;
        let (engine, store) = engine(registered(bob), silent_notifier());
        let caller = alice();

        let primary = engine
            .create_entry(Direction::Lend, draft(1000, 400), &caller)
            .await
            .unwrap();
        engine
            .delete_entry(Direction::Lend, primary.id, &caller)
            .await
            .unwrap();

        assert!(store
            .list_by_owner(Direction::Lend, caller.user_id)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store.list_by_owner(Direction::Borrow, bob_id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn list_sums_initial_amounts() {
        let (engine, _) = engine(unregistered(), accepting_notifier());
        let caller = alice();
        engine
            .create_entry(Direction::Lend, draft(1000, 1000), &caller)
            .await
            .unwrap();
        let second = LoanDraft {
            borrower: Some("Carol".to_string()),
            counterpart_email: Some("carol@x.com".to_string()),
            ..draft(250, 250)
        };
        engine
            .create_entry(Direction::Lend, second, &caller)
            .await
            .unwrap();

        let (records, total) = engine.list_entries(Direction::Lend, &caller).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(total, Amount::from_i64(1250));
    }

    #[tokio::test]
    async fn lend_and_borrow_scenario_roundtrip() {
        // Scenario: Alice lends Bob 1000 for a trip; Bob has no account.
        let mut notifier = MockNotifier::new();
        let mut sequence = mockall::Sequence::new();
        notifier
            .expect_send()
            .times(1)
            .in_sequence(&mut sequence)
            .withf(|message: &EmailMessage| {
                message.to == "bob@x.com"
                    && message.subject.contains("Reminder")
                    && message.html.contains("http://localhost:5173/")
            })
            .returning(|_| Ok(()));
        notifier
            .expect_send()
            .times(1)
            .in_sequence(&mut sequence)
            .withf(|message: &EmailMessage| message.subject.contains("Cleared"))
            .returning(|_| Ok(()));

        let (engine, _) = engine(unregistered(), notifier);
        let caller = alice();

        let record = engine
            .create_entry(Direction::Lend, draft(1000, 1000), &caller)
            .await
            .unwrap();
        assert_eq!(record.owner_id, caller.user_id);
        assert_eq!(record.repaid_amount, Amount::zero());
        assert_eq!(record.status, LoanStatus::Unpaid);

        let cleared = engine
            .update_entry(
                Direction::Lend,
                record.id,
                LoanDraft {
                    remaining_amount: Some(Amount::zero()),
                    ..LoanDraft::default()
                },
                &caller,
            )
            .await
            .unwrap();
        assert_eq!(cleared.repaid_amount, Amount::from_i64(1000));
        assert_eq!(cleared.status, LoanStatus::Cleared);
    }
}
