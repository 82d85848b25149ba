//! Lending lifecycle domain services.
//!
//! These services implement the lending driving ports on top of the driven
//! ports for persistence, audit, and payment confirmation. Every state
//! transition is executed as a conditional update against the copy store:
//! the new status is written only if the stored status still equals the one
//! the guard evaluated, so concurrent transitions on the same copy resolve
//! to exactly one winner.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{error, info};

use crate::domain::Error;
use crate::domain::activity::{ActivityKind, ActivityRecord};
use crate::domain::copy::{CopyId, CopyRecord, CopyStatus, CopyStatusKind};
use crate::domain::fine::{FineAmount, FineSchedule};
use crate::domain::payment::FinePayment;
use crate::domain::ports::{
    ActivityLog, ActivityLogError, CancelReservationRequest, CancelReservationResponse,
    ConfirmPaymentRequest, CopyStore, CopyStoreError, FineLedger, GetCopyRequest, GetCopyResponse,
    IssueCopyRequest, IssueCopyResponse, LendingCommand, LendingQuery, ListCopiesRequest,
    ListCopiesResponse, ListCopyActivityRequest, ListCopyActivityResponse, PayFineRequest,
    PayFineResponse, PaymentGateway, PaymentGatewayError, RegisterCopyRequest,
    RegisterCopyResponse, ReserveCopyRequest, ReserveCopyResponse, ReturnCopyRequest,
    ReturnCopyResponse, ReturnOutcome, SetCopyStatusRequest, SetCopyStatusResponse,
};

/// Attempts for a conditional update before reporting the race to the caller.
const CONDITIONAL_UPDATE_ATTEMPTS: usize = 3;

fn map_store_error(error: CopyStoreError) -> Error {
    match error {
        CopyStoreError::Connection { message } => {
            Error::service_unavailable(format!("copy store unavailable: {message}"))
        }
        CopyStoreError::DuplicateCopy { accession_number } => Error::conflict(format!(
            "a copy with accession number {accession_number} is already registered"
        )),
        CopyStoreError::StatusChanged { copy_id } => {
            Error::invalid_transition(format!("copy {copy_id} changed concurrently"))
        }
        CopyStoreError::Query { message } => Error::internal(format!("copy store error: {message}")),
    }
}

fn map_activity_error(error: ActivityLogError) -> Error {
    match error {
        ActivityLogError::Connection { message } => {
            Error::service_unavailable(format!("activity log unavailable: {message}"))
        }
        ActivityLogError::Query { message } => {
            Error::internal(format!("activity log error: {message}"))
        }
    }
}

fn map_gateway_error(error: PaymentGatewayError) -> Error {
    match error {
        PaymentGatewayError::Declined { reason } => {
            Error::payment_not_confirmed(format!("payment declined: {reason}"))
        }
        PaymentGatewayError::Timeout => Error::service_unavailable(
            "payment confirmation timed out; the loan stays open and the payment may be retried",
        ),
        PaymentGatewayError::Transport { message } => {
            Error::service_unavailable(format!("payment gateway unreachable: {message}"))
        }
        PaymentGatewayError::InvalidResponse { message } => {
            Error::internal(format!("payment gateway returned an invalid response: {message}"))
        }
    }
}

fn transition_guard_error(copy: &CopyRecord, requirement: &str) -> Error {
    Error::invalid_transition(format!(
        "copy {} is {}; {requirement}",
        copy.id(),
        copy.status().kind(),
    ))
}

fn lost_update_error(copy_id: CopyId) -> Error {
    Error::invalid_transition(format!("copy {copy_id} changed concurrently"))
}

async fn load_copy<S: CopyStore>(copies: &S, copy_id: &CopyId) -> Result<CopyRecord, Error> {
    copies
        .find_by_id(copy_id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| Error::not_found(format!("copy {copy_id} not found")))
}

/// Lending service implementing the command driving port.
#[derive(Clone)]
pub struct LendingCommandService<S, A, F, G: ?Sized> {
    copies: Arc<S>,
    activity: Arc<A>,
    fines: Arc<F>,
    payments: Arc<G>,
    schedule: FineSchedule,
    clock: Arc<dyn Clock>,
}

impl<S, A, F, G: ?Sized> LendingCommandService<S, A, F, G> {
    /// Create a new command service over the driven ports.
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use circulation::domain::{FineSchedule, LendingCommandService};
    /// # use circulation::outbound::payments::FixturePaymentGateway;
    /// # use circulation::outbound::persistence::{
    /// #     MemoryActivityLog, MemoryCopyStore, MemoryFineLedger,
    /// # };
    /// # use mockable::DefaultClock;
    /// let service = LendingCommandService::new(
    ///     Arc::new(MemoryCopyStore::default()),
    ///     Arc::new(MemoryActivityLog::default()),
    ///     Arc::new(MemoryFineLedger::default()),
    ///     Arc::new(FixturePaymentGateway::default()),
    ///     FineSchedule::default(),
    ///     Arc::new(DefaultClock),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(
        copies: Arc<S>,
        activity: Arc<A>,
        fines: Arc<F>,
        payments: Arc<G>,
        schedule: FineSchedule,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            copies,
            activity,
            fines,
            payments,
            schedule,
            clock,
        }
    }
}

impl<S, A, F, G> LendingCommandService<S, A, F, G>
where
    S: CopyStore,
    A: ActivityLog,
    F: FineLedger,
    G: PaymentGateway + ?Sized,
{
    async fn record_activity(&self, record: ActivityRecord) -> Result<(), Error> {
        if let Err(err) = self.activity.append(&record).await {
            // The copy transition has already committed.
            error!(
                copy_id = %record.copy_id(),
                kind = %record.kind(),
                error = %err,
                "activity append failed after state change"
            );
            return Err(Error::internal("activity log write failed"));
        }
        Ok(())
    }
}

#[async_trait]
impl<S, A, F, G> LendingCommand for LendingCommandService<S, A, F, G>
where
    S: CopyStore,
    A: ActivityLog,
    F: FineLedger,
    G: PaymentGateway + ?Sized,
{
    async fn register_copy(
        &self,
        request: RegisterCopyRequest,
    ) -> Result<RegisterCopyResponse, Error> {
        if !request.actor.role().is_librarian() {
            return Err(Error::forbidden("only librarians may register copies"));
        }

        let copy = CopyRecord::new(CopyId::random(), request.draft)
            .map_err(|err| Error::invalid_request(format!("invalid copy draft: {err}")))?;

        self.copies.insert(&copy).await.map_err(map_store_error)?;
        info!(
            copy_id = %copy.id(),
            accession_number = %copy.accession_number(),
            "copy registered"
        );
        Ok(RegisterCopyResponse { copy })
    }

    async fn reserve(&self, request: ReserveCopyRequest) -> Result<ReserveCopyResponse, Error> {
        let ReserveCopyRequest { copy_id, actor } = request;

        for _ in 0..CONDITIONAL_UPDATE_ATTEMPTS {
            let copy = load_copy(self.copies.as_ref(), &copy_id).await?;
            match copy.status() {
                CopyStatus::Reserved { by, at } if by == actor.id() => {
                    // A retried request; replay the existing reservation.
                    return Ok(ReserveCopyResponse {
                        status: CopyStatusKind::Reserved,
                        reserved_at: *at,
                        replayed: true,
                    });
                }
                CopyStatus::Active => {}
                _ => {
                    return Err(transition_guard_error(
                        &copy,
                        "reserve requires an Active copy",
                    ));
                }
            }

            let now = self.clock.utc();
            let expected = copy.status().clone();
            let updated = copy.with_status(CopyStatus::Reserved {
                by: actor.id().clone(),
                at: now,
            });
            match self.copies.update_if_status(&expected, &updated).await {
                Ok(()) => {
                    self.record_activity(ActivityRecord::new(
                        copy_id,
                        actor.id().clone(),
                        ActivityKind::Reserve,
                        now,
                    ))
                    .await?;
                    info!(copy_id = %copy_id, user_id = %actor.id(), "copy reserved");
                    return Ok(ReserveCopyResponse {
                        status: CopyStatusKind::Reserved,
                        reserved_at: now,
                        replayed: false,
                    });
                }
                Err(CopyStoreError::StatusChanged { .. }) => continue,
                Err(err) => return Err(map_store_error(err)),
            }
        }
        Err(lost_update_error(copy_id))
    }

    async fn cancel_reservation(
        &self,
        request: CancelReservationRequest,
    ) -> Result<CancelReservationResponse, Error> {
        let CancelReservationRequest { copy_id, actor } = request;

        for _ in 0..CONDITIONAL_UPDATE_ATTEMPTS {
            let copy = load_copy(self.copies.as_ref(), &copy_id).await?;
            let CopyStatus::Reserved { by, .. } = copy.status() else {
                return Err(transition_guard_error(
                    &copy,
                    "there is no reservation to cancel",
                ));
            };
            if !actor.may_act_for(by) {
                return Err(Error::forbidden(
                    "only the reservation holder or desk staff may cancel it",
                ));
            }

            let holder = by.clone();
            let expected = copy.status().clone();
            let updated = copy.with_status(CopyStatus::Active);
            match self.copies.update_if_status(&expected, &updated).await {
                Ok(()) => {
                    info!(copy_id = %copy_id, user_id = %holder, "reservation cancelled");
                    return Ok(CancelReservationResponse {
                        status: CopyStatusKind::Active,
                    });
                }
                Err(CopyStoreError::StatusChanged { .. }) => continue,
                Err(err) => return Err(map_store_error(err)),
            }
        }
        Err(lost_update_error(copy_id))
    }

    async fn issue(&self, request: IssueCopyRequest) -> Result<IssueCopyResponse, Error> {
        if !request.actor.role().is_staff() {
            return Err(Error::forbidden("issuing copies is a desk operation"));
        }

        for _ in 0..CONDITIONAL_UPDATE_ATTEMPTS {
            let copy = load_copy(self.copies.as_ref(), &request.copy_id).await?;
            match copy.status() {
                CopyStatus::Active => {}
                CopyStatus::Reserved { by, .. } if by == &request.borrower => {}
                CopyStatus::Reserved { .. } => {
                    return Err(transition_guard_error(
                        &copy,
                        "the reservation belongs to another user",
                    ));
                }
                _ => {
                    return Err(transition_guard_error(
                        &copy,
                        "issue requires an Active copy or the borrower's reservation",
                    ));
                }
            }

            let now = self.clock.utc();
            let due = match request.due_date {
                Some(due) if due <= now => {
                    return Err(Error::invalid_request(format!(
                        "due date {due} is not after the issue time"
                    )));
                }
                Some(due) => due,
                None => self.schedule.due_from(now),
            };

            let expected = copy.status().clone();
            let updated = copy.with_status(CopyStatus::Issued {
                to: request.borrower.clone(),
                at: now,
                due,
            });
            match self.copies.update_if_status(&expected, &updated).await {
                Ok(()) => {
                    self.record_activity(ActivityRecord::new(
                        request.copy_id,
                        request.borrower.clone(),
                        ActivityKind::Issue,
                        now,
                    ))
                    .await?;
                    info!(
                        copy_id = %request.copy_id,
                        user_id = %request.borrower,
                        due_date = %due,
                        "copy issued"
                    );
                    return Ok(IssueCopyResponse {
                        status: CopyStatusKind::Issued,
                        due_date: due,
                    });
                }
                Err(CopyStoreError::StatusChanged { .. }) => continue,
                Err(err) => return Err(map_store_error(err)),
            }
        }
        Err(lost_update_error(request.copy_id))
    }

    async fn return_copy(&self, request: ReturnCopyRequest) -> Result<ReturnCopyResponse, Error> {
        let ReturnCopyRequest { copy_id, actor } = request;

        for _ in 0..CONDITIONAL_UPDATE_ATTEMPTS {
            let copy = load_copy(self.copies.as_ref(), &copy_id).await?;
            let CopyStatus::Issued { to, due, .. } = copy.status() else {
                return Err(transition_guard_error(
                    &copy,
                    "only an issued copy can be returned",
                ));
            };
            if !actor.may_act_for(to) {
                return Err(Error::forbidden(
                    "only the borrower or desk staff may return this copy",
                ));
            }

            let now = self.clock.utc();
            let fine = self.schedule.assess(*due, now);
            if !fine.is_zero() {
                // The copy stays Issued until the fine is settled.
                return Ok(ReturnCopyResponse {
                    outcome: ReturnOutcome::PaymentDue { fine },
                });
            }

            let borrower = to.clone();
            let expected = copy.status().clone();
            let updated = copy.with_status(CopyStatus::Active);
            match self.copies.update_if_status(&expected, &updated).await {
                Ok(()) => {
                    self.record_activity(ActivityRecord::new(
                        copy_id,
                        borrower.clone(),
                        ActivityKind::Return,
                        now,
                    ))
                    .await?;
                    info!(copy_id = %copy_id, user_id = %borrower, "copy returned");
                    return Ok(ReturnCopyResponse {
                        outcome: ReturnOutcome::Returned,
                    });
                }
                Err(CopyStoreError::StatusChanged { .. }) => continue,
                Err(err) => return Err(map_store_error(err)),
            }
        }
        Err(lost_update_error(copy_id))
    }

    async fn pay_fine(&self, request: PayFineRequest) -> Result<PayFineResponse, Error> {
        let PayFineRequest {
            copy_id,
            actor,
            claim,
        } = request;

        // Single attempt throughout: once the gateway confirms, retrying the
        // conditional update could charge the borrower twice.
        let copy = load_copy(self.copies.as_ref(), &copy_id).await?;
        let CopyStatus::Issued { to, due, .. } = copy.status() else {
            return Err(transition_guard_error(
                &copy,
                "no outstanding loan to settle",
            ));
        };
        if !actor.may_act_for(to) {
            return Err(Error::forbidden(
                "only the borrower or desk staff may settle this fine",
            ));
        }

        let borrower = to.clone();
        let due = *due;
        let expected = copy.status().clone();
        let now = self.clock.utc();
        let fine = self.schedule.assess(due, now);

        if fine.is_zero() {
            // Nothing is owed any more; finalise without charging.
            let updated = copy.with_status(CopyStatus::Active);
            self.copies
                .update_if_status(&expected, &updated)
                .await
                .map_err(|err| match err {
                    CopyStoreError::StatusChanged { .. } => lost_update_error(copy_id),
                    other => map_store_error(other),
                })?;
            self.record_activity(ActivityRecord::new(
                copy_id,
                borrower.clone(),
                ActivityKind::Return,
                now,
            ))
            .await?;
            info!(copy_id = %copy_id, user_id = %borrower, "loan finalised without charge");
            return Ok(PayFineResponse {
                amount_paid: FineAmount::ZERO,
                reference: claim.reference,
            });
        }

        if claim.amount != fine {
            return Err(Error::payment_required(format!(
                "outstanding fine is {fine}; the claim covered {claimed}",
                claimed = claim.amount
            ))
            .with_details(json!({ "fine": fine.get() })));
        }

        let confirmation = self
            .payments
            .confirm(&ConfirmPaymentRequest {
                copy_id,
                user_id: borrower.clone(),
                amount: fine,
                reference: claim.reference.clone(),
            })
            .await
            .map_err(map_gateway_error)?;

        let updated = copy.with_status(CopyStatus::Active);
        if let Err(err) = self.copies.update_if_status(&expected, &updated).await {
            return Err(match err {
                CopyStoreError::StatusChanged { .. } => {
                    // The gateway has already settled the claim; surface the
                    // reference so the desk can reconcile manually.
                    error!(
                        copy_id = %copy_id,
                        reference = %confirmation.reference,
                        "copy changed status after payment confirmation"
                    );
                    lost_update_error(copy_id)
                }
                other => map_store_error(other),
            });
        }

        let payment = FinePayment::confirmed(
            copy_id,
            borrower.clone(),
            fine,
            confirmation.reference.clone(),
            confirmation.confirmed_at,
        );
        if let Err(err) = self.fines.record(&payment).await {
            error!(
                copy_id = %copy_id,
                reference = %payment.reference(),
                error = %err,
                "fine ledger write failed after settlement"
            );
            return Err(Error::internal("fine ledger write failed"));
        }

        self.record_activity(
            ActivityRecord::new(copy_id, borrower.clone(), ActivityKind::FinePayment, now)
                .with_fine_amount(fine),
        )
        .await?;
        self.record_activity(ActivityRecord::new(
            copy_id,
            borrower.clone(),
            ActivityKind::Return,
            now,
        ))
        .await?;
        info!(
            copy_id = %copy_id,
            user_id = %borrower,
            amount = fine.get(),
            "fine settled and copy returned"
        );
        Ok(PayFineResponse {
            amount_paid: fine,
            reference: confirmation.reference,
        })
    }

    async fn set_status(
        &self,
        request: SetCopyStatusRequest,
    ) -> Result<SetCopyStatusResponse, Error> {
        if !request.actor.role().is_librarian() {
            return Err(Error::forbidden(
                "only librarians may set a copy's administrative status",
            ));
        }

        let target = request.status.to_status();
        for _ in 0..CONDITIONAL_UPDATE_ATTEMPTS {
            let copy = load_copy(self.copies.as_ref(), &request.copy_id).await?;
            if *copy.status() == target {
                return Ok(SetCopyStatusResponse {
                    status: request.status.kind(),
                });
            }
            match copy.status() {
                CopyStatus::Active | CopyStatus::Deactive => {}
                _ => {
                    return Err(transition_guard_error(
                        &copy,
                        "administrative status changes require an Active or Deactive copy",
                    ));
                }
            }

            let expected = copy.status().clone();
            let updated = copy.with_status(target.clone());
            match self.copies.update_if_status(&expected, &updated).await {
                Ok(()) => {
                    info!(
                        copy_id = %request.copy_id,
                        status = %request.status.kind(),
                        "administrative status set"
                    );
                    return Ok(SetCopyStatusResponse {
                        status: request.status.kind(),
                    });
                }
                Err(CopyStoreError::StatusChanged { .. }) => continue,
                Err(err) => return Err(map_store_error(err)),
            }
        }
        Err(lost_update_error(request.copy_id))
    }
}

/// Lending service implementing the query driving port.
#[derive(Clone)]
pub struct LendingQueryService<S, A> {
    copies: Arc<S>,
    activity: Arc<A>,
}

impl<S, A> LendingQueryService<S, A> {
    /// Create a new query service over the copy store and activity log.
    pub fn new(copies: Arc<S>, activity: Arc<A>) -> Self {
        Self { copies, activity }
    }
}

#[async_trait]
impl<S, A> LendingQuery for LendingQueryService<S, A>
where
    S: CopyStore,
    A: ActivityLog,
{
    async fn get_copy(&self, request: GetCopyRequest) -> Result<GetCopyResponse, Error> {
        let copy = load_copy(self.copies.as_ref(), &request.copy_id).await?;
        Ok(GetCopyResponse { copy })
    }

    async fn list_copies(&self, request: ListCopiesRequest) -> Result<ListCopiesResponse, Error> {
        let copies = self
            .copies
            .list(&request.page)
            .await
            .map_err(map_store_error)?;
        Ok(ListCopiesResponse { copies })
    }

    async fn list_copy_activity(
        &self,
        request: ListCopyActivityRequest,
    ) -> Result<ListCopyActivityResponse, Error> {
        load_copy(self.copies.as_ref(), &request.copy_id).await?;
        let events = self
            .activity
            .list_for_copy(&request.copy_id)
            .await
            .map_err(map_activity_error)?;
        Ok(ListCopyActivityResponse { events })
    }
}

#[cfg(test)]
#[path = "lending_service_tests.rs"]
mod tests;
