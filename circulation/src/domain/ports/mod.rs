//! Domain ports and supporting types for the hexagonal boundary.

mod activity_log;
mod copy_store;
mod fine_ledger;
mod lending_command;
mod lending_query;
mod payment_gateway;

#[cfg(test)]
pub use activity_log::MockActivityLog;
pub use activity_log::{ActivityLog, ActivityLogError};
#[cfg(test)]
pub use copy_store::MockCopyStore;
pub use copy_store::{
    COPY_PAGE_DEFAULT_LIMIT, COPY_PAGE_MAX_LIMIT, CopyPage, CopyPageValidationError, CopyStore,
    CopyStoreError,
};
#[cfg(test)]
pub use fine_ledger::MockFineLedger;
pub use fine_ledger::{FineLedger, FineLedgerError};
#[cfg(test)]
pub use lending_command::MockLendingCommand;
pub use lending_command::{
    AdminCopyStatus, CancelReservationRequest, CancelReservationResponse, IssueCopyRequest,
    IssueCopyResponse, LendingCommand, PayFineRequest, PayFineResponse, RegisterCopyRequest,
    RegisterCopyResponse, ReserveCopyRequest, ReserveCopyResponse, ReturnCopyRequest,
    ReturnCopyResponse, ReturnOutcome, SetCopyStatusRequest, SetCopyStatusResponse,
};
#[cfg(test)]
pub use lending_query::MockLendingQuery;
pub use lending_query::{
    GetCopyRequest, GetCopyResponse, LendingQuery, ListCopiesRequest, ListCopiesResponse,
    ListCopyActivityRequest, ListCopyActivityResponse,
};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_gateway::{
    ConfirmPaymentRequest, PaymentConfirmation, PaymentGateway, PaymentGatewayError,
};
