//! Notifier used when no chat bot is configured. Writes the notice to the
//! log and succeeds.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::ports::{ChatNotifier, PaymentNotice};

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChatNotifier for LoggingNotifier {
    async fn notify_payment(&self, notice: &PaymentNotice) -> Result<(), DomainError> {
        tracing::info!(
            identity = %notice.identity,
            pay_id = %notice.pay_id,
            kind = %notice.kind,
            really_paid = %notice.really_paid,
            remaining_credit = notice.remaining_credit,
            "Payment settled (no chat bot configured)"
        );
        Ok(())
    }
}
