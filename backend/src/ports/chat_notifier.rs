//! Chat notifier port.
//!
//! Best-effort messages to the identity's chat. Callers fire and forget;
//! a failed notification never changes the outcome of the operation that
//! triggered it.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Identity, Origin};
use crate::domain::payment::{OrderKind, Price};

/// A settled payment, as told to its payer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotice {
    pub identity: Identity,
    pub pay_id: String,
    pub kind: OrderKind,
    pub goods_name: String,
    pub really_paid: Price,
    pub pay_method: i32,
    /// Credit after settlement.
    pub remaining_credit: i64,
    /// Origin bound after settlement; set for rebinds.
    pub bound_origin: Option<Origin>,
}

impl PaymentNotice {
    /// Human-readable pay method name.
    pub fn pay_method_name(&self) -> &'static str {
        match self.pay_method {
            1 => "WeChat Pay",
            2 => "Alipay",
            _ => "Unknown",
        }
    }
}

#[async_trait]
pub trait ChatNotifier: Send + Sync {
    async fn notify_payment(&self, notice: &PaymentNotice) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_notifier_is_object_safe() {
        fn _accepts_dyn(_notifier: &dyn ChatNotifier) {}
    }
}
