//! Shared application state for the HTTP routes.

use std::sync::Arc;

use crate::application::handlers::{
    CheckOrderStatusHandler, CreateCreditPurchaseHandler, CreateRebindOrderHandler,
    GetEntitlementHandler, IssueCreditCodeHandler, IssueTokenHandler, PaymentPricing,
    ReconcilePaymentHandler, RedeemCreditCodeHandler, VerifyTokenHandler,
};
use crate::domain::credit_code::CodeGenerator;
use crate::domain::payment::GatewaySigner;
use crate::domain::token::TokenCodec;
use crate::ports::{
    ChatNotifier, CreditCodeRepository, EntitlementRepository, IntentAuthenticator,
    PaymentGateway, PaymentOrderRepository,
};

/// The adapters behind every port.
#[derive(Clone)]
pub struct LedgerPorts {
    pub entitlements: Arc<dyn EntitlementRepository>,
    pub credit_codes: Arc<dyn CreditCodeRepository>,
    pub orders: Arc<dyn PaymentOrderRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn ChatNotifier>,
    pub authenticator: Arc<dyn IntentAuthenticator>,
}

/// Secrets and business settings the handlers are built with.
#[derive(Clone)]
pub struct LedgerSettings {
    pub codec: TokenCodec,
    pub code_generator: CodeGenerator,
    pub signer: GatewaySigner,
    pub merchant_id: String,
    pub default_credit: i64,
    pub max_code_grant: i64,
    pub pricing: PaymentPricing,
}

/// Handlers are built once at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub issue_token: Arc<IssueTokenHandler>,
    pub verify_token: Arc<VerifyTokenHandler>,
    pub get_entitlement: Arc<GetEntitlementHandler>,
    pub issue_credit_code: Arc<IssueCreditCodeHandler>,
    pub redeem_credit_code: Arc<RedeemCreditCodeHandler>,
    pub create_credit_purchase: Arc<CreateCreditPurchaseHandler>,
    pub create_rebind_order: Arc<CreateRebindOrderHandler>,
    pub check_order_status: Arc<CheckOrderStatusHandler>,
    pub reconcile_payment: Arc<ReconcilePaymentHandler>,
    pub authenticator: Arc<dyn IntentAuthenticator>,
}

impl AppState {
    pub fn new(ports: LedgerPorts, settings: LedgerSettings) -> Self {
        Self {
            issue_token: Arc::new(IssueTokenHandler::new(
                ports.entitlements.clone(),
                settings.codec.clone(),
                settings.default_credit,
            )),
            verify_token: Arc::new(VerifyTokenHandler::new(
                ports.entitlements.clone(),
                settings.codec.clone(),
            )),
            get_entitlement: Arc::new(GetEntitlementHandler::new(ports.entitlements.clone())),
            issue_credit_code: Arc::new(IssueCreditCodeHandler::new(
                ports.credit_codes.clone(),
                settings.code_generator,
                settings.max_code_grant,
            )),
            redeem_credit_code: Arc::new(RedeemCreditCodeHandler::new(
                ports.credit_codes,
                ports.entitlements.clone(),
            )),
            create_credit_purchase: Arc::new(CreateCreditPurchaseHandler::new(
                ports.entitlements.clone(),
                ports.orders.clone(),
                ports.gateway.clone(),
                settings.pricing,
            )),
            create_rebind_order: Arc::new(CreateRebindOrderHandler::new(
                ports.entitlements,
                ports.orders.clone(),
                ports.gateway.clone(),
                settings.pricing,
            )),
            check_order_status: Arc::new(CheckOrderStatusHandler::new(
                ports.orders.clone(),
                ports.gateway,
            )),
            reconcile_payment: Arc::new(ReconcilePaymentHandler::new(
                ports.orders,
                settings.codec,
                settings.signer,
                settings.merchant_id,
                ports.notifier,
            )),
            authenticator: ports.authenticator,
        }
    }
}
