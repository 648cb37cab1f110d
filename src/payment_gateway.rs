//! Payment gateway abstraction and the demo simulator.
//!
//! The booking lifecycle only depends on the [`PaymentGateway`] trait, so
//! the probabilistic simulator can be swapped for a real processor
//! (Stripe, `PayPal`, a bank rail) without touching the lifecycle manager.
//! Callers must not depend on the simulator's specific success rate.

use crate::types::{Money, PaymentMethod};
use rand::Rng;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Terminal outcome of one payment attempt.
///
/// A decline is a normal outcome, not an error: it flows into the booking's
/// status field rather than an error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The gateway accepted the charge.
    Approved {
        /// Gateway-side transaction ID
        transaction_id: String,
    },
    /// The gateway declined the charge.
    Declined {
        /// Human-readable decline reason
        reason: String,
    },
}

impl PaymentOutcome {
    /// Whether the attempt was approved.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }
}

/// Payment gateway trait.
///
/// One attempt per call, no state retained between calls. Retrying a failed
/// booking means a brand-new booking attempt, never a second attempt against
/// the same record.
pub trait PaymentGateway: Send + Sync {
    /// Attempt to charge `amount` via `method`.
    fn attempt(
        &self,
        amount: Money,
        method: PaymentMethod,
    ) -> Pin<Box<dyn Future<Output = PaymentOutcome> + Send>>;
}

/// Probabilistic payment simulator.
///
/// Approves each attempt independently with the configured success rate
/// (0.9 by default, matching a demo gateway that mostly succeeds). Stands in
/// for a real processor in development and demos.
#[derive(Clone, Debug)]
pub struct SimulatedPaymentGateway {
    /// Probability of approval per attempt, clamped to `0.0..=1.0`.
    success_rate: f64,
}

impl SimulatedPaymentGateway {
    /// Default approval probability.
    pub const DEFAULT_SUCCESS_RATE: f64 = 0.9;

    /// Creates a simulator with the given approval probability.
    #[must_use]
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }

    /// Creates an Arc-wrapped simulator with the default rate.
    #[must_use]
    pub fn shared() -> Arc<dyn PaymentGateway> {
        Arc::new(Self::new(Self::DEFAULT_SUCCESS_RATE))
    }
}

impl Default for SimulatedPaymentGateway {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SUCCESS_RATE)
    }
}

impl PaymentGateway for SimulatedPaymentGateway {
    fn attempt(
        &self,
        amount: Money,
        method: PaymentMethod,
    ) -> Pin<Box<dyn Future<Output = PaymentOutcome> + Send>> {
        let success_rate = self.success_rate;
        Box::pin(async move {
            // Simulate network latency to the processor.
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

            let approved = rand::thread_rng().gen_bool(success_rate);
            if approved {
                let transaction_id = format!("sim_txn_{}", uuid::Uuid::new_v4());
                tracing::info!(
                    amount = amount.cents(),
                    method = %method,
                    transaction_id = %transaction_id,
                    "simulated payment approved"
                );
                PaymentOutcome::Approved { transaction_id }
            } else {
                tracing::info!(
                    amount = amount.cents(),
                    method = %method,
                    "simulated payment declined"
                );
                PaymentOutcome::Declined {
                    reason: "payment declined by gateway".to_string(),
                }
            }
        })
    }
}

/// Gateway test double with a forced outcome.
///
/// Lets tests pin the payment result instead of rolling dice.
#[derive(Clone, Debug)]
pub struct FixedOutcomeGateway {
    approve: bool,
}

impl FixedOutcomeGateway {
    /// A gateway that approves every attempt.
    #[must_use]
    pub const fn approving() -> Self {
        Self { approve: true }
    }

    /// A gateway that declines every attempt.
    #[must_use]
    pub const fn declining() -> Self {
        Self { approve: false }
    }
}

impl PaymentGateway for FixedOutcomeGateway {
    fn attempt(
        &self,
        _amount: Money,
        _method: PaymentMethod,
    ) -> Pin<Box<dyn Future<Output = PaymentOutcome> + Send>> {
        let approve = self.approve;
        Box::pin(async move {
            if approve {
                PaymentOutcome::Approved {
                    transaction_id: format!("fixed_txn_{}", uuid::Uuid::new_v4()),
                }
            } else {
                PaymentOutcome::Declined {
                    reason: "payment declined by gateway".to_string(),
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_on_simulator_approves() {
        let gateway = SimulatedPaymentGateway::new(1.0);
        let outcome = gateway
            .attempt(Money::from_dollars(100), PaymentMethod::Credit)
            .await;
        assert!(outcome.is_approved());
    }

    #[tokio::test]
    async fn always_off_simulator_declines() {
        let gateway = SimulatedPaymentGateway::new(0.0);
        let outcome = gateway
            .attempt(Money::from_dollars(100), PaymentMethod::Debit)
            .await;
        assert!(!outcome.is_approved());
        assert!(matches!(outcome, PaymentOutcome::Declined { .. }));
    }

    #[test]
    fn success_rate_is_clamped() {
        // gen_bool panics outside 0..=1, so the constructor must clamp.
        let gateway = SimulatedPaymentGateway::new(7.3);
        assert!((gateway.success_rate - 1.0).abs() < f64::EPSILON);
        let gateway = SimulatedPaymentGateway::new(-0.4);
        assert!(gateway.success_rate.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn fixed_gateways_obey_their_outcome() {
        let approve = FixedOutcomeGateway::approving()
            .attempt(Money::from_dollars(1), PaymentMethod::WalletTransfer)
            .await;
        assert!(approve.is_approved());

        let decline = FixedOutcomeGateway::declining()
            .attempt(Money::from_dollars(1), PaymentMethod::WalletTransfer)
            .await;
        assert!(!decline.is_approved());
    }
}
