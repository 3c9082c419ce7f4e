//! Scripted gateway implementations.
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use crate::traits::{
    ChargeAccepted,
    ChargeGateway,
    ChargeRequest,
    DisbursementReceipt,
    DisbursementRequest,
    GatewayError,
    PayoutGateway,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayBehaviour {
    Accept,
    Reject(String),
    Timeout,
    Unreachable,
}

impl GatewayBehaviour {
    fn outcome(&self) -> Result<(), GatewayError> {
        match self {
            GatewayBehaviour::Accept => Ok(()),
            GatewayBehaviour::Reject(msg) => Err(GatewayError::Rejected(msg.clone())),
            GatewayBehaviour::Timeout => Err(GatewayError::Timeout),
            GatewayBehaviour::Unreachable => Err(GatewayError::Transport("connection refused".into())),
        }
    }
}

#[derive(Debug, Clone)]
struct Script<R> {
    behaviour: Arc<Mutex<GatewayBehaviour>>,
    requests: Arc<Mutex<Vec<R>>>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl<R: Clone> Script<R> {
    fn new(behaviour: GatewayBehaviour) -> Self {
        Self {
            behaviour: Arc::new(Mutex::new(behaviour)),
            requests: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    async fn run(&self, request: R) -> Result<usize, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().expect("poisoned").push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let behaviour = self.behaviour.lock().expect("poisoned").clone();
        behaviour.outcome().map(|_| n)
    }

    fn set(&self, behaviour: GatewayBehaviour) {
        *self.behaviour.lock().expect("poisoned") = behaviour;
    }

    fn last(&self) -> Option<R> {
        self.requests.lock().expect("poisoned").last().cloned()
    }
}

/// A charge gateway that answers according to its [`GatewayBehaviour`] and records every request it receives.
#[derive(Debug, Clone)]
pub struct FakeChargeGateway {
    script: Script<ChargeRequest>,
}

impl FakeChargeGateway {
    pub fn accepting() -> Self {
        Self { script: Script::new(GatewayBehaviour::Accept) }
    }

    pub fn with_behaviour(behaviour: GatewayBehaviour) -> Self {
        Self { script: Script::new(behaviour) }
    }

    pub fn set_behaviour(&self, behaviour: GatewayBehaviour) {
        self.script.set(behaviour);
    }

    pub fn call_count(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChargeRequest> {
        self.script.last()
    }
}

impl ChargeGateway for FakeChargeGateway {
    async fn initiate_charge(&self, request: ChargeRequest) -> Result<ChargeAccepted, GatewayError> {
        let reference = request.reference.clone();
        let n = self.script.run(request).await?;
        Ok(ChargeAccepted { gateway_reference: Some(format!("GW-{n}-{reference}")), message: Some("Pending".into()) })
    }
}

/// A payout gateway that answers according to its [`GatewayBehaviour`]. An optional delay holds each call open, which
/// lets tests overlap concurrent payouts.
#[derive(Debug, Clone)]
pub struct FakePayoutGateway {
    script: Script<DisbursementRequest>,
}

impl FakePayoutGateway {
    pub fn accepting() -> Self {
        Self { script: Script::new(GatewayBehaviour::Accept) }
    }

    pub fn with_behaviour(behaviour: GatewayBehaviour) -> Self {
        Self { script: Script::new(behaviour) }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.script.delay = Some(delay);
        self
    }

    pub fn set_behaviour(&self, behaviour: GatewayBehaviour) {
        self.script.set(behaviour);
    }

    pub fn call_count(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<DisbursementRequest> {
        self.script.last()
    }
}

impl PayoutGateway for FakePayoutGateway {
    async fn disburse(&self, request: DisbursementRequest) -> Result<DisbursementReceipt, GatewayError> {
        let n = self.script.run(request).await?;
        Ok(DisbursementReceipt { transaction_id: format!("TX-{n:06}"), message: Some("Transfer successful".into()) })
    }
}
