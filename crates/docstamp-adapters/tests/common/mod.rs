#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::Address;

use docstamp_adapters::Eip1193Adapter;
use docstamp_core::context::designate_providers;
use docstamp_core::ports::{ClockPort, FeedbackPort, PortError};
use docstamp_core::{ErrorHandler, ProviderSession, SessionSettings, Web3Context};

/// Clock that never blocks and records every requested pause.
#[derive(Debug, Default)]
pub struct TestClock {
    now: AtomicU64,
    sleeps: Mutex<Vec<Duration>>,
}

impl TestClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("sleeps lock").clone()
    }
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Ok(self.now.fetch_add(1, Ordering::SeqCst) + 1_739_750_400_000)
    }

    fn sleep(&self, duration: Duration) {
        self.now.fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
        self.sleeps.lock().expect("sleeps lock").push(duration);
    }
}

#[derive(Debug, Default)]
pub struct RecordingFeedback {
    messages: Mutex<Vec<String>>,
}

impl RecordingFeedback {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("feedback lock").clone()
    }
}

impl FeedbackPort for RecordingFeedback {
    fn notify_error(&self, message: &str) {
        self.messages
            .lock()
            .expect("feedback lock")
            .push(message.to_owned());
    }
}

pub struct Harness {
    pub wallet: Arc<Eip1193Adapter>,
    pub clock: Arc<TestClock>,
    pub feedback: Arc<RecordingFeedback>,
    pub context: Web3Context<Eip1193Adapter>,
}

pub fn harness() -> Harness {
    harness_with(Eip1193Adapter::deterministic())
}

pub fn harness_with(wallet: Eip1193Adapter) -> Harness {
    let wallet = Arc::new(wallet);
    let clock = Arc::new(TestClock::default());
    let feedback = Arc::new(RecordingFeedback::default());
    let session = ProviderSession::new(
        clock.clone(),
        ErrorHandler::new(feedback.clone()),
        SessionSettings::default(),
    );
    let mut context = Web3Context::new(session, docstamp_core::chains::admitted_chain_ids(false));
    context.detect_providers(vec![Arc::clone(&wallet)]);
    Harness {
        wallet,
        clock,
        feedback,
        context,
    }
}

/// Harness with the MetaMask wrapper initialized and an account connected.
pub fn connected_harness() -> Harness {
    let mut h = harness();
    h.context.init_provider().expect("init provider");
    h.context.connect().expect("connect");
    h
}

pub fn account_a() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("account a")
}

pub fn account_b() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("account b")
}

pub fn providers_for(wallet: &Arc<Eip1193Adapter>) -> Vec<docstamp_core::DesignatedProvider<Eip1193Adapter>> {
    designate_providers(vec![Arc::clone(wallet)])
}
