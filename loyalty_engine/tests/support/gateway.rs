use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use loyalty_common::Points;
use loyalty_engine::{
    db_types::OrderNumber,
    settlement::{AccrualGateway, AccrualResponse, AccrualStatus, AccrualUpdate},
    LedgerError,
};

#[derive(Debug, Clone)]
pub enum Script {
    Respond(AccrualResponse),
    Fail(LedgerError),
    Panic,
}

/// An in-process accrual service. Each order number has a queue of scripted answers; the last answer in a queue is
/// repeated forever. Unscripted orders are reported as not registered.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGateway {
    scripts: Arc<Mutex<HashMap<OrderNumber, VecDeque<Script>>>>,
    calls: Arc<Mutex<Vec<OrderNumber>>>,
    total_calls: Arc<AtomicUsize>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, number: &str, script: Script) {
        let mut scripts = self.scripts.lock().unwrap();
        scripts.entry(OrderNumber::from(number)).or_default().push_back(script);
    }

    /// Replaces whatever was scripted for `number` with a single answer.
    pub fn set(&self, number: &str, script: Script) {
        let mut scripts = self.scripts.lock().unwrap();
        scripts.insert(OrderNumber::from(number), VecDeque::from([script]));
    }

    pub fn respond(&self, number: &str, status: AccrualStatus, accrual: Option<Points>) {
        let update = AccrualUpdate { order: Some(OrderNumber::from(number)), status, accrual };
        self.set(number, Script::Respond(AccrualResponse::Update(update)));
    }

    pub fn processed(&self, number: &str, accrual: Points) {
        self.respond(number, AccrualStatus::Processed, Some(accrual));
    }

    /// Appends a `PROCESSED` answer to whatever is already scripted for `number`.
    pub fn processed_after_script(&self, number: &str, accrual: Points) {
        let update = AccrualUpdate {
            order: Some(OrderNumber::from(number)),
            status: AccrualStatus::Processed,
            accrual: Some(accrual),
        };
        self.push(number, Script::Respond(AccrualResponse::Update(update)));
    }

    /// Answers for `number` with a body that does not echo the order number back.
    pub fn anonymous(&self, number: &str, status: AccrualStatus, accrual: Option<Points>) {
        let update = AccrualUpdate { order: None, status, accrual };
        self.set(number, Script::Respond(AccrualResponse::Update(update)));
    }

    pub fn fail(&self, number: &str, message: &str) {
        self.set(number, Script::Fail(LedgerError::gateway(message)));
    }

    pub fn calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, number: &str) -> usize {
        let number = OrderNumber::from(number);
        self.calls.lock().unwrap().iter().filter(|n| **n == number).count()
    }

    fn next_script(&self, number: &OrderNumber) -> Script {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(number.clone());
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(number) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Script::Respond(AccrualResponse::NotRegistered)),
            None => Script::Respond(AccrualResponse::NotRegistered),
        }
    }
}

impl AccrualGateway for ScriptedGateway {
    async fn fetch_accrual(&self, number: &OrderNumber) -> Result<AccrualResponse, LedgerError> {
        match self.next_script(number) {
            Script::Respond(response) => Ok(response),
            Script::Fail(e) => Err(e),
            Script::Panic => panic!("Scripted panic while fetching the accrual for {number}"),
        }
    }
}
