#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use reqsensor::errors::{Result, SensorError};
use reqsensor::sink::TriggerSink;
use reqsensor::source::{ChangeSource, PayloadLoader};
use reqsensor::trigger::{Payload, TriggerRequest};
use reqsensor::types::{Enumeration, ItemId, Observation};

/// A sink that records every request it is handed, or fails on demand.
#[derive(Clone, Default)]
pub struct RecordingSink {
    delivered: Arc<Mutex<Vec<TriggerRequest>>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn delivered(&self) -> Vec<TriggerRequest> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.delivered()
            .iter()
            .map(|r| r.idempotency_key.to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.delivered.lock().unwrap().clear();
    }
}

impl TriggerSink for RecordingSink {
    fn deliver(
        &mut self,
        requests: Vec<TriggerRequest>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let delivered = Arc::clone(&self.delivered);
        let fail = *self.fail.lock().unwrap();

        Box::pin(async move {
            if fail {
                return Err(SensorError::Delivery("sink configured to fail".to_string()));
            }
            delivered.lock().unwrap().extend(requests);
            Ok(())
        })
    }
}

/// A source whose enumeration is set directly by the test.
#[derive(Clone)]
pub struct StaticSource {
    state: Arc<Mutex<std::result::Result<Enumeration, String>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl StaticSource {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        let source = Self {
            state: Arc::new(Mutex::new(Ok(Enumeration::default()))),
            delay: Arc::new(Mutex::new(None)),
        };
        source.set(pairs);
        source
    }

    pub fn set(&self, pairs: &[(&str, &str)]) {
        let observations: Vec<Observation> = pairs
            .iter()
            .map(|(id, fp)| Observation::new(*id, *fp))
            .collect();
        *self.state.lock().unwrap() = Ok(observations.into());
    }

    /// Report these identities as listed but unreadable.
    pub fn set_unreadable(&self, ids: &[&str]) {
        if let Ok(enumeration) = self.state.lock().unwrap().as_mut() {
            enumeration.unreadable = ids.iter().map(|id| ItemId::from(*id)).collect();
        }
    }

    pub fn set_unavailable(&self, reason: &str) {
        *self.state.lock().unwrap() = Err(reason.to_string());
    }

    /// Block every enumeration for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }
}

impl ChangeSource for StaticSource {
    fn enumerate(&self) -> Result<Enumeration> {
        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            std::thread::sleep(d);
        }
        self.state
            .lock()
            .unwrap()
            .clone()
            .map_err(SensorError::SourceUnavailable)
    }
}

/// How [`ScriptedLoader`] answers for one identity.
#[derive(Clone, Debug)]
pub enum LoadBehaviour {
    Fail(String),
    Sleep(Duration),
}

/// Payload loader answering `{"filename": <id>}` unless scripted otherwise,
/// and recording every identity it was asked for.
#[derive(Clone, Default)]
pub struct ScriptedLoader {
    script: Arc<Mutex<HashMap<ItemId, LoadBehaviour>>>,
    calls: Arc<Mutex<Vec<ItemId>>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, id: &str, behaviour: LoadBehaviour) {
        self.script
            .lock()
            .unwrap()
            .insert(ItemId::from(id), behaviour);
    }

    pub fn reset(&self, id: &str) {
        self.script.lock().unwrap().remove(&ItemId::from(id));
    }

    pub fn calls(&self) -> Vec<ItemId> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl PayloadLoader for ScriptedLoader {
    fn load(&self, id: &ItemId) -> Result<Payload> {
        self.calls.lock().unwrap().push(id.clone());
        let behaviour = self.script.lock().unwrap().get(id).cloned();

        match behaviour {
            Some(LoadBehaviour::Fail(reason)) => Err(SensorError::payload(id, reason)),
            Some(LoadBehaviour::Sleep(d)) => {
                std::thread::sleep(d);
                Ok(filename_payload(id))
            }
            None => Ok(filename_payload(id)),
        }
    }
}

fn filename_payload(id: &ItemId) -> Payload {
    match json!({ "filename": id.as_str() }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}
