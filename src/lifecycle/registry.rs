use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{LinkPollPolicy, TemplateLifecycleController};
use crate::gateway::ProgramGateway;

/// One lifecycle controller per program, shared between requests.
#[derive(Clone)]
pub struct ControllerRegistry {
    gateway: Arc<dyn ProgramGateway>,
    policy: LinkPollPolicy,
    controllers: Arc<Mutex<HashMap<String, Arc<TemplateLifecycleController>>>>,
}

impl ControllerRegistry {
    pub fn new(gateway: Arc<dyn ProgramGateway>, policy: LinkPollPolicy) -> Self {
        Self {
            gateway,
            policy,
            controllers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn gateway(&self) -> &Arc<dyn ProgramGateway> {
        &self.gateway
    }

    pub fn controller(&self, program_id: &str) -> Arc<TemplateLifecycleController> {
        let mut controllers = self
            .controllers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        controllers
            .entry(program_id.to_string())
            .or_insert_with(|| {
                Arc::new(TemplateLifecycleController::new(
                    Arc::clone(&self.gateway),
                    program_id,
                    self.policy,
                ))
            })
            .clone()
    }
}
