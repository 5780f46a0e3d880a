use signsos_model::ModelHandle;
use std::sync::Arc;

pub type AppState = Arc<State>;

pub struct State {
    pub model: ModelHandle,
}

impl State {
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }
}
