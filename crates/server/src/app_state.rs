use crate::api::InterpretationService;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) service: InterpretationService,
    pub(crate) body_limit_bytes: usize,
}
