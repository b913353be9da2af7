use crate::application::AnalysisService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub analysis_service: Arc<AnalysisService>,
    /// Present when a Prometheus recorder was installed at startup
    pub metrics: Option<PrometheusHandle>,
}
