use metrics_exporter_prometheus::PrometheusHandle;
use perf_eval::error::AppError;
use perf_eval::evaluations::{EvaluationService, ScoringConfig};
use perf_eval::governance::{CategoryBlueprint, CategoryService};
use perf_eval::memory::{InMemoryCatalog, InMemoryEvaluationStore, InMemoryNotifier};
use rust_decimal::Decimal;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type Categories = CategoryService<InMemoryCatalog>;
pub(crate) type Evaluations =
    EvaluationService<InMemoryCatalog, InMemoryEvaluationStore, InMemoryNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Services sharing one in-memory catalog, seeded with the standard blueprint.
pub(crate) struct Services {
    pub(crate) categories: Arc<Categories>,
    pub(crate) evaluations: Arc<Evaluations>,
    pub(crate) notifier: Arc<InMemoryNotifier>,
}

pub(crate) fn build_services(config: &ScoringConfig) -> Result<Services, AppError> {
    let catalog = Arc::new(InMemoryCatalog::default());
    let categories = Arc::new(CategoryService::new(
        catalog.clone(),
        config.weight_tolerance,
    ));
    categories.install_blueprint(&CategoryBlueprint::standard())?;

    let notifier = Arc::new(InMemoryNotifier::default());
    let evaluations = Arc::new(EvaluationService::new(
        catalog,
        Arc::new(InMemoryEvaluationStore::default()),
        notifier.clone(),
        config.clone(),
    ));

    Ok(Services {
        categories,
        evaluations,
        notifier,
    })
}

/// Parse a `NAME=PERCENT` weight override.
pub(crate) fn parse_weight_override(raw: &str) -> Result<(String, Decimal), String> {
    let (name, weight) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PERCENT, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing category name in '{raw}'"));
    }
    let weight = weight
        .trim()
        .parse::<Decimal>()
        .map_err(|err| format!("failed to parse '{}' as a percentage ({err})", weight.trim()))?;
    Ok((name.to_string(), weight))
}
