//! Startup and reload handling for the persisted failure model.

use std::path::Path;

use aura_core::config::MachineSpec;
use aura_core::error::CoreError;
use aura_core::health::training;
use aura_core::health::LogisticModel;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Load the model at `path`, or train one on simulated history and save it.
///
/// A model that fails to load is replaced by a freshly trained one. Saving
/// is best effort; training failure is returned to the caller.
pub fn load_or_train(
    path: &Path,
    fleet: &[MachineSpec],
    seed: Option<u64>,
) -> Result<LogisticModel, CoreError> {
    match LogisticModel::load(path) {
        Ok(model) => {
            tracing::info!(path = %path.display(), "Failure model loaded");
            return Ok(model);
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failure model not loadable, training a new one");
        }
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let (model, _report) = training::bootstrap(fleet, &mut rng)?;

    if let Err(e) = model.save(path) {
        tracing::warn!(path = %path.display(), error = %e, "Could not persist trained model");
    } else {
        tracing::info!(path = %path.display(), "Trained model saved");
    }
    Ok(model)
}

/// Re-read the model at `path` without falling back to training.
pub fn reload(path: &Path) -> Result<LogisticModel, CoreError> {
    LogisticModel::load(path)
}

#[cfg(test)]
mod tests {
    use aura_core::config::default_fleet;

    use super::*;

    #[test]
    fn missing_model_is_trained_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model").join("aura_model.json");

        let trained = load_or_train(&path, &default_fleet(), Some(3)).unwrap();
        assert!(path.exists());

        let loaded = load_or_train(&path, &default_fleet(), Some(4)).unwrap();
        assert_eq!(loaded, trained);
    }

    #[test]
    fn reload_does_not_train() {
        let dir = tempfile::tempdir().unwrap();
        assert!(reload(&dir.path().join("absent.json")).is_err());
    }
}
