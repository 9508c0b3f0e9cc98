pub use membrane::test_utils::*;
use membrane::{EnergyModel, ModelParams, TriMesh};

pub fn init_logger() {
    let _ = env_logger::Builder::from_env("MEMBRANE_LOG")
        .is_test(true)
        .try_init();
}

/// Build a model on the given mesh, panicking on invalid input.
#[allow(dead_code)]
pub fn model(mesh: &TriMesh, params: ModelParams) -> EnergyModel<'_> {
    init_logger();
    EnergyModel::new(mesh, params).expect("valid model")
}
