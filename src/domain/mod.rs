// Domain layer: models and ports. Concrete adapters live under `adapters` and `config`.

pub mod model;
pub mod ports;
