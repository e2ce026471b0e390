// Domain layer: models, ports and region rules. No I/O here.

pub mod model;
pub mod ports;
pub mod region;
