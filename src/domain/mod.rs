// Domain layer: core models and ports (interfaces). No HTTP or IO here.

pub mod model;
pub mod notification;
pub mod ports;
