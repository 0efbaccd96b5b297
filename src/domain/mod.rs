// Domain layer: form models, render decisions and the renderer port.

pub mod model;
pub mod ports;
