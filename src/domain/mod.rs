// Domain layer: schema and deck models plus the ports (interfaces) of the output stage.

pub mod model;
pub mod ports;
pub mod schema;
