// Module layout (Clean Architecture style)
// - bootstrap: configuration and startup
// - infrastructure: DB and scoring service adapters, retry worker
// - presentation: HTTP handlers and routing
// - application: ports, use cases and lifecycle policies
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
