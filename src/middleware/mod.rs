/*
 * Responsibility
 * - Router-level middleware, applied from app.rs
 *   - admission: the request admission gate
 *   - http / cors / security_headers: cross-cutting transport concerns
 */
pub mod admission;
pub mod cors;
pub mod http;
pub mod security_headers;
