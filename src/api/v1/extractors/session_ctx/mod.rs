/*!
 * Session context extractors
 *
 * Responsibility:
 * - Hand the Session Context resolved by the admission middleware to handlers
 * - Handlers never talk to the identity provider themselves
 */

mod core;

pub use self::core::{CurrentSession, MaybeSession};
