pub mod cache_store;
pub mod provider;
pub mod roles;
pub mod session;

pub use cache_store::{CacheIdentityProvider, SessionStoreSettings};
pub use provider::{IdentityError, IdentityProvider, IdentityResult};
pub use roles::{Role, check_role};
pub use session::{Check, Claims, SessionContext, SessionStatus};
