pub mod core;
pub mod matcher;
pub mod types;

pub use self::core::{AdmissionGate, SessionLookup};
pub use matcher::{PathPattern, PatternError, RouteMatcher};
pub use types::{
    Decision, DenyAction, GateConfig, ProtectedRoute, RedirectTargets, Rejection,
    RequestDescriptor, Requirement, RouteClass, RouteRuleError,
};
