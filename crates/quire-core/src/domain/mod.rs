//! Domain entities and the rules that govern them.

mod actor;
mod input;
mod pagination;
mod policy;
mod post;
mod publication;
mod user;

pub use actor::Actor;
pub use input::{PostInput, RawPostInput, parse_timestamp};
pub use pagination::{DEFAULT_PER_PAGE, MAX_PER_PAGE, MIN_PER_PAGE, Page, PageRequest};
pub use policy::{AccessPolicy, Action, Decision, Denial, ViewMode};
pub use post::{Post, TITLE_MAX_CHARS};
pub use publication::{PostFilter, PublicationState};
pub use user::{Owner, User};
