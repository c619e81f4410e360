mod config;
mod organization;
mod project;
mod retrospective;
mod sprint;
mod task;
mod team;
mod user;

pub use config::*;
pub use organization::*;
pub use project::*;
pub use retrospective::*;
pub use sprint::*;
pub use task::*;
pub use team::*;
pub use user::*;
