/// Database models for TaskHub
///
/// Each model owns its row struct, a `Create*` input struct and the SQL for
/// single-statement operations. Methods take any `PgExecutor`, so they run
/// equally against the pool or inside a transaction opened by `PgStore`.
///
/// # Models
///
/// - `user`: accounts and credentials
/// - `project`: projects
/// - `membership`: (project, user) rows with a Leader/Member role
/// - `invitation`: time-limited email invitations
/// - `subscription`: paid entitlements lifting the free-tier member limit
/// - `task`: assigned work with deadlines

pub mod invitation;
pub mod membership;
pub mod project;
pub mod subscription;
pub mod task;
pub mod user;
