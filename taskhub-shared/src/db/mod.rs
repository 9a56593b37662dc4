/// Database plumbing shared by the API and the worker
///
/// - `pool`: connection pool with a startup health check
/// - `migrations`: embedded schema migrations

pub mod migrations;
pub mod pool;
