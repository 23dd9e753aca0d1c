/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: embedded schema migrations (`migrations/` at the workspace root)
///
/// Queries live with their models in `crate::models`; services reach them
/// through `crate::store::postgres::PgStore`.

pub mod migrations;
pub mod pool;
