pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("User password error: {0}")]
    UserPasswordError(#[from] argon2::password_hash::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("The name has already been taken: {0}")]
    DuplicateName(String),

    #[error("The email has already been taken: {0}")]
    DuplicateEmail(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid order by field: {0}")]
    InvalidOrderByField(String),
}

impl Error {
    /// Maps unique constraint violation to `conflict`, other errors stay database errors
    pub(crate) fn on_unique_violation(e: sqlx::Error, conflict: impl FnOnce() -> Error) -> Error {
        match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => conflict(),
            _ => Error::DatabaseError(e),
        }
    }
}
