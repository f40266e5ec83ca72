#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid arguments: {0}")]
    Arguments(#[from] clap::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid address: {0}")]
    Address(#[from] std::net::AddrParseError),
    #[error("Database error: {0}")]
    Database(#[from] sneakers_dal::Error),
    #[error("Token setup error: {0}")]
    Token(#[from] sneakers_auth::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
