#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "{}", _0)]
    IO(::std::io::Error),
    #[fail(display = "{}", _0)]
    Json(::serde_json::Error),
    #[fail(display = "No asset loader is attached to the engine.")]
    NoAssetLoader,
    #[fail(display = "Asset {} could not be found.", _0)]
    AssetNotFound(String),
    #[fail(display = "Asset {} is not of the requested kind.", _0)]
    AssetKindMismatch(String),
    #[fail(display = "{}", _0)]
    Other(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<::std::io::Error> for Error {
    fn from(err: ::std::io::Error) -> Self {
        Error::IO(err)
    }
}

impl From<::serde_json::Error> for Error {
    fn from(err: ::serde_json::Error) -> Self {
        Error::Json(err)
    }
}
