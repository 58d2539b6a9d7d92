use std::path::PathBuf;

use derive_more::{Display, Error};

/// Everything that can go wrong while talking to the backend or touching the
/// local files that stand in for the page.
#[derive(Debug, Display, Error)]
pub enum Error {
    #[display("no credential stored, log in first")]
    MissingCredential,

    #[display("nothing to post, the input is empty")]
    EmptyContent,

    #[display("could not reach the backend")]
    Network { source: reqwest::Error },

    #[display("the backend rejected the credential: {message}")]
    Unauthorized { message: String },

    #[display("the backend answered {status}: {message}")]
    Status {
        status: u16,
        message: String,
    },

    #[display("the backend sent an unexpected payload")]
    MalformedPayload { source: reqwest::Error },

    #[display("`{format}` is not a usable date format")]
    TimeFormat { format: String },

    #[display("the stored credential is not a readable token: {message}")]
    MalformedToken { message: String },

    #[display("failed to access {}", path.display())]
    Storage {
        path: PathBuf,
        source: std::io::Error,
    },

    #[display("{} is not a valid storage file: {message}", path.display())]
    StorageSyntax {
        path: PathBuf,
        message: String,
    },

    #[display("failed to write {}", path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}
