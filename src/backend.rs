use reqwest::{
    StatusCode,
    blocking::{Client, Response},
};

use crate::{
    api::{ApiError, CreatePostReq, LikeRes, LoginReq, LoginRes, Post, RegisterReq},
    error::Error,
    token::Credential,
};

/// The posts API. Persistence and like counting live behind it.
pub trait Backend {
    fn list_posts(&self) -> Result<Vec<Post>, Error>;

    fn create_post(&self, credential: &Credential, req: &CreatePostReq) -> Result<(), Error>;

    fn like_post(&self, credential: &Credential, id: i64) -> Result<LikeRes, Error>;

    fn login(&self, req: &LoginReq) -> Result<LoginRes, Error>;

    fn register(&self, req: &RegisterReq) -> Result<LoginRes, Error>;
}

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// `server` is the site root; the API is mounted under `/api`.
    pub fn new(server: &str) -> Self {
        let base_url = format!("{}/api", server.trim_end_matches('/'));
        tracing::debug!("Base API URL: {base_url}");
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

impl Backend for HttpBackend {
    fn list_posts(&self) -> Result<Vec<Post>, Error> {
        tracing::info!("Loading posts...");
        let res = self
            .client
            .get(format!("{}/posts", self.base_url))
            .send()
            .map_err(|source| Error::Network { source })?;
        // An empty feed comes back as `null` rather than `[]`.
        let posts: Option<Vec<Post>> = check(res)?
            .json()
            .map_err(|source| Error::MalformedPayload { source })?;
        Ok(posts.unwrap_or_default())
    }

    fn create_post(&self, credential: &Credential, req: &CreatePostReq) -> Result<(), Error> {
        tracing::info!("Submitting post...");
        let res = self
            .client
            .post(format!("{}/posts", self.base_url))
            .bearer_auth(credential.as_str())
            .json(req)
            .send()
            .map_err(|source| Error::Network { source })?;
        check(res)?;
        Ok(())
    }

    fn like_post(&self, credential: &Credential, id: i64) -> Result<LikeRes, Error> {
        tracing::info!("Liking post {id}...");
        let res = self
            .client
            .post(format!("{}/posts/{id}/like", self.base_url))
            .bearer_auth(credential.as_str())
            .send()
            .map_err(|source| Error::Network { source })?;
        check(res)?
            .json()
            .map_err(|source| Error::MalformedPayload { source })
    }

    fn login(&self, req: &LoginReq) -> Result<LoginRes, Error> {
        tracing::info!("Authenticating...");
        let res = self
            .client
            .post(format!("{}/login", self.base_url))
            .json(req)
            .send()
            .map_err(|source| Error::Network { source })?;
        check(res)?
            .json()
            .map_err(|source| Error::MalformedPayload { source })
    }

    fn register(&self, req: &RegisterReq) -> Result<LoginRes, Error> {
        tracing::info!("Registering...");
        let res = self
            .client
            .post(format!("{}/register", self.base_url))
            .json(req)
            .send()
            .map_err(|source| Error::Network { source })?;
        check(res)?
            .json()
            .map_err(|source| Error::MalformedPayload { source })
    }
}

/// Turn a non-success response into an error, keeping the backend's own
/// explanation when it sent one.
fn check(res: Response) -> Result<Response, Error> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let message = res
        .json::<ApiError>()
        .map(|body| body.error)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or_default().to_string());
    tracing::debug!("Backend answered {status}: {message}");

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(Error::Unauthorized { message })
    } else {
        Err(Error::Status {
            status: status.as_u16(),
            message,
        })
    }
}
