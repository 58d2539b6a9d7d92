use chrono::Local;

use crate::{
    api::{CreatePostReq, LikeRes},
    backend::Backend,
    error::Error,
    page::Page,
    render::{self, RenderOptions},
    storage::LocalStorage,
    token::Credential,
};

/// Loads posts into a page and submits new ones.
pub struct Feed<B, P> {
    backend: B,
    storage: LocalStorage,
    page: P,
    options: RenderOptions,
}

impl<B: Backend, P: Page> Feed<B, P> {
    pub fn new(backend: B, storage: LocalStorage, page: P, options: RenderOptions) -> Self {
        Self {
            backend,
            storage,
            page,
            options,
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    /// Fetch every post and replace the container with them. Nothing on the
    /// page changes unless the whole list arrived intact.
    pub fn load_posts(&mut self) -> Result<usize, Error> {
        let posts = self.backend.list_posts()?;
        let fragments = render::posts(&posts, &self.options, &Local);
        self.page.replace_posts(&fragments)?;
        tracing::info!("Rendered {} posts", posts.len());
        Ok(posts.len())
    }

    /// Submit the input as a new post, then reload the list.
    ///
    /// Without a stored credential the user is alerted and the backend is
    /// never contacted. When the backend refuses the post the input is kept
    /// as it was.
    pub fn create_post(&mut self) -> Result<(), Error> {
        let content = self.page.input()?;
        let credential = self.require_credential()?;
        if content.trim().is_empty() {
            return Err(Error::EmptyContent);
        }

        self.backend
            .create_post(&credential, &CreatePostReq { content })?;
        self.page.clear_input()?;
        self.load_posts()?;
        Ok(())
    }

    /// Toggle the caller's like on post `id`, then reload the list so the
    /// count is current.
    pub fn like_post(&mut self, id: i64) -> Result<LikeRes, Error> {
        let credential = self.require_credential()?;
        let res = self.backend.like_post(&credential, id)?;
        self.load_posts()?;
        Ok(res)
    }

    fn require_credential(&mut self) -> Result<Credential, Error> {
        if let Some(credential) = self.storage.credential() {
            Ok(credential)
        } else {
            self.page.alert(self.options.locale.missing_credential());
            Err(Error::MissingCredential)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{
        api::{LoginReq, LoginRes, Post, RegisterReq},
        locale::{Locale, PLACEHOLDER_AUTHOR},
        page::{FilePage, Input},
        render::tests::post,
        storage::TOKEN_KEY,
    };

    #[derive(Debug, PartialEq, Eq)]
    enum Call {
        List,
        Create { token: String, content: String },
        Like { token: String, id: i64 },
    }

    #[derive(Default)]
    struct FakeBackend {
        posts: Vec<Post>,
        refuse_reads: bool,
        refuse_writes: bool,
        calls: RefCell<Vec<Call>>,
    }

    impl Backend for FakeBackend {
        fn list_posts(&self) -> Result<Vec<Post>, Error> {
            self.calls.borrow_mut().push(Call::List);
            if self.refuse_reads {
                return Err(Error::Status {
                    status: 500,
                    message: "Ошибка получения постов".to_string(),
                });
            }
            Ok(self.posts.clone())
        }

        fn create_post(&self, credential: &Credential, req: &CreatePostReq) -> Result<(), Error> {
            self.calls.borrow_mut().push(Call::Create {
                token: credential.as_str().to_string(),
                content: req.content.clone(),
            });
            if self.refuse_writes {
                return Err(Error::Status {
                    status: 500,
                    message: "Ошибка создания поста".to_string(),
                });
            }
            Ok(())
        }

        fn like_post(&self, credential: &Credential, id: i64) -> Result<LikeRes, Error> {
            self.calls.borrow_mut().push(Call::Like {
                token: credential.as_str().to_string(),
                id,
            });
            Ok(LikeRes {
                message: "Лайк добавлен".to_string(),
                liked: true,
            })
        }

        fn login(&self, _req: &LoginReq) -> Result<LoginRes, Error> {
            unreachable!("the feed never logs in")
        }

        fn register(&self, _req: &RegisterReq) -> Result<LoginRes, Error> {
            unreachable!("the feed never registers")
        }
    }

    #[derive(Default)]
    struct FakePage {
        input: String,
        container: Option<String>,
        alerts: Vec<String>,
    }

    impl Page for FakePage {
        fn input(&self) -> Result<String, Error> {
            Ok(self.input.clone())
        }

        fn clear_input(&mut self) -> Result<(), Error> {
            self.input.clear();
            Ok(())
        }

        fn replace_posts(&mut self, fragments: &str) -> Result<(), Error> {
            self.container = Some(fragments.to_string());
            Ok(())
        }

        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }
    }

    fn feed(backend: FakeBackend, token: Option<&str>, input: &str) -> Feed<FakeBackend, FakePage> {
        let mut storage = LocalStorage::default();
        if let Some(token) = token {
            storage.set(TOKEN_KEY, token);
        }
        let page = FakePage {
            input: input.to_string(),
            ..FakePage::default()
        };
        Feed::new(backend, storage, page, RenderOptions::new(Locale::Ru))
    }

    #[test]
    fn load_with_no_posts_empties_container() {
        let mut feed = feed(FakeBackend::default(), None, "");
        feed.page.container = Some("stale".to_string());

        assert_eq!(feed.load_posts().unwrap(), 0);
        assert_eq!(feed.page().container.as_deref(), Some(""));
    }

    #[test]
    fn load_renders_each_post_in_order() {
        let backend = FakeBackend {
            posts: vec![post(5, Some("lei"), "five"), post(2, None, "two")],
            ..FakeBackend::default()
        };
        let mut feed = feed(backend, None, "");

        assert_eq!(feed.load_posts().unwrap(), 2);
        let html = feed.page().container.clone().unwrap();
        assert_eq!(html.matches(r#"class="post""#).count(), 2);
        assert!(html.find("five").unwrap() < html.find("two").unwrap());
        assert!(html.contains("<strong>lei</strong>"));
        assert!(html.contains(&format!("<strong>{PLACEHOLDER_AUTHOR}</strong>")));
    }

    #[test]
    fn failed_load_keeps_previous_container() {
        let backend = FakeBackend {
            refuse_reads: true,
            ..FakeBackend::default()
        };
        let mut feed = feed(backend, None, "");
        feed.page.container = Some("<div>earlier</div>".to_string());

        let err = feed.load_posts().unwrap_err();

        assert!(matches!(err, Error::Status { status: 500, .. }));
        assert_eq!(feed.page().container.as_deref(), Some("<div>earlier</div>"));
    }

    #[test]
    fn failed_load_leaves_output_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("posts.html");
        let working = FakeBackend {
            posts: vec![post(1, Some("lei"), "first")],
            ..FakeBackend::default()
        };
        let page = FilePage::new(&output, Input::None);
        Feed::new(working, LocalStorage::default(), page, RenderOptions::new(Locale::En))
            .load_posts()
            .unwrap();
        let before = std::fs::read_to_string(&output).unwrap();

        let failing = FakeBackend {
            refuse_reads: true,
            ..FakeBackend::default()
        };
        let page = FilePage::new(&output, Input::None);
        let mut feed = Feed::new(
            failing,
            LocalStorage::default(),
            page,
            RenderOptions::new(Locale::En),
        );

        assert!(feed.load_posts().is_err());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), before);
        assert!(before.contains("first"));
    }

    #[test]
    fn failed_reload_after_submit_keeps_container_and_reports() {
        let backend = FakeBackend {
            refuse_reads: true,
            ..FakeBackend::default()
        };
        let mut feed = feed(backend, Some("abc"), "hello");
        feed.page.container = Some("<div>earlier</div>".to_string());

        assert!(feed.create_post().is_err());
        assert_eq!(feed.page().input, "");
        assert_eq!(feed.page().container.as_deref(), Some("<div>earlier</div>"));
    }

    #[test]
    fn submit_without_credential_alerts_and_sends_nothing() {
        let mut feed = feed(FakeBackend::default(), None, "hello");

        assert!(matches!(feed.create_post(), Err(Error::MissingCredential)));
        assert_eq!(feed.page().alerts, ["Товарищ, авторизуйтесь!"]);
        assert!(feed.backend.calls.borrow().is_empty());
        assert_eq!(feed.page().input, "hello");
    }

    #[test]
    fn submit_posts_once_clears_input_and_reloads_once() {
        let mut feed = feed(FakeBackend::default(), Some("abc"), "hello");

        feed.create_post().unwrap();

        assert_eq!(
            *feed.backend.calls.borrow(),
            [
                Call::Create {
                    token: "abc".to_string(),
                    content: "hello".to_string()
                },
                Call::List,
            ]
        );
        assert_eq!(feed.page().input, "");
        assert!(feed.page().container.is_some());
        assert!(feed.page().alerts.is_empty());
    }

    #[test]
    fn refused_submit_keeps_input_and_skips_reload() {
        let backend = FakeBackend {
            refuse_writes: true,
            ..FakeBackend::default()
        };
        let mut feed = feed(backend, Some("abc"), "hello");

        let err = feed.create_post().unwrap_err();

        assert!(matches!(err, Error::Status { status: 500, .. }));
        assert_eq!(feed.page().input, "hello");
        assert_eq!(feed.backend.calls.borrow().len(), 1);
        assert!(feed.page().container.is_none());
    }

    #[test]
    fn blank_input_is_not_submitted() {
        let mut feed = feed(FakeBackend::default(), Some("abc"), "  \n");

        assert!(matches!(feed.create_post(), Err(Error::EmptyContent)));
        assert!(feed.backend.calls.borrow().is_empty());
    }

    #[test]
    fn like_requires_credential() {
        let mut feed = feed(FakeBackend::default(), None, "");

        assert!(matches!(feed.like_post(3), Err(Error::MissingCredential)));
        assert_eq!(feed.page().alerts.len(), 1);
        assert!(feed.backend.calls.borrow().is_empty());
    }

    #[test]
    fn like_then_reload() {
        let mut feed = feed(FakeBackend::default(), Some("abc"), "");

        let res = feed.like_post(3).unwrap();

        assert!(res.liked);
        assert_eq!(
            *feed.backend.calls.borrow(),
            [
                Call::Like {
                    token: "abc".to_string(),
                    id: 3
                },
                Call::List,
            ]
        );
    }
}
