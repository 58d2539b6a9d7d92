use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use build_html::{Html, HtmlContainer, HtmlPage};
use tempfile::NamedTempFile;

use crate::error::Error;

/// The surface the feed reads from and renders into.
pub trait Page {
    /// Current text of the post input.
    fn input(&self) -> Result<String, Error>;

    fn clear_input(&mut self) -> Result<(), Error>;

    /// Replace everything in the posts container with `fragments`.
    fn replace_posts(&mut self, fragments: &str) -> Result<(), Error>;

    /// Tell the user something they must act on.
    fn alert(&mut self, message: &str);
}

/// Where the text of a new post comes from.
#[derive(Debug, Clone)]
pub enum Input {
    /// A file the user edits; cleared once its content is posted.
    Draft(PathBuf),
    /// Text given directly on the command line.
    Inline(String),
    None,
}

/// A page backed by files: the rendered posts go to an HTML document and
/// the input is a draft file or inline text.
pub struct FilePage {
    output: PathBuf,
    input: Input,
}

impl FilePage {
    pub fn new(output: impl Into<PathBuf>, input: Input) -> Self {
        Self {
            output: output.into(),
            input,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl Page for FilePage {
    fn input(&self) -> Result<String, Error> {
        match &self.input {
            Input::Draft(path) => match fs::read_to_string(path) {
                Ok(text) => Ok(text.trim_end_matches(['\r', '\n']).to_string()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
                Err(source) => Err(Error::Storage {
                    path: path.clone(),
                    source,
                }),
            },
            Input::Inline(text) => Ok(text.clone()),
            Input::None => Ok(String::new()),
        }
    }

    fn clear_input(&mut self) -> Result<(), Error> {
        match &mut self.input {
            Input::Draft(path) => fs::write(&*path, "").map_err(|source| Error::Output {
                path: path.clone(),
                source,
            }),
            Input::Inline(text) => {
                text.clear();
                Ok(())
            }
            Input::None => Ok(()),
        }
    }

    fn replace_posts(&mut self, fragments: &str) -> Result<(), Error> {
        let html = document(fragments).to_html_string();

        // Write beside the target and rename over it so a reader never sees
        // a half-written page. Each write gets its own temporary file.
        let dir = match self.output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let to_err = |source| Error::Output {
            path: self.output.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(to_err)?;
        tmp.write_all(html.as_bytes()).map_err(to_err)?;
        tmp.persist(&self.output).map_err(|e| to_err(e.error))?;
        tracing::debug!("Wrote {}", self.output.display());
        Ok(())
    }

    fn alert(&mut self, message: &str) {
        tracing::error!("{message}");
    }
}

/// The whole document around the posts container.
pub fn document(fragments: &str) -> HtmlPage {
    let mut page = HtmlPage::new()
        .with_title("Posts")
        .with_style(include_str!("style.css"));
    page.add_raw(format!(r#"<div id="posts">{fragments}</div>"#));
    page
}
