pub mod inspect;
pub mod playback;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub url: Option<String>,
}
