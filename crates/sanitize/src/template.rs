//! Builtin document template, embedded at compile time.

use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use rust_embed::Embed;
use std::borrow::Cow;

pub(crate) const DOCUMENT_TEMPLATE: &str = "document.html";

#[derive(Embed)]
#[folder = "../../assets/templates/"]
pub struct Templates;
impl Templates {
    pub fn load(name: &'static str) -> Result<Cow<'static, [u8]>> {
        Self::get(name).map(|f| f.data).ok_or_raise(|| ErrorKind::Template(name))
    }
}
