#![forbid(unsafe_code)]

use url::Url;

use crate::error::{StreamError, StreamResult};

const INDEX_PLACEHOLDER: &str = "{index}";

/// Segment file naming, e.g. `chunk_{index}.ts`.
///
/// `/` in the template nests the segment below the base path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentTemplate(String);

impl SegmentTemplate {
    pub fn new<S: Into<String>>(template: S) -> StreamResult<Self> {
        let template = template.into();
        if !template.contains(INDEX_PLACEHOLDER) {
            return Err(StreamError::InvalidTemplate(template));
        }
        Ok(Self(template))
    }

    pub fn render(&self, index: u64) -> String {
        self.0.replace(INDEX_PLACEHOLDER, &index.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SegmentTemplate {
    fn default() -> Self {
        Self("chunk_{index}.ts".to_string())
    }
}

/// One fetchable unit of the stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub index: u64,
    pub location: Url,
}

/// Maps segment indices to URLs below a base stream location.
///
/// The base is treated as a directory whether or not it ends in `/`; its
/// query string is carried onto every segment URL.
#[derive(Clone, Debug)]
pub struct SegmentAddresser {
    base: Url,
    template: SegmentTemplate,
}

impl SegmentAddresser {
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidBaseUrl`] for URLs without a hierarchical
    /// path (`data:`, `mailto:`).
    pub fn new(base: Url, template: SegmentTemplate) -> StreamResult<Self> {
        if base.cannot_be_a_base() {
            return Err(StreamError::InvalidBaseUrl(base.to_string()));
        }
        Ok(Self { base, template })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn location_for(&self, index: u64) -> Url {
        let name = self.template.render(index);
        let mut url = self.base.clone();
        url.set_fragment(None);
        // Checked in `new`; a base-less URL never reaches here.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(name.split('/'));
        }
        url
    }

    pub fn segment(&self, index: u64) -> Segment {
        Segment {
            index,
            location: self.location_for(index),
        }
    }
}
