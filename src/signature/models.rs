use scraper::Html;

use crate::error::{Error, Result};
use crate::query::Node;

/// Placeholder drawn where the certificate should be signed
pub const PLACEHOLDER: &str = "..........";

/// Position of the signature line on a certificate, top-left origin
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinePos {
    /// Page width
    pub w: f32,
    /// Page height
    pub h: f32,
    /// Left
    pub l: f32,
    /// Right
    pub r: f32,
    /// Top
    pub t: f32,
    /// Bottom
    pub b: f32,
}

impl LinePos {
    /// Read the output of `pdftotext -bbox`
    pub fn from_bbox_html(html: &str) -> Result<Self> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let page = root
            .query_first("page")
            .ok_or(Error::MissingPageBox("page in the text layout"))?;
        let w = coordinate(&page, "width")?;
        let h = coordinate(&page, "height")?;

        // Only one placeholder is expected, the last one is kept
        let mut line = None;
        for word in root.query("word") {
            if word.text_content().contains(PLACEHOLDER) {
                line = Some((
                    coordinate(&word, "xmin")?,
                    coordinate(&word, "xmax")?,
                    coordinate(&word, "ymin")?,
                    coordinate(&word, "ymax")?,
                ));
            }
        }

        let (l, r, t, b) = line.ok_or(Error::PlaceholderNotFound)?;
        Ok(Self { w, h, l, r, t, b })
    }
}

fn coordinate<N: Node>(node: &N, name: &'static str) -> Result<f32> {
    node.attribute(name)
        .and_then(|v| v.trim().parse().ok())
        .ok_or(Error::MissingPageBox(name))
}

/// Boundaries of the signature page, bottom-left origin
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SigPos {
    pub l: f32,
    pub b: f32,
    pub r: f32,
    pub t: f32,
}

impl From<[f32; 4]> for SigPos {
    fn from([l, b, r, t]: [f32; 4]) -> Self {
        Self { l, b, r, t }
    }
}

/// Where the signature goes relative to the certificate's content
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Layer {
    /// Drawn first, the text stays readable over a non-transparent image
    #[default]
    Under,
    Over,
}

impl Layer {
    /// Read the optional command line flag, only falsy values put the signature over the text
    pub fn from_flag(flag: &str) -> Self {
        match flag {
            "0" | "no" | "false" | "False" | "" => Self::Over,
            _ => Self::Under,
        }
    }
}

/// Translation applied to the signature page
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub dx: f32,
    pub dy: f32,
}

impl Placement {
    /// Center the signature on the line, its origin at the line's top edge
    pub fn compute(line: &LinePos, sig: &SigPos) -> Self {
        Self {
            dx: (line.r + line.l) / 2. - (sig.r + sig.l) / 2.,
            dy: line.h - line.t,
        }
    }
}
