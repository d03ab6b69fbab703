//! Signature overlay for certificates
//!
//! The certificate's text layout comes from `pdftotext -bbox` (poppler-utils), which uses a
//! top-left origin. PDF content uses a bottom-left origin, hence `dy = page height - top`.
//!
//! The signature's first page is imported as a Form XObject and drawn on the first page of
//! the certificate, either before its content (under the text) or after it (over the text).

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};

pub mod models;

use models::{Layer, LinePos, Placement, SigPos};

/// Page tree depth after which inherited attributes aren't searched anymore
const MAX_DEPTH: usize = 16;

impl LinePos {
    /// Run `pdftotext -bbox` on a certificate
    pub fn from_pdf(path: &Path) -> Result<Self> {
        let output = Command::new("pdftotext")
            .arg("-bbox")
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| Error::TextLayout(format!("can't run pdftotext: {e}")))?;

        if !output.status.success() {
            return Err(Error::TextLayout(format!(
                "{} on {}: {}",
                output.status,
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Self::from_bbox_html(&String::from_utf8_lossy(&output.stdout))
    }
}

impl SigPos {
    /// Boundaries of a page, from its MediaBox
    pub fn from_page(doc: &Document, page_id: ObjectId) -> Result<Self> {
        media_box(doc, page_id).map(Self::from)
    }
}

/// Output file name, the prefix is prepended to the certificate's path as is
pub fn output_path(prefix: &str, cert: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}{cert}"))
}

/// Sign a certificate, returns where the signature was put
pub fn add_signature(cert: &Path, sig: &Path, out: &Path, layer: Layer) -> Result<Placement> {
    let line = LinePos::from_pdf(cert)?;
    debug!("Placeholder line: {line:?}");

    let sig_doc = Document::load(sig)?;
    let mut cert_doc = Document::load(cert)?;

    let sig_pos = SigPos::from_page(&sig_doc, first_page(&sig_doc)?)?;
    let placement = Placement::compute(&line, &sig_pos);

    overlay(&mut cert_doc, &sig_doc, placement, layer)?;
    cert_doc.save(out)?;
    info!(
        "Signature {layer:?} the text at ({}, {}) => {}",
        placement.dx,
        placement.dy,
        out.display()
    );

    Ok(placement)
}

/// Draw the first page of `sig` on the first page of `cert`
pub fn overlay(
    cert: &mut Document,
    sig: &Document,
    placement: Placement,
    layer: Layer,
) -> Result<()> {
    let sig_page = first_page(sig)?;
    let bbox = media_box(sig, sig_page)?;
    let content = sig.get_page_content(sig_page)?;
    let resources = inherited(sig, sig_page, b"Resources")
        .cloned()
        .unwrap_or_else(|| Object::Dictionary(Dictionary::new()));

    // Import every object of the signature, unreachable ones are pruned at the end
    let offset = cert.max_id;
    for (&(id, generation), object) in &sig.objects {
        cert.objects
            .insert((id + offset, generation), shift_refs(object.clone(), offset));
    }
    cert.max_id += sig.max_id;

    let xobject = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => bbox.iter().map(|&v| Object::Real(v)).collect::<Vec<_>>(),
            "Resources" => shift_refs(resources, offset),
        },
        content,
    );
    let xobject_id = cert.add_object(xobject);

    let page_id = first_page(cert)?;
    let mut resources = inherited(cert, page_id, b"Resources")
        .and_then(|obj| resolve(cert, obj).as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);
    let mut xobjects = resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve(cert, obj).as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    let name = free_name(&xobjects);
    xobjects.set(name.clone(), Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    let draw = format!(
        "q 1 0 0 1 {} {} cm /{name} Do Q\n",
        placement.dx, placement.dy
    );
    // Contents is a stream or an array of streams, either may be indirect
    let existing = match cert.get_dictionary(page_id)?.get(b"Contents") {
        Ok(contents) => match (contents, resolve(cert, contents)) {
            (_, Object::Array(streams)) => streams.clone(),
            (Object::Reference(id), _) => vec![Object::Reference(*id)],
            _ => vec![],
        },
        Err(_) => vec![],
    };
    let contents = match layer {
        Layer::Under => {
            let draw_id = add_content(cert, draw);
            [vec![Object::Reference(draw_id)], existing].concat()
        }
        Layer::Over => {
            // Isolate the certificate's graphics state from the signature
            let open_id = add_content(cert, "q\n".to_owned());
            let draw_id = add_content(cert, format!("Q\n{draw}"));
            [
                vec![Object::Reference(open_id)],
                existing,
                vec![Object::Reference(draw_id)],
            ]
            .concat()
        }
    };

    let page = cert.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", Object::Dictionary(resources));
    page.set("Contents", Object::Array(contents));

    let pruned = cert.prune_objects();
    debug!("{} unused object(s) pruned", pruned.len());

    Ok(())
}

fn add_content(doc: &mut Document, content: String) -> ObjectId {
    doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()))
}

/// First unused `/SigN` resource name
fn free_name(xobjects: &Dictionary) -> String {
    let mut i = 0;
    loop {
        let name = format!("Sig{i}");
        if !xobjects.has(name.as_bytes()) {
            return name;
        }
        i += 1;
    }
}

fn first_page(doc: &Document) -> Result<ObjectId> {
    doc.get_pages()
        .values()
        .next()
        .copied()
        .ok_or(Error::MissingPageBox("page"))
}

/// Follow a reference, if it is one
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

/// Attribute of a page, possibly inherited from the page tree
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut id = page_id;
    for _ in 0..MAX_DEPTH {
        let dict = doc.get_dictionary(id).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        id = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }

    None
}

fn media_box(doc: &Document, page_id: ObjectId) -> Result<[f32; 4]> {
    let values: Vec<f32> = inherited(doc, page_id, b"MediaBox")
        .and_then(|obj| resolve(doc, obj).as_array().ok())
        .map(|array| array.iter().filter_map(number).collect())
        .unwrap_or_default();

    <[f32; 4]>::try_from(values.as_slice()).map_err(|_| Error::MissingPageBox("MediaBox"))
}

#[allow(clippy::cast_precision_loss)]
fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Move every reference of an imported object by `offset`
fn shift_refs(object: Object, offset: u32) -> Object {
    match object {
        Object::Reference((id, generation)) => Object::Reference((id + offset, generation)),
        Object::Array(array) => {
            Object::Array(array.into_iter().map(|o| shift_refs(o, offset)).collect())
        }
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = shift_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = shift_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}
