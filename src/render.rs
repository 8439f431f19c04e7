//! Renders a parsed [`Document`] to its output text.
//!
//! Plain content passes through verbatim. A tag named `eval` hands its raw
//! content to the shared evaluator context and splices whatever the program
//! wrote to the output buffer. Any other tag renders its children.

use anyhow::{Context as _, Result};
use tracing::trace;

use crate::eval::Context;
use crate::mml::{Document, Element, Tag};

pub const EVAL_TAG: &str = "eval";

pub fn render_document(doc: &Document<'_>, ctx: &mut Context) -> Result<String> {
    let mut out = String::with_capacity(doc.source.len());
    render_elements(&doc.elements, ctx, &mut out)?;
    Ok(out)
}

fn render_elements(elements: &[Element<'_>], ctx: &mut Context, out: &mut String) -> Result<()> {
    for element in elements {
        match element {
            Element::Content(content) => out.push_str(content.text),
            Element::Tag(tag) => render_tag(tag, ctx, out)?,
        }
    }
    Ok(())
}

fn render_tag(tag: &Tag<'_>, ctx: &mut Context, out: &mut String) -> Result<()> {
    if tag.name == EVAL_TAG {
        trace!("evaluating tag: {}", tag.orig_text);
        if let Some(source) = tag.raw_content {
            ctx.eval(source)
                .with_context(|| format!("evaluating `{}`", source.trim()))?;
        }
        out.push_str(&ctx.pull_buffer());
        return Ok(());
    }
    if let Some(children) = &tag.content {
        render_elements(children, ctx, out)?;
    }
    Ok(())
}
