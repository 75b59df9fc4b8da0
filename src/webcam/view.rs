// SPDX-License-Identifier: GPL-3.0-only

//! Rendered video element

use crate::config::{Dimension, WebcamProps};
use std::collections::BTreeMap;
use std::fmt;

/// Description of the `<video>` element an instance renders
#[derive(Debug, Clone, PartialEq)]
pub struct VideoElement {
    pub autoplay: bool,
    /// Object URL of the attached stream; unset until a stream arrives
    pub src: Option<String>,
    pub muted: bool,
    pub width: Dimension,
    pub height: Dimension,
    pub class_name: String,
    pub style: BTreeMap<String, String>,
}

impl VideoElement {
    pub(crate) fn new(props: &WebcamProps, src: Option<String>) -> Self {
        Self {
            autoplay: true,
            src,
            muted: props.muted,
            width: props.width,
            height: props.height,
            class_name: props.class_name.clone(),
            style: props.style.clone(),
        }
    }

    /// Inline CSS for the `style` attribute, properties in kebab-case
    pub fn style_attribute(&self) -> String {
        self.style
            .iter()
            .map(|(key, value)| format!("{}: {};", kebab_case(key), value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for VideoElement {
    /// HTML markup for the element
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<video")?;
        if self.autoplay {
            f.write_str(" autoplay")?;
        }
        write!(f, " width=\"{}\"", escape(&self.width.to_string()))?;
        write!(f, " height=\"{}\"", escape(&self.height.to_string()))?;
        if let Some(src) = &self.src {
            write!(f, " src=\"{}\"", escape(src))?;
        }
        if self.muted {
            f.write_str(" muted")?;
        }
        if !self.class_name.is_empty() {
            write!(f, " class=\"{}\"", escape(&self.class_name))?;
        }
        if !self.style.is_empty() {
            write!(f, " style=\"{}\"", escape(&self.style_attribute()))?;
        }
        f.write_str("></video>")
    }
}

/// `backgroundColor` -> `background-color`
fn kebab_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}
