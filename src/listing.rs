//! Directory listing renderer
//!
//! Pure rendering of a sorted entry set into a standalone HTML document
//! (inline styling only, no external resources).

use crate::vfs::DirEntryInfo;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::cmp::Ordering;

/// Sort listing entries: directories before files, lexicographically by name
/// within each group.
pub fn sort_entries(entries: &mut [DirEntryInfo]) {
    entries.sort_by(|a, b| match (a.is_dir, b.is_dir) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });
}

/// Render an HTML index of `request_path` over pre-sorted entries. The
/// parent link is omitted only at the root.
#[must_use]
pub fn render(request_path: &str, entries: &[DirEntryInfo]) -> String {
    let title = escape_html(request_path);
    let mut html = String::with_capacity(1024 + entries.len() * 128);

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>Index of {title}</title>\n"));
    html.push_str(
        "<style>\n\
         body { font-family: -apple-system, \"Segoe UI\", Roboto, sans-serif; margin: 2em; }\n\
         table { border-collapse: collapse; }\n\
         th, td { text-align: left; padding: 0.25em 2em 0.25em 0; }\n\
         th { border-bottom: 1px solid #ccc; }\n\
         td.size { text-align: right; }\n\
         </style>\n",
    );
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>Index of {title}</h1>\n"));
    html.push_str("<table>\n<tr><th>Name</th><th>Size</th><th>Modified</th></tr>\n");

    if request_path != "/" {
        html.push_str("<tr><td><a href=\"../\">../</a></td><td class=\"size\">-</td><td></td></tr>\n");
    }

    for entry in entries {
        let suffix = if entry.is_dir { "/" } else { "" };
        let size = if entry.is_dir {
            "-".to_string()
        } else {
            entry.size.to_string()
        };
        html.push_str(&format!(
            "<tr><td><a href=\"{href}{suffix}\">{name}{suffix}</a></td>\
             <td class=\"size\">{size}</td><td>{modified}</td></tr>\n",
            href = escape_href(&entry.name),
            name = escape_html(&entry.name),
            modified = entry.modified.format("%Y-%m-%d %H:%M:%S"),
        ));
    }

    html.push_str("</table>\n</body>\n</html>\n");
    html
}

/// Minimal HTML escaping, sufficient for filenames.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encode a path segment for an href attribute (URL encoding, not
/// HTML escaping).
fn escape_href(input: &str) -> String {
    const SEGMENT: &AsciiSet = &CONTROLS
        .add(b' ')
        .add(b'"')
        .add(b'<')
        .add(b'>')
        .add(b'`')
        .add(b'#')
        .add(b'?')
        .add(b'%');
    utf8_percent_encode(input, SEGMENT).to_string()
}
