//! Method doc comment parser, line by line with no formal grammar.
//!
//! Input is a raw `/** ... */` style comment. Decoration is stripped from
//! every line, then lines are consumed front to back:
//!
//! - a blank line ends parsing; anything after it is ignored
//! - an untagged line becomes one description paragraph
//! - a line starting with `@` opens a tag whose body runs until the next
//!   tag line, a blank line or the end of the comment
//!
//! A tag whose header does not match `@name type [$var] [text]` ends parsing
//! and whatever was collected up to that point is returned.

use crate::model::{DocBlockInfo, ParamDoc};
use regex::Regex;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

// Leading indentation, one comment marker (`/**`, `*/` or `*`) and at most
// one space after it.
static RE_DECORATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*(?:/\*\*|\*/|\*)? ?(.*)$").unwrap());

static RE_TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@(\w+)(?:\s|$)").unwrap());

// @name type [$var] [free text...]; the free text may span lines.
static RE_TAG_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^@(\w+)\s+([\w|\\]+)(?:\s+(\$\S+))?(?:\s+(.*))?").unwrap()
});

// -- Public API ---------------------------------------------------------------

/// Parse a raw doc comment. Returns `None` for empty or whitespace-only input.
pub fn parse(raw: &str) -> Option<DocBlockInfo> {
    if raw.trim().is_empty() {
        return None;
    }

    let lines: Vec<String> = raw
        .lines()
        .map(strip_decoration)
        .skip_while(|line| line.is_empty())
        .collect();

    let mut info = DocBlockInfo::default();
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];

        if line.is_empty() {
            tracing::trace!(line = i, "blank line, rest of comment ignored");
            break;
        }

        if !line.starts_with('@') {
            let paragraph = line.trim_matches('*').trim();
            if !paragraph.is_empty() {
                info.description.push(paragraph.to_string());
            }
            i += 1;
            continue;
        }

        let end = tag_body_end(&lines, i);
        let body = lines[i..end].join("\n");
        let Some(tag) = parse_tag(&body) else {
            tracing::debug!(tag = %body, "malformed doc tag, stopping");
            break;
        };
        tracing::trace!(name = tag.name, type_token = tag.type_token, "doc tag");
        apply_tag(&mut info, &tag);
        i = end;
    }

    Some(info)
}

// -- Helpers ------------------------------------------------------------------

/// One tag header split into its parts.
#[derive(Debug, PartialEq, Eq)]
struct Tag<'a> {
    name: &'a str,
    type_token: &'a str,
    var: Option<&'a str>,
    text: Option<&'a str>,
}

/// Strip comment markers and indentation from one line.
fn strip_decoration(line: &str) -> String {
    let content = RE_DECORATION
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map_or(line, |m| m.as_str());
    let content = content.trim();
    content
        .strip_suffix("*/")
        .map_or(content, str::trim_end)
        .to_string()
}

/// Index one past the last line belonging to the tag opened at `start`.
fn tag_body_end(lines: &[String], start: usize) -> usize {
    let mut end = start + 1;
    while end < lines.len() && !lines[end].is_empty() && !lines[end].starts_with('@') {
        end += 1;
    }
    end
}

fn parse_tag(body: &str) -> Option<Tag<'_>> {
    if !RE_TAG_NAME.is_match(body) {
        return None;
    }
    let caps = RE_TAG_HEADER.captures(body)?;
    Some(Tag {
        name: caps.get(1)?.as_str(),
        type_token: caps.get(2)?.as_str(),
        var: caps.get(3).map(|m| m.as_str()),
        text: caps.get(4).map(|m| m.as_str()),
    })
}

fn apply_tag(info: &mut DocBlockInfo, tag: &Tag<'_>) {
    if tag.name == "param" {
        info.params.push(ParamDoc {
            name: tag
                .var
                .map(|v| v.trim_matches('$').to_string())
                .filter(|v| !v.is_empty()),
            type_name: tag.type_token.to_string(),
            description: tag.text.map(collapse_whitespace).filter(|t| !t.is_empty()),
        });
    } else if tag.name.eq_ignore_ascii_case("return") {
        info.return_type = Some(tag.type_token.to_string());
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
