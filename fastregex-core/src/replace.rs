//! Replacement strategies for [`crate::Regex::replace`] and friends.
//!
//! A template is a byte string where `$n` and `${n}` insert group `n`, `$name` and `${name}`
//! insert a named group, and `$$` inserts a literal `$`.
//! A group that does not exist or did not participate inserts nothing.
//! A `$` that starts no reference is kept as is.
//!
//! `$name` takes the longest run of `[_0-9A-Za-z]`, so `$1a` refers to a group named `1a`.
//! Use `${1}a` to follow a group by text.

use std::borrow::Cow;

use crate::captures::Captures;

/// Produces the replacement for each match.
pub trait Replacer {
    /// Appends the replacement for `caps` to `dst`.
    fn replace_append(&mut self, caps: &Captures<'_>, dst: &mut Vec<u8>);

    /// The replacement, when it is the same for every match and does not need groups.
    /// Returning `Some` lets the search skip capture resolution.
    fn no_expansion(&mut self) -> Option<Cow<'_, [u8]>> {
        return None;
    }
}

/// Inserts the bytes as they are, without interpreting `$`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoExpand<'t>(pub &'t [u8]);
impl<'t> Replacer for NoExpand<'t> {
    fn replace_append(&mut self, _: &Captures<'_>, dst: &mut Vec<u8>) {
        dst.extend_from_slice(self.0);
    }
    fn no_expansion(&mut self) -> Option<Cow<'_, [u8]>> {
        return Some(Cow::Borrowed(self.0));
    }
}

fn template_no_expansion(template: &[u8]) -> Option<Cow<'_, [u8]>> {
    return match memchr::memchr(b'$', template) {
        Some(_) => None,
        None => Some(Cow::Borrowed(template)),
    };
}

impl<'a> Replacer for &'a str {
    fn replace_append(&mut self, caps: &Captures<'_>, dst: &mut Vec<u8>) {
        expand(caps, self.as_bytes(), dst);
    }
    fn no_expansion(&mut self) -> Option<Cow<'_, [u8]>> {
        return template_no_expansion(self.as_bytes());
    }
}
impl Replacer for String {
    fn replace_append(&mut self, caps: &Captures<'_>, dst: &mut Vec<u8>) {
        expand(caps, self.as_bytes(), dst);
    }
    fn no_expansion(&mut self) -> Option<Cow<'_, [u8]>> {
        return template_no_expansion(self.as_bytes());
    }
}
impl<'a> Replacer for &'a [u8] {
    fn replace_append(&mut self, caps: &Captures<'_>, dst: &mut Vec<u8>) {
        expand(caps, self, dst);
    }
    fn no_expansion(&mut self) -> Option<Cow<'_, [u8]>> {
        return template_no_expansion(self);
    }
}
impl<'a, const N: usize> Replacer for &'a [u8; N] {
    fn replace_append(&mut self, caps: &Captures<'_>, dst: &mut Vec<u8>) {
        expand(caps, &self[..], dst);
    }
    fn no_expansion(&mut self) -> Option<Cow<'_, [u8]>> {
        return template_no_expansion(&self[..]);
    }
}
impl Replacer for Vec<u8> {
    fn replace_append(&mut self, caps: &Captures<'_>, dst: &mut Vec<u8>) {
        expand(caps, self, dst);
    }
    fn no_expansion(&mut self) -> Option<Cow<'_, [u8]>> {
        return template_no_expansion(self);
    }
}

/// Any closure computing the replacement from the groups.
impl<F, T> Replacer for F
where
    F: FnMut(&Captures<'_>) -> T,
    T: AsRef<[u8]>,
{
    fn replace_append(&mut self, caps: &Captures<'_>, dst: &mut Vec<u8>) {
        dst.extend_from_slice(self(caps).as_ref());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupRef<'t> {
    Index(usize),
    Name(&'t str),
}

/// Parses the reference right after a `$`.
///
/// ## Returns
/// The reference and the number of bytes it spans, or `None` if this `$` starts no reference.
fn parse_ref(rest: &[u8]) -> Option<(GroupRef<'_>, usize)> {
    let is_name_byte = |b: &u8| b.is_ascii_alphanumeric() || *b == b'_';
    let (name, consumed) = if rest.first() == Some(&b'{') {
        let close = memchr::memchr(b'}', rest)?;
        (&rest[1..close], close + 1)
    } else {
        let len = rest.iter().take_while(|b| is_name_byte(b)).count();
        (&rest[..len], len)
    };
    if name.is_empty() || !name.iter().all(is_name_byte) {
        return None;
    }
    // name bytes are ASCII
    let name = std::str::from_utf8(name).ok()?;
    let group = match name.parse::<usize>() {
        Ok(index) => GroupRef::Index(index),
        Err(_) => GroupRef::Name(name),
    };
    return Some((group, consumed));
}

/// Appends `template` to `dst`, substituting group references with the text of `caps`.
pub fn expand(caps: &Captures<'_>, mut template: &[u8], dst: &mut Vec<u8>) {
    while let Some(dollar) = memchr::memchr(b'$', template) {
        dst.extend_from_slice(&template[..dollar]);
        let rest = &template[dollar + 1..];
        if rest.first() == Some(&b'$') {
            dst.push(b'$');
            template = &rest[1..];
            continue;
        }
        let Some((group, consumed)) = parse_ref(rest) else {
            dst.push(b'$');
            template = rest;
            continue;
        };
        let found = match group {
            GroupRef::Index(index) => caps.get(index),
            GroupRef::Name(name) => caps.name(name),
        };
        if let Some(found) = found {
            dst.extend_from_slice(found.as_bytes());
        }
        template = &rest[consumed..];
    }
    dst.extend_from_slice(template);
}
