use crate::lexer::is_reserved_word;
use rustc_hash::FxHashSet;

const FIRST_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_$";
const NEXT_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_$";

/// The `index`-th short name: `a`..`$`, then `aa`, `ba`, ...
pub fn crunch_name(index: usize) -> String {
    let mut remaining = index;
    let mut name = String::new();
    name.push(FIRST_CHARS[remaining % FIRST_CHARS.len()] as char);
    remaining /= FIRST_CHARS.len();
    while remaining > 0 {
        remaining -= 1;
        name.push(NEXT_CHARS[remaining % NEXT_CHARS.len()] as char);
        remaining /= NEXT_CHARS.len();
    }
    name
}

/// Short names in order, skipping reserved words and anything in `skip`.
pub struct CrunchEnumerator<'a> {
    skip: &'a FxHashSet<String>,
    index: usize,
}

impl<'a> CrunchEnumerator<'a> {
    pub fn new(skip: &'a FxHashSet<String>) -> Self {
        CrunchEnumerator { skip, index: 0 }
    }
}

impl Iterator for CrunchEnumerator<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let name = crunch_name(self.index);
            self.index += 1;
            if !self.skip.contains(&name) && !is_reserved_word(&name) {
                return Some(name);
            }
        }
    }
}
