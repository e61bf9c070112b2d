use super::*;
use crate::{Mutate, Rng, Serialize};
use std::fmt;
use std::io::Read as _;

/// The mutator for `String` values.
///
/// Lengths are measured in UTF-8 bytes.
///
/// See the [`string()`] function to create new instances.
#[derive(Clone, Debug)]
pub struct Str {
    min: usize,
    max: usize,
}

/// Create a new string mutator.
///
/// Without `length` bounds, strings are at most
/// [`DEFAULT_MAX_LEN`][crate::DEFAULT_MAX_LEN] bytes long.
///
/// # Example
///
/// ```
/// # fn foo() -> mutatype::Result<()> {
/// use mutatype::{mutators as m, Session};
///
/// let mutator = m::string(Some((2, 4)));
/// let mut session = Session::new();
///
/// let mut value = session.init(&mutator)?;
/// for _ in 0..5 {
///     value = session.mutate(&mutator, &value)?;
///     let len = value.as_str()?.len();
///     assert!((2..=4).contains(&len));
/// }
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
pub fn string(length: Option<(usize, usize)>) -> Str {
    let (min, max) = length_bounds(length);
    Str {
        min,
        max: max.max(min),
    }
}

/// Generate a random character, biased towards interesting ones.
///
/// See https://en.wikipedia.org/wiki/Plane_(Unicode)#Overview and
/// https://en.wikipedia.org/wiki/Unicode_block#List_of_blocks
///
/// The ranges still contain some unassigned characters. That is fine: listing
/// only assigned characters is too much work for a best effort distribution.
fn gen_char(rng: &mut Rng) -> char {
    const RANGES: &[(u32, u32, u32)] = &[
        // Non-control ASCII, weighted heavily.
        (0x20, 0x7E, 12),
        // ASCII control characters.
        (0x00, 0x1F, 1),
        // Plane 0.
        (0x0080, 0xFFFF, 2),
        // Plane 1, skipping unassigned 0x15000..=0x15FFF and 0x19000..=0x19FFF.
        (0x10000, 0x14FFF, 1),
        (0x16000, 0x18FFF, 1),
        (0x1A000, 0x1FFFF, 1),
        // Plane 2.
        (0x20000, 0x2FFFF, 1),
        // Plane 3.
        (0x30000, 0x32FFF, 1),
    ];

    let weights: Vec<u32> = RANGES.iter().map(|(_, _, w)| *w).collect();
    let (start, end, _) = RANGES[rng.choose_weighted(&weights).unwrap_or(0)];
    let x = rng.gen_in_range(i64::from(start), i64::from(end));
    u32::try_from(x)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// A random character that fits in `budget` bytes, if any.
fn gen_char_within(rng: &mut Rng, budget: usize) -> Option<char> {
    if budget == 0 {
        return None;
    }
    let c = gen_char(rng);
    if c.len_utf8() <= budget {
        Some(c)
    } else {
        // Printable ASCII always fits.
        Some(char::from(b' ' + rng.gen_index(95).unwrap_or(0) as u8))
    }
}

impl Str {
    fn generate(&self, ctx: &mut Context) -> String {
        let cap = init_len_cap(ctx, self.min, self.max);
        let target = ctx.rng().gen_len(self.min, cap);
        let mut s = String::with_capacity(target);
        while s.len() < target {
            match gen_char_within(ctx.rng(), self.max - s.len()) {
                Some(c) => s.push(c),
                None => break,
            }
        }
        s
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len < self.min || len > self.max {
            return Err(crate::Error::corrupted(format!(
                "string of {len} bytes is outside of the allowed length {}..={}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    fn decode(&self, bytes: Vec<u8>) -> Result<Value> {
        self.check_len(bytes.len())?;
        let s = String::from_utf8(bytes)
            .map_err(|e| crate::Error::corrupted(format!("string is not valid UTF-8: {e}")))?;
        Ok(Value::string(s))
    }

    fn insert_char(&self, s: &str, ctx: &mut Context) -> Option<String> {
        let c = gen_char_within(ctx.rng(), self.max.saturating_sub(s.len()))?;
        let at = random_boundary(s, ctx.rng());
        let mut out = s.to_string();
        out.insert(at, c);
        Some(out)
    }

    fn remove_char(&self, s: &str, ctx: &mut Context) -> Option<String> {
        let (at, c) = random_char(s, ctx.rng())?;
        if s.len().saturating_sub(c.len_utf8()) < self.min {
            return None;
        }
        let mut out = s.to_string();
        out.remove(at);
        Some(out)
    }

    fn replace_char(&self, s: &str, ctx: &mut Context) -> Option<String> {
        let (at, old) = random_char(s, ctx.rng())?;
        let rest = s.len() - old.len_utf8();
        let mut new = gen_char_within(ctx.rng(), self.max.saturating_sub(rest))?;
        if rest + new.len_utf8() < self.min {
            new = old;
        }
        let mut out = String::with_capacity(rest + new.len_utf8());
        out.push_str(&s[..at]);
        out.push(new);
        out.push_str(&s[at + old.len_utf8()..]);
        Some(out)
    }

    /// A deterministic change that respects the length bounds, if there is
    /// one.
    fn nudge(&self, s: &str) -> Option<String> {
        match s.chars().last() {
            Some(last) => {
                let keep = &s[..s.len() - last.len_utf8()];
                let replacement = if last == 'a' {
                    "b".to_string()
                } else {
                    "a".repeat(last.len_utf8())
                };
                Some(format!("{keep}{replacement}"))
            }
            None if self.max > 0 => Some("a".to_string()),
            None => None,
        }
    }
}

fn random_boundary(s: &str, rng: &mut Rng) -> usize {
    let mut boundaries = s.char_indices().map(|(i, _)| i).chain([s.len()]);
    let count = s.chars().count() + 1;
    let pick = rng.gen_index(count).unwrap_or(0);
    boundaries.nth(pick).unwrap_or(s.len())
}

fn random_char(s: &str, rng: &mut Rng) -> Option<(usize, char)> {
    let count = s.chars().count();
    let pick = rng.gen_index(count)?;
    s.char_indices().nth(pick)
}

impl Mutate for Str {
    fn init(&self, ctx: &mut Context) -> Result<Value> {
        Ok(Value::string(self.generate(ctx)))
    }

    fn mutate(&self, value: &Value, ctx: &mut Context) -> Result<Value> {
        let s = value.as_str()?;
        let mutated = until_changed(ctx, &s.to_string(), "string", |ctx| {
            let candidate = match ctx.rng().gen_index(4) {
                Some(0) => self.insert_char(s, ctx),
                Some(1) => self.remove_char(s, ctx),
                Some(2) => self.replace_char(s, ctx),
                _ => Some(self.generate(ctx)),
            };
            Ok(candidate.unwrap_or_else(|| s.to_string()))
        })?;
        match mutated.or_else(|| self.nudge(s)) {
            Some(new) => Ok(Value::string(new)),
            None => Ok(value.clone()),
        }
    }

    fn detach(&self, value: &Value) -> Result<Value> {
        Ok(Value::string(value.as_str()?))
    }

    fn has_fixed_size(&self) -> bool {
        false
    }
}

impl Serialize for Str {
    fn read(&self, input: &mut dyn io::Read) -> Result<Value> {
        let len = read_u32(input)? as usize;
        self.check_len(len)?;
        let mut bytes = Vec::with_capacity(len.min(1024));
        input.take(len as u64).read_to_end(&mut bytes)?;
        if bytes.len() < len {
            return Err(crate::Error::corrupted("unexpected end of input"));
        }
        self.decode(bytes)
    }

    fn write(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        let s = value.as_str()?;
        write_len(out, s.len())?;
        out.write_all(s.as_bytes())?;
        Ok(())
    }

    fn read_exclusive(&self, input: &mut dyn io::Read) -> Result<Value> {
        self.decode(read_rest(input)?)
    }

    fn write_exclusive(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        out.write_all(value.as_str()?.as_bytes())?;
        Ok(())
    }
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("String")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Session;

    #[test]
    fn strings_respect_length_bounds() {
        let m = string(Some((3, 5)));
        let mut session = Session::new().seed(11);
        let mut v = session.init(&m).unwrap();
        for _ in 0..500 {
            let next = session.mutate(&m, &v).unwrap();
            assert_ne!(next, v);
            let len = next.as_str().unwrap().len();
            assert!((3..=5).contains(&len), "bad length {len}");
            v = next;
        }
    }

    #[test]
    fn empty_only_strings_are_exempt() {
        let m = string(Some((0, 0)));
        let mut session = Session::new();
        let v = session.init(&m).unwrap();
        assert_eq!(v.as_str().unwrap(), "");
        assert_eq!(session.mutate(&m, &v).unwrap(), v);
    }

    #[test]
    fn reads_reject_bad_input() {
        let m = string(Some((0, 4)));
        let too_long = [0, 0, 0, 5, b'a', b'b', b'c', b'd', b'e'];
        assert!(m.read(&mut &too_long[..]).unwrap_err().is_corrupted());

        let truncated = [0, 0, 0, 3, b'a'];
        assert!(m.read(&mut &truncated[..]).unwrap_err().is_corrupted());

        let not_utf8 = [0, 0, 0, 1, 0xff];
        assert!(m.read(&mut &not_utf8[..]).unwrap_err().is_corrupted());

        let v = m.read_exclusive(&mut &b"abc"[..]).unwrap();
        assert_eq!(v.as_str().unwrap(), "abc");
    }
}
