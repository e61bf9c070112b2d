use super::*;
use crate::{FloatKind, IntKind, Mutate, Serialize};
use std::fmt;

/// The mutator for `Boolean` values.
///
/// See the [`boolean()`] function to create new instances.
#[derive(Clone, Debug, Default)]
pub struct Bool {
    _private: (),
}

/// Create a new `Boolean` mutator.
///
/// # Example
///
/// ```
/// use mutatype::{mutators as m, Session, Value};
///
/// let mutator = m::boolean();
/// let mut session = Session::new();
///
/// let value = session.mutate(&mutator, &Value::Bool(true)).unwrap();
/// assert_eq!(value, Value::Bool(false));
/// ```
pub fn boolean() -> Bool {
    Bool { _private: () }
}

impl Mutate for Bool {
    fn init(&self, ctx: &mut Context) -> Result<Value> {
        Ok(Value::Bool(ctx.rng().gen_bool()))
    }

    fn mutate(&self, value: &Value, _ctx: &mut Context) -> Result<Value> {
        Ok(Value::Bool(!value.as_bool()?))
    }

    fn detach(&self, value: &Value) -> Result<Value> {
        Ok(Value::Bool(value.as_bool()?))
    }

    fn has_fixed_size(&self) -> bool {
        true
    }
}

impl Serialize for Bool {
    fn read(&self, input: &mut dyn io::Read) -> Result<Value> {
        let [byte] = read_array(input)?;
        Ok(Value::Bool(byte & 1 == 1))
    }

    fn write(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        out.write_all(&[u8::from(value.as_bool()?)])?;
        Ok(())
    }
}

impl fmt::Display for Bool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Boolean")
    }
}

/// The mutator for `Byte`, `Short`, `Integer` and `Long` values, optionally
/// restricted to a range.
///
/// See the [`integer()`] function to create new instances.
#[derive(Clone, Debug)]
pub struct Int {
    kind: IntKind,
    min: i64,
    max: i64,
}

/// Create a new integer mutator for the given width.
///
/// Values stay within `range` (inclusive) when one is given, clamped to what
/// the width can represent.
///
/// # Example
///
/// ```
/// use mutatype::{mutators as m, IntKind, Session};
///
/// let mutator = m::integer(IntKind::Integer, Some((111, 666)));
/// let mut session = Session::new();
///
/// let value = session.init(&mutator).unwrap().as_int().unwrap();
/// assert!((111..=666).contains(&value));
/// ```
pub fn integer(kind: IntKind, range: Option<(i64, i64)>) -> Int {
    let (min, max) = range.unwrap_or((kind.min(), kind.max()));
    let min = min.clamp(kind.min(), kind.max());
    let max = max.clamp(min, kind.max());
    Int { kind, min, max }
}

impl Int {
    /// Fold any integer into `min..=max`.
    fn fold(&self, x: i128) -> i64 {
        let min = i128::from(self.min);
        let span = i128::from(self.max) - min + 1;
        let folded = min + (x - min).rem_euclid(span);
        // In range by construction.
        folded as i64
    }

    fn special(&self, ctx: &mut Context) -> i64 {
        let candidates = [
            self.min,
            self.max,
            0,
            1,
            -1,
            self.min.saturating_add(1),
            self.max.saturating_sub(1),
        ];
        let x = ctx.rng().choose(candidates).unwrap_or(self.min);
        x.clamp(self.min, self.max)
    }

    fn uniform(&self, ctx: &mut Context) -> i64 {
        ctx.rng().gen_in_range(self.min, self.max)
    }
}

impl Mutate for Int {
    fn init(&self, ctx: &mut Context) -> Result<Value> {
        let x = if ctx.rng().one_in(4) {
            self.special(ctx)
        } else {
            self.uniform(ctx)
        };
        Ok(Value::Int(x))
    }

    fn mutate(&self, value: &Value, ctx: &mut Context) -> Result<Value> {
        let x = value.as_int()?;
        if self.min == self.max {
            return Ok(Value::Int(self.min));
        }

        let bits = self.kind.byte_width() * 8;
        let mutated = until_changed(ctx, &x, "integer", |ctx| {
            Ok(match ctx.rng().gen_index(4) {
                Some(0) => self.uniform(ctx),
                Some(1) => {
                    let mut delta = ctx.rng().gen_in_range(-16, 16);
                    if delta == 0 {
                        delta = 1;
                    }
                    self.fold(i128::from(x) + i128::from(delta))
                }
                Some(2) => self.special(ctx),
                _ => {
                    let bit = ctx.rng().gen_index(bits).unwrap_or(0);
                    self.fold(i128::from(x ^ (1i64 << bit)))
                }
            })
        })?;

        let x = mutated.unwrap_or(if x < self.max { x + 1 } else { self.min });
        Ok(Value::Int(x))
    }

    fn detach(&self, value: &Value) -> Result<Value> {
        Ok(Value::Int(value.as_int()?))
    }

    fn has_fixed_size(&self) -> bool {
        true
    }
}

impl Serialize for Int {
    fn read(&self, input: &mut dyn io::Read) -> Result<Value> {
        let x = match self.kind {
            IntKind::Byte => i64::from(i8::from_be_bytes(read_array(input)?)),
            IntKind::Short => i64::from(i16::from_be_bytes(read_array(input)?)),
            IntKind::Integer => i64::from(i32::from_be_bytes(read_array(input)?)),
            IntKind::Long => i64::from_be_bytes(read_array(input)?),
        };
        Ok(Value::Int(self.fold(i128::from(x))))
    }

    fn write(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        let x = value.as_int()?;
        if x < self.min || x > self.max {
            return Err(crate::Error::mismatch(format!(
                "{x} is outside of `{self}`'s range {}..={}",
                self.min, self.max
            )));
        }
        match self.kind {
            IntKind::Byte => out.write_all(&(x as i8).to_be_bytes())?,
            IntKind::Short => out.write_all(&(x as i16).to_be_bytes())?,
            IntKind::Integer => out.write_all(&(x as i32).to_be_bytes())?,
            IntKind::Long => out.write_all(&x.to_be_bytes())?,
        }
        Ok(())
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.name())
    }
}

/// The mutator for `Float` and `Double` values.
///
/// See the [`float()`] function to create new instances.
#[derive(Clone, Debug)]
pub struct Float {
    kind: FloatKind,
}

/// Create a new float mutator for the given width.
///
/// `Float` values are kept exactly representable as `f32`. All NaNs are
/// canonicalized to one bit pattern so that equality is meaningful.
pub fn float(kind: FloatKind) -> Float {
    Float { kind }
}

impl Float {
    fn canonicalize(&self, x: f64) -> f64 {
        match self.kind {
            FloatKind::Float => {
                let x = x as f32;
                if x.is_nan() {
                    f64::from(f32::NAN)
                } else {
                    f64::from(x)
                }
            }
            FloatKind::Double if x.is_nan() => f64::NAN,
            FloatKind::Double => x,
        }
    }

    fn special(&self, ctx: &mut Context) -> f64 {
        let x = match self.kind {
            FloatKind::Float => {
                let candidates = [
                    0.0,
                    -0.0,
                    1.0,
                    -1.0,
                    f32::EPSILON,
                    f32::MIN_POSITIVE,
                    f32::MAX,
                    f32::MIN,
                    f32::INFINITY,
                    f32::NEG_INFINITY,
                    f32::NAN,
                ];
                f64::from(ctx.rng().choose(candidates).unwrap_or(0.0))
            }
            FloatKind::Double => {
                let candidates = [
                    0.0,
                    -0.0,
                    1.0,
                    -1.0,
                    f64::EPSILON,
                    f64::MIN_POSITIVE,
                    f64::MAX,
                    f64::MIN,
                    f64::INFINITY,
                    f64::NEG_INFINITY,
                    f64::NAN,
                ];
                ctx.rng().choose(candidates).unwrap_or(0.0)
            }
        };
        self.canonicalize(x)
    }

    fn random(&self, ctx: &mut Context) -> f64 {
        let x = match (self.kind, ctx.rng().gen_index(3)) {
            (FloatKind::Float, Some(0)) => f64::from(ctx.rng().gen_f32() * f32::MAX),
            (FloatKind::Float, Some(1)) => f64::from(ctx.rng().gen_f32() * f32::MIN),
            (FloatKind::Float, _) => f64::from(f32::from_bits(ctx.rng().gen_u32())),
            (FloatKind::Double, Some(0)) => ctx.rng().gen_f64() * f64::MAX,
            (FloatKind::Double, Some(1)) => ctx.rng().gen_f64() * f64::MIN,
            (FloatKind::Double, _) => f64::from_bits(ctx.rng().gen_u64()),
        };
        self.canonicalize(x)
    }

    fn flip_bit(&self, x: f64, bit: usize) -> f64 {
        match self.kind {
            FloatKind::Float => {
                let bits = (x as f32).to_bits() ^ (1 << (bit % 32));
                self.canonicalize(f64::from(f32::from_bits(bits)))
            }
            FloatKind::Double => self.canonicalize(f64::from_bits(x.to_bits() ^ (1 << (bit % 64)))),
        }
    }
}

impl Mutate for Float {
    fn init(&self, ctx: &mut Context) -> Result<Value> {
        let x = if ctx.rng().one_in(4) {
            self.special(ctx)
        } else {
            self.random(ctx)
        };
        Ok(Value::Float(x))
    }

    fn mutate(&self, value: &Value, ctx: &mut Context) -> Result<Value> {
        let x = value.as_float()?;
        let same = |a: f64, b: f64| a.to_bits() == b.to_bits();

        let mut result = None;
        for _ in 0..ctx.config().max_mutation_attempts() {
            let candidate = match ctx.rng().gen_index(4) {
                Some(0) => self.special(ctx),
                Some(1) => self.random(ctx),
                Some(2) => {
                    let scale = ctx.rng().gen_f64() * 2.0;
                    self.canonicalize(x * scale)
                }
                _ => {
                    let bit = ctx.rng().gen_index(64).unwrap_or(0);
                    self.flip_bit(x, bit)
                }
            };
            if !same(candidate, x) {
                result = Some(candidate);
                break;
            }
        }

        let x = match result {
            Some(x) => x,
            None if x.is_nan() => 0.0,
            None => self.flip_bit(x, 0),
        };
        Ok(Value::Float(x))
    }

    fn detach(&self, value: &Value) -> Result<Value> {
        Ok(Value::Float(value.as_float()?))
    }

    fn has_fixed_size(&self) -> bool {
        true
    }
}

impl Serialize for Float {
    fn read(&self, input: &mut dyn io::Read) -> Result<Value> {
        let x = match self.kind {
            FloatKind::Float => f64::from(f32::from_be_bytes(read_array(input)?)),
            FloatKind::Double => f64::from_be_bytes(read_array(input)?),
        };
        Ok(Value::Float(self.canonicalize(x)))
    }

    fn write(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        let x = self.canonicalize(value.as_float()?);
        match self.kind {
            FloatKind::Float => out.write_all(&(x as f32).to_be_bytes())?,
            FloatKind::Double => out.write_all(&x.to_be_bytes())?,
        }
        Ok(())
    }
}

impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Session;

    #[test]
    fn integers_fold_into_range() {
        let m = integer(IntKind::Byte, Some((-3, 3)));
        assert_eq!(m.fold(4), -3);
        assert_eq!(m.fold(-4), 3);
        assert_eq!(m.fold(i128::from(i64::MAX)), m.fold(i128::from(i64::MAX) - 7));

        let bytes = [0x7f];
        let v = m.read(&mut &bytes[..]).unwrap();
        assert!((-3..=3).contains(&v.as_int().unwrap()));
    }

    #[test]
    fn integer_mutations_change_and_stay_in_range() {
        let m = integer(IntKind::Short, Some((10, 12)));
        let mut session = Session::new();
        let mut v = session.init(&m).unwrap();
        for _ in 0..200 {
            let next = session.mutate(&m, &v).unwrap();
            assert_ne!(next, v);
            assert!((10..=12).contains(&next.as_int().unwrap()));
            v = next;
        }
    }

    #[test]
    fn single_valued_integers_are_exempt() {
        let m = integer(IntKind::Long, Some((5, 5)));
        let mut session = Session::new();
        assert_eq!(session.mutate(&m, &Value::Int(5)).unwrap(), Value::Int(5));
    }

    #[test]
    fn float_nans_are_canonical() {
        let m = float(FloatKind::Float);
        let weird_nan = f32::from_bits(0x7fc0_0001);
        let v = m.read(&mut &weird_nan.to_be_bytes()[..]).unwrap();
        assert_eq!(v, Value::Float(f64::from(f32::NAN)));

        let mut session = Session::new();
        let next = session.mutate(&m, &v).unwrap();
        assert_ne!(next, v);
    }

    #[test]
    fn float_values_stay_representable() {
        let m = float(FloatKind::Float);
        let mut session = Session::new().seed(3);
        let mut v = session.init(&m).unwrap();
        for _ in 0..200 {
            v = session.mutate(&m, &v).unwrap();
            let x = v.as_float().unwrap();
            assert!(x.is_nan() || f64::from(x as f32) == x);
        }
    }
}
